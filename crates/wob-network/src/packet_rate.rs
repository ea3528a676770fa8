//! 초당 패킷 수 계측.
//!
//! 1초 창 단위로 성공 전송 수를 센다. 전송이 없어도 창은 넘어가므로
//! 조용한 구간에서는 이전 값 대신 0을 보고한다.

use std::time::Duration;

use tokio::time::Instant;

const WINDOW: Duration = Duration::from_secs(1);

/// 1초 창 패킷 카운터
#[derive(Debug, Clone)]
pub struct PacketRateMeter {
    window_start: Instant,
    count: u32,
    rate: u32,
}

impl PacketRateMeter {
    pub fn new() -> Self {
        Self {
            window_start: Instant::now(),
            count: 0,
            rate: 0,
        }
    }

    /// 성공 전송 1건 기록
    pub fn record(&mut self) {
        self.roll(Instant::now());
        self.count += 1;
    }

    /// 직전 완료된 창의 전송 수
    pub fn rate(&mut self) -> u32 {
        self.roll(Instant::now());
        self.rate
    }

    fn roll(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < WINDOW {
            return;
        }
        let windows = elapsed.as_millis() / WINDOW.as_millis();
        // 두 창 이상 지났으면 그 사이에 빈 창이 있었다
        self.rate = if windows == 1 { self.count } else { 0 };
        self.count = 0;
        self.window_start += WINDOW * u32::try_from(windows).unwrap_or(u32::MAX);
    }
}

impl Default for PacketRateMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_then_silence() {
        let mut meter = PacketRateMeter::new();
        for _ in 0..30 {
            meter.record();
            tokio::time::advance(Duration::from_millis(30)).await;
        }
        assert_eq!(meter.rate(), 0);

        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(meter.rate(), 30);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(meter.rate(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn long_gap_reports_zero() {
        let mut meter = PacketRateMeter::new();
        for _ in 0..10 {
            meter.record();
        }
        tokio::time::advance(Duration::from_millis(3_500)).await;
        assert_eq!(meter.rate(), 0);
        meter.record();
        tokio::time::advance(Duration::from_millis(600)).await;
        assert_eq!(meter.rate(), 1);
    }
}

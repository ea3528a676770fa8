//! 재연결 백오프.
//!
//! 지연 = `min(base * multiplier^attempts, max)`. 성공적으로 열리면 시도 횟수는 0으로,
//! 서버가 거부하면 자동 재시도 금지(`Suppressed`)로 고정된다.

use std::time::Duration;

use wob_core::config::ReconnectConfig;

/// 재연결 시도 카운터
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempts {
    /// 지금까지 실패한 횟수
    Counting(u32),
    /// 서버 거부 — 명시적 재시도 전까지 자동 재연결 없음
    Suppressed,
}

impl Default for Attempts {
    fn default() -> Self {
        Attempts::Counting(0)
    }
}

impl Attempts {
    /// 자동 재연결 허용 여부
    pub fn allows_retry(&self) -> bool {
        matches!(self, Attempts::Counting(_))
    }

    /// 현재 횟수 (`Suppressed`면 `None`)
    pub fn count(&self) -> Option<u32> {
        match self {
            Attempts::Counting(n) => Some(*n),
            Attempts::Suppressed => None,
        }
    }
}

/// 백오프 정책
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    base_ms: f64,
    multiplier: f64,
    max_ms: f64,
}

impl ReconnectPolicy {
    pub fn new(config: &ReconnectConfig) -> Self {
        Self {
            base_ms: config.base_delay_ms as f64,
            multiplier: config.multiplier,
            max_ms: config.max_delay_ms as f64,
        }
    }

    /// `attempts`번 실패한 뒤의 대기 시간
    pub fn delay(&self, attempts: u32) -> Duration {
        let exp = i32::try_from(attempts).unwrap_or(i32::MAX);
        let ms = (self.base_ms * self.multiplier.powi(exp)).min(self.max_ms);
        Duration::from_millis(ms.max(0.0).round() as u64)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(&ReconnectConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(1_000));
        assert_eq!(policy.delay(1), Duration::from_millis(1_500));
        assert_eq!(policy.delay(2), Duration::from_millis(2_250));
        assert_eq!(policy.delay(6), Duration::from_millis(10_000));
        assert_eq!(policy.delay(u32::MAX), Duration::from_millis(10_000));
    }

    #[test]
    fn delays_are_monotonic_up_to_cap() {
        let policy = ReconnectPolicy::default();
        let mut previous = Duration::ZERO;
        for attempts in 0..40 {
            let delay = policy.delay(attempts);
            assert!(delay >= previous, "attempt {attempts}: {delay:?} < {previous:?}");
            assert!(delay <= Duration::from_secs(10));
            previous = delay;
        }
    }

    #[test]
    fn suppressed_disallows_retry() {
        assert!(Attempts::default().allows_retry());
        assert!(!Attempts::Suppressed.allows_retry());
        assert_eq!(Attempts::Suppressed.count(), None);
        assert_eq!(Attempts::Counting(3).count(), Some(3));
    }
}

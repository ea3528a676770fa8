//! 브로드캐스트 스케줄러.
//!
//! 고정 주기로 센서 판독값을 전송 계층에 밀어넣는다. 주기는 `round(1000 / sample_rate)` 밀리초이며
//! 첫 틱은 시작 후 한 주기 뒤에 발생한다. 터치는 타이머와 무관하게 스냅샷마다 즉시 전송한다.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};
use wob_core::error::CoreError;
use wob_core::models::touch::TouchSnapshot;
use wob_core::ports::diagnostics::DiagnosticSink;
use wob_core::protocol::OutboundMessage;
use wob_network::Transport;
use wob_sensors::SensorReader;

/// 전송 주기 계산 (`round(1000 / rate)` ms, 최소 1ms)
pub fn interval_for(sample_rate: u32) -> Duration {
    let millis = (1000.0 / f64::from(sample_rate.max(1))).round() as u64;
    Duration::from_millis(millis.max(1))
}

/// 브로드캐스트 스케줄러
pub struct BroadcastScheduler {
    transport: Transport,
    reader: SensorReader,
    diagnostics: Arc<dyn DiagnosticSink>,
    sample_rate: u32,
    task: Option<JoinHandle<()>>,
}

impl BroadcastScheduler {
    /// 새 스케줄러 생성 (정지 상태)
    pub fn new(
        transport: Transport,
        reader: SensorReader,
        diagnostics: Arc<dyn DiagnosticSink>,
        sample_rate: u32,
    ) -> Self {
        Self {
            transport,
            reader,
            diagnostics,
            sample_rate: sample_rate.max(1),
            task: None,
        }
    }

    /// 브로드캐스트 시작.
    ///
    /// 연결되어 있고 센서가 리스닝 중일 때만 타이머를 건다. 조건 미충족 시 진단만 남기고
    /// `false`를 반환한다. 이미 실행 중이면 아무것도 하지 않는다.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return true;
        }
        if !self.transport.is_connected() {
            self.diagnostics
                .warn("브로드캐스트 불가: 먼저 TouchDesigner에 연결하세요");
            return false;
        }
        if !self.reader.is_listening() {
            self.diagnostics
                .warn("브로드캐스트 불가: 먼저 센서를 활성화하세요");
            return false;
        }

        let period = interval_for(self.sample_rate);
        let transport = self.transport.clone();
        let reader = self.reader.clone();

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                transport.send(&OutboundMessage::Sensor(reader.get_data()));
            }
        }));

        self.diagnostics.info(&format!(
            "브로드캐스트 시작: {}Hz ({}ms)",
            self.sample_rate,
            period.as_millis()
        ));
        true
    }

    /// 타이머 해제 (멱등)
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.diagnostics.info("브로드캐스트 중지됨");
        }
    }

    /// 전송 주기 변경. 실행 중이면 새 주기로 즉시 재시작한다.
    pub fn set_sample_rate(&mut self, sample_rate: u32) -> Result<(), CoreError> {
        if sample_rate == 0 {
            return Err(CoreError::validation(
                "sample_rate",
                "전송 주기는 0보다 커야 합니다",
            ));
        }
        if sample_rate == self.sample_rate {
            return Ok(());
        }
        self.sample_rate = sample_rate;
        debug!("전송 주기 변경: {}Hz", sample_rate);

        if let Some(task) = self.task.take() {
            task.abort();
            self.start();
        }
        Ok(())
    }

    /// 터치 스냅샷 즉시 전송. 브로드캐스트 중이고 터치가 선택된 경우에만 보낸다.
    pub fn send_touch(&self, snapshot: TouchSnapshot) -> bool {
        if !self.is_running() || !self.reader.selection().touch {
            return false;
        }
        self.transport.send(&OutboundMessage::Touch(snapshot))
    }

    /// 실행 중 여부
    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// 현재 전송 주기
    pub fn interval(&self) -> Duration {
        interval_for(self.sample_rate)
    }
}

impl Drop for BroadcastScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("브로드캐스트 스케줄러 종료");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wob_core::config::SensorConfig;
    use wob_core::models::diagnostic::LogLevel;
    use wob_core::models::sensor::SensorKey;
    use wob_core::models::touch::{TouchPoint, TouchState};
    use wob_core::ports::diagnostics::TracingSink;
    use wob_network::backoff::ReconnectPolicy;
    use wob_network::LoopbackConnector;
    use wob_sensors::desktop::DesktopPlatform;
    use wob_sensors::SensorSource;

    #[derive(Default)]
    struct RecordingSink(parking_lot::Mutex<Vec<(String, LogLevel)>>);

    impl DiagnosticSink for RecordingSink {
        fn report(&self, message: &str, level: LogLevel) {
            self.0.lock().push((message.to_string(), level));
        }
    }

    struct Rig {
        connector: LoopbackConnector,
        transport: Transport,
        sensors: SensorSource,
        diagnostics: Arc<RecordingSink>,
    }

    impl Rig {
        fn new() -> Self {
            let connector = LoopbackConnector::recording();
            let transport = Transport::new(
                Arc::new(connector.clone()),
                Arc::new(TracingSink),
                ReconnectPolicy::default(),
            );
            let sensors = SensorSource::new(
                Arc::new(DesktopPlatform::new()),
                Arc::new(TracingSink),
                &SensorConfig::default(),
            );
            Self {
                connector,
                transport,
                sensors,
                diagnostics: Arc::new(RecordingSink::default()),
            }
        }

        fn scheduler(&self, rate: u32) -> BroadcastScheduler {
            BroadcastScheduler::new(
                self.transport.clone(),
                self.sensors.reader(),
                Arc::clone(&self.diagnostics) as Arc<dyn DiagnosticSink>,
                rate,
            )
        }

        async fn connect_and_listen(&mut self) {
            self.transport.connect("td.local:9980", false).unwrap();
            self.sensors.start_listening();
            settle().await;
            assert!(self.transport.is_connected());
        }

        fn sensor_frames(&self) -> usize {
            self.connector.sent_of_type("sensor").len()
        }
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn one_touch() -> TouchSnapshot {
        TouchSnapshot::new(vec![TouchPoint {
            id: 1,
            x: 0.5,
            y: 0.5,
            state: TouchState::Down,
        }])
    }

    #[test]
    fn interval_rounds_to_millis() {
        assert_eq!(interval_for(30), Duration::from_millis(33));
        assert_eq!(interval_for(60), Duration::from_millis(17));
        assert_eq!(interval_for(10), Duration::from_millis(100));
        assert_eq!(interval_for(3000), Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn start_requires_connection_and_listening() {
        let mut rig = Rig::new();
        let mut scheduler = rig.scheduler(30);

        assert!(!scheduler.start());
        rig.transport.connect("td.local:9980", false).unwrap();
        settle().await;
        assert!(!scheduler.start());
        assert!(!scheduler.is_running());

        rig.sensors.start_listening();
        assert!(scheduler.start());
        assert!(scheduler.is_running());

        let warnings = rig
            .diagnostics
            .0
            .lock()
            .iter()
            .filter(|(_, l)| *l == LogLevel::Warn)
            .count();
        assert_eq!(warnings, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_fires_one_interval_after_start() {
        let mut rig = Rig::new();
        rig.connect_and_listen().await;
        let mut scheduler = rig.scheduler(30);
        assert!(scheduler.start());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(rig.sensor_frames(), 0);

        // 33, 66, 99ms
        tokio::time::sleep(Duration::from_millis(90)).await;
        assert_eq!(rig.sensor_frames(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_running_keeps_single_timer() {
        let mut rig = Rig::new();
        rig.connect_and_listen().await;
        let mut scheduler = rig.scheduler(10);
        assert!(scheduler.start());
        assert!(scheduler.start());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(rig.sensor_frames(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_change_rebases_timer() {
        let mut rig = Rig::new();
        rig.connect_and_listen().await;
        let mut scheduler = rig.scheduler(30);
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(rig.sensor_frames(), 1);

        scheduler.set_sample_rate(10).unwrap();
        assert!(scheduler.is_running());
        assert_eq!(scheduler.interval(), Duration::from_millis(100));

        // 재시작 후 150, 250ms
        tokio::time::sleep(Duration::from_millis(90)).await;
        assert_eq!(rig.sensor_frames(), 1);
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(rig.sensor_frames(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_rate_rejected() {
        let rig = Rig::new();
        let mut scheduler = rig.scheduler(30);
        assert!(scheduler.set_sample_rate(0).is_err());
        assert_eq!(scheduler.sample_rate(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_halts_frames() {
        let mut rig = Rig::new();
        rig.connect_and_listen().await;
        let mut scheduler = rig.scheduler(10);
        scheduler.start();
        tokio::time::sleep(Duration::from_millis(150)).await;
        scheduler.stop();
        scheduler.stop();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(rig.sensor_frames(), 1);
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn sensor_frames_respect_selection() {
        let mut rig = Rig::new();
        rig.connect_and_listen().await;
        rig.sensors.set_selected(SensorKey::Orientation, false);
        let mut scheduler = rig.scheduler(10);
        scheduler.start();
        tokio::time::sleep(Duration::from_millis(110)).await;

        let frames = rig.connector.sent_of_type("sensor");
        assert_eq!(frames.len(), 1);
        assert!(frames[0].get("ax").is_some());
        assert!(frames[0].get("oa").is_none());
        assert!(frames[0].get("lat").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn touch_requires_broadcast_and_selection() {
        let mut rig = Rig::new();
        rig.connect_and_listen().await;
        let mut scheduler = rig.scheduler(30);

        assert!(!scheduler.send_touch(one_touch()));
        scheduler.start();
        assert!(scheduler.send_touch(one_touch()));

        rig.sensors.set_selected(SensorKey::Touch, false);
        assert!(!scheduler.send_touch(one_touch()));

        let frames = rig.connector.sent_of_type("touch");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["count"], 1);
    }
}

//! 내부 이벤트 버스.
//!
//! `tokio::broadcast` 기반 내부 이벤트 라우팅과, 운영자 진단을 버스·로그 버퍼·tracing으로
//! 동시에 내보내는 [`BusDiagnostics`].

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;
use wob_core::models::connection::ConnectionState;
use wob_core::models::diagnostic::{LogEntry, LogLevel};
use wob_core::models::remote_config::RemoteConfig;
use wob_core::ports::diagnostics::{DiagnosticSink, TracingSink};

/// 운영자용 상태 요약
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub state: ConnectionState,
    pub packets_per_sec: u32,
    pub broadcasting: bool,
    pub listening: bool,
    pub simulating: bool,
    pub sample_rate: u32,
    pub slot: Option<String>,
}

impl StatusReport {
    /// 한 줄 요약
    pub fn format_line(&self) -> String {
        let mut line = format!(
            "{} | {} pkt/s | {}Hz | 브로드캐스트 {} | 센서 {}",
            self.state.label(),
            self.packets_per_sec,
            self.sample_rate,
            if self.broadcasting { "ON" } else { "OFF" },
            match (self.listening, self.simulating) {
                (true, true) => "ON (시뮬레이션)",
                (true, false) => "ON",
                _ => "OFF",
            },
        );
        if let Some(slot) = &self.slot {
            line.push_str(&format!(" | 슬롯 {slot}"));
        }
        line
    }
}

/// 내부 앱 이벤트
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// 연결 상태 변경
    ConnectionChanged(ConnectionState),
    /// 운영자 진단
    Diagnostic(LogEntry),
    /// 원격 설정 적용됨
    ConfigApplied(RemoteConfig),
    /// 브로드캐스트 시작/중지
    BroadcastChanged(bool),
    /// 운영자가 요청한 상태 요약
    Status(StatusReport),
    /// 운영자가 요청한 최근 진단 로그 (오래된 순)
    Log(Vec<LogEntry>),
}

/// 내부 이벤트 버스
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    /// 새 이벤트 버스 생성
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 이벤트 발행
    pub fn publish(&self, event: AppEvent) {
        debug!("이벤트 발행: {:?}", std::mem::discriminant(&event));
        let _ = self.tx.send(event);
    }

    /// 구독자 생성
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(128)
    }
}

/// 최근 진단 로그 링 버퍼
pub struct LogBuffer {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// 항목 추가. 가득 차면 가장 오래된 항목을 버린다.
    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// 오래된 순서의 사본
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// 진단을 tracing + 로그 버퍼 + 이벤트 버스로 내보내는 싱크
pub struct BusDiagnostics {
    bus: Arc<EventBus>,
    buffer: Arc<LogBuffer>,
}

impl BusDiagnostics {
    pub fn new(bus: Arc<EventBus>, buffer: Arc<LogBuffer>) -> Self {
        Self { bus, buffer }
    }
}

impl DiagnosticSink for BusDiagnostics {
    fn report(&self, message: &str, level: LogLevel) {
        TracingSink.report(message, level);
        let entry = LogEntry::now(message, level);
        self.buffer.push(entry.clone());
        self.bus.publish(AppEvent::Diagnostic(entry));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(AppEvent::ConnectionChanged(ConnectionState::Connected));

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event,
            AppEvent::ConnectionChanged(ConnectionState::Connected)
        ));
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(AppEvent::BroadcastChanged(true));

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();
        assert!(matches!(e1, AppEvent::BroadcastChanged(true)));
        assert!(matches!(e2, AppEvent::BroadcastChanged(true)));
    }

    #[test]
    fn log_buffer_keeps_most_recent() {
        let buffer = LogBuffer::new(30);
        for i in 0..35 {
            buffer.push(LogEntry::now(format!("msg {i}"), LogLevel::Info));
        }
        let entries = buffer.entries();
        assert_eq!(entries.len(), 30);
        assert_eq!(entries[0].message, "msg 5");
        assert_eq!(entries[29].message, "msg 34");
    }

    #[tokio::test]
    async fn diagnostics_reach_bus_and_buffer() {
        let bus = Arc::new(EventBus::new(16));
        let buffer = Arc::new(LogBuffer::new(4));
        let mut rx = bus.subscribe();
        let sink = BusDiagnostics::new(Arc::clone(&bus), Arc::clone(&buffer));

        sink.warn("센서 이벤트 없음");

        assert_eq!(buffer.len(), 1);
        let AppEvent::Diagnostic(entry) = rx.recv().await.unwrap() else {
            panic!("진단 이벤트가 아님");
        };
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.message, "센서 이벤트 없음");
    }

    #[test]
    fn status_line() {
        let report = StatusReport {
            state: ConnectionState::Connected,
            packets_per_sec: 30,
            broadcasting: true,
            listening: true,
            simulating: true,
            sample_rate: 30,
            slot: Some("2".into()),
        };
        assert_eq!(
            report.format_line(),
            "Connected to TD | 30 pkt/s | 30Hz | 브로드캐스트 ON | 센서 ON (시뮬레이션) | 슬롯 2"
        );
    }
}

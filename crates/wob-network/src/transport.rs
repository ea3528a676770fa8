//! 전송 계층 상태 머신.
//!
//! 원격 엔진과의 단일 논리 연결. 연결/재연결(지수 백오프)/입장 거부/수신 제어 메시지
//! 분배를 담당한다.
//!
//! 상태 전이:
//!
//! ```text
//! disconnected --connect()--> connecting
//! connecting   --open-------> connected
//! connecting   --open 실패---> error → reconnecting
//! connected    --close 1000--> disconnected
//! connected    --close 기타---> reconnecting
//! connected    --rejected----> rejected (자동 재연결 없음)
//! reconnecting --백오프 경과--> connecting
//! rejected     --retry()-----> connecting
//! any          --disconnect()-> disconnected
//! ```
//!
//! 소켓마다 세대 번호를 붙이고, 지난 세대에서 올라온 이벤트는 무시한다.
//! 재연결 타이머는 동시에 하나만 존재한다.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wob_core::error::CoreError;
use wob_core::models::connection::ConnectionState;
use wob_core::models::diagnostic::LogLevel;
use wob_core::ports::diagnostics::DiagnosticSink;
use wob_core::ports::socket::{
    SocketChannel, SocketConnector, SocketEvent, SocketSink, CLOSE_ABNORMAL, CLOSE_NORMAL,
};
use wob_core::protocol::{InboundMessage, OutboundMessage};

use crate::backoff::{Attempts, ReconnectPolicy};
use crate::close;
use crate::connectivity::ConnectivityMonitor;
use crate::endpoint;
use crate::packet_rate::PacketRateMeter;

/// 제어 메시지 broadcast 채널 용량
const CONTROL_CHANNEL_CAPACITY: usize = 64;

/// 전송 계층 핸들. 복제본은 같은 연결을 공유한다.
#[derive(Clone)]
pub struct Transport {
    shared: Arc<Shared>,
}

struct Shared {
    connector: Arc<dyn SocketConnector>,
    diagnostics: Arc<dyn DiagnosticSink>,
    policy: ReconnectPolicy,
    connectivity: ConnectivityMonitor,
    control_tx: broadcast::Sender<InboundMessage>,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    url: Option<String>,
    sink: Option<Box<dyn SocketSink>>,
    attempts: Attempts,
    reconnect_timer: Option<JoinHandle<()>>,
    connection: Option<JoinHandle<()>>,
    /// 현재 소켓 세대
    generation: u64,
    meter: PacketRateMeter,
    slot: Option<String>,
    rejection_reason: Option<String>,
}

/// 락을 놓은 뒤 내보낼 진단
type Report = Option<(String, LogLevel)>;

impl Transport {
    /// 새 전송 계층 생성 (`Disconnected`)
    pub fn new(
        connector: Arc<dyn SocketConnector>,
        diagnostics: Arc<dyn DiagnosticSink>,
        policy: ReconnectPolicy,
    ) -> Self {
        let (control_tx, _) = broadcast::channel(CONTROL_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                connector,
                diagnostics,
                policy,
                connectivity: ConnectivityMonitor::new(),
                control_tx,
                inner: Mutex::new(Inner::default()),
            }),
        }
    }

    /// 주소로 연결 시작.
    ///
    /// 주소가 비었거나 해석할 수 없으면 연결 시도 없이 `Validation` 에러.
    /// 기존 연결과 대기 중인 재연결 타이머는 정리된다.
    pub fn connect(&self, address: &str, secure: bool) -> Result<(), CoreError> {
        let url = endpoint::resolve_url(address, secure)?;
        info!("서버 연결 시작: {}", url);
        {
            let mut inner = self.shared.inner.lock();
            inner.url = Some(url);
            inner.attempts = Attempts::Counting(0);
            inner.rejection_reason = None;
            inner.slot = None;
            cancel_timer(&mut inner);
            self.shared.begin_connect(&mut inner);
        }
        Ok(())
    }

    /// 사용자 재시도. 거부/오류/대기 상태에서 즉시 `connecting`으로 들어간다.
    ///
    /// 이미 연결됐거나 연결 중이면 아무것도 하지 않는다.
    pub fn retry(&self) -> Result<(), CoreError> {
        let mut inner = self.shared.inner.lock();
        if inner.url.is_none() {
            return Err(CoreError::validation("address", "연결할 서버 주소가 없습니다"));
        }
        match self.shared.connectivity.status() {
            ConnectionState::Connected | ConnectionState::Connecting => return Ok(()),
            _ => {}
        }
        info!("재시도 요청");
        inner.attempts = Attempts::Counting(0);
        inner.rejection_reason = None;
        cancel_timer(&mut inner);
        self.shared.begin_connect(&mut inner);
        Ok(())
    }

    /// 연결 종료. 재연결 타이머를 취소하고 정상 코드(1000)로 닫는다. 여러 번 호출해도 안전.
    pub fn disconnect(&self) {
        let mut inner = self.shared.inner.lock();
        cancel_timer(&mut inner);
        if let Some(task) = inner.connection.take() {
            task.abort();
        }
        inner.generation += 1;
        if let Some(sink) = inner.sink.take() {
            sink.close(CLOSE_NORMAL, "");
        }
        inner.attempts = Attempts::Counting(0);
        inner.slot = None;
        if self.shared.connectivity.set(ConnectionState::Disconnected) {
            info!("연결 종료");
        }
    }

    /// 메시지 전송. 연결되지 않았으면 버리고 `false`.
    pub fn send(&self, message: &OutboundMessage) -> bool {
        let mut inner = self.shared.inner.lock();
        if self.shared.connectivity.status() != ConnectionState::Connected {
            return false;
        }
        self.shared.send_locked(&mut inner, message)
    }

    /// 현재 연결 상태
    pub fn state(&self) -> ConnectionState {
        self.shared.connectivity.status()
    }

    /// 상태 변경 수신기
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.connectivity.subscribe()
    }

    /// 수신 제어 메시지 구독 (도착 순서대로)
    pub fn subscribe_control(&self) -> broadcast::Receiver<InboundMessage> {
        self.shared.control_tx.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// 직전 1초 창의 전송 수
    pub fn packets_per_sec(&self) -> u32 {
        self.shared.inner.lock().meter.rate()
    }

    /// 서버가 할당한 슬롯
    pub fn slot(&self) -> Option<String> {
        self.shared.inner.lock().slot.clone()
    }

    /// 마지막 거부 사유
    pub fn rejection_reason(&self) -> Option<String> {
        self.shared.inner.lock().rejection_reason.clone()
    }

    /// 해석된 연결 URL
    pub fn url(&self) -> Option<String> {
        self.shared.inner.lock().url.clone()
    }

    /// 재연결 시도 카운터
    pub fn attempts(&self) -> Attempts {
        self.shared.inner.lock().attempts
    }
}

fn cancel_timer(inner: &mut Inner) {
    if let Some(timer) = inner.reconnect_timer.take() {
        timer.abort();
        debug!("재연결 타이머 취소");
    }
}

impl Shared {
    /// 새 세대로 소켓 열기 시작
    fn begin_connect(self: &Arc<Self>, inner: &mut Inner) {
        let Some(url) = inner.url.clone() else {
            return;
        };
        if let Some(task) = inner.connection.take() {
            task.abort();
        }
        if let Some(sink) = inner.sink.take() {
            sink.close(CLOSE_NORMAL, "");
        }
        inner.generation += 1;
        let generation = inner.generation;
        self.connectivity.set(ConnectionState::Connecting);

        let weak = Arc::downgrade(self);
        inner.connection = Some(tokio::spawn(run_connection(weak, url, generation)));
    }

    fn send_locked(&self, inner: &mut Inner, message: &OutboundMessage) -> bool {
        let Some(sink) = inner.sink.as_ref() else {
            return false;
        };
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!("{} 인코딩 실패: {e}", message.kind());
                return false;
            }
        };
        match sink.send_text(text) {
            Ok(()) => {
                inner.meter.record();
                true
            }
            Err(e) => {
                debug!("{} 전송 실패: {e}", message.kind());
                false
            }
        }
    }

    fn report(&self, report: Report) {
        if let Some((message, level)) = report {
            self.diagnostics.report(&message, level);
        }
    }

    /// 소켓 생성 실패 → error → reconnecting
    fn on_open_failed(self: &Arc<Self>, generation: u64, url: &str, error: CoreError) {
        let report = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                return;
            }
            inner.connection = None;
            warn!("소켓 생성 실패: {error}");
            self.connectivity.set(ConnectionState::Error);
            self.schedule_reconnect(&mut inner);
            Some((close::open_failure_message(url), LogLevel::Error))
        };
        self.report(report);
    }

    /// 소켓 열림 → connected, hello 전송. 지난 세대면 `false`.
    fn on_open(&self, generation: u64, sink: Box<dyn SocketSink>) -> bool {
        let report = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                sink.close(CLOSE_NORMAL, "");
                return false;
            }
            inner.sink = Some(sink);
            inner.attempts = Attempts::Counting(0);
            self.connectivity.set(ConnectionState::Connected);
            self.send_locked(&mut inner, &OutboundMessage::Hello);
            let url = inner.url.clone().unwrap_or_default();
            info!("서버 연결됨: {}", url);
            Some((format!("연결됨: {url}"), LogLevel::Info))
        };
        self.report(report);
        true
    }

    /// 텍스트 프레임 처리. 이 세대의 수신을 계속해야 하면 `true`.
    fn on_text(&self, generation: u64, text: &str) -> bool {
        let Some(message) = InboundMessage::decode(text) else {
            if self.inner.lock().generation != generation {
                return false;
            }
            debug!("알 수 없는 수신 프레임 무시: {}", text);
            return true;
        };

        let (report, keep_reading) = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                return false;
            }
            match &message {
                InboundMessage::Ack { slot } => {
                    inner.slot = slot.clone();
                    let slot = slot.as_deref().unwrap_or("?");
                    info!("입장 확인, 슬롯 {}", slot);
                    (Some((format!("슬롯 할당: {slot}"), LogLevel::Info)), true)
                }
                InboundMessage::Config(_) => (None, true),
                InboundMessage::Rejected { reason } => {
                    cancel_timer(&mut inner);
                    inner.attempts = Attempts::Suppressed;
                    inner.rejection_reason = reason.clone();
                    inner.generation += 1;
                    if let Some(sink) = inner.sink.take() {
                        sink.close(CLOSE_NORMAL, "rejected");
                    }
                    self.connectivity.set(ConnectionState::Rejected);
                    let reason = reason.as_deref().unwrap_or("server full");
                    warn!("서버가 연결을 거부: {}", reason);
                    (
                        Some((format!("서버 거부: {reason}"), LogLevel::Error)),
                        false,
                    )
                }
            }
        };

        let _ = self.control_tx.send(message);
        self.report(report);
        keep_reading
    }

    /// 원격 종료 처리
    fn on_close(self: &Arc<Self>, generation: u64, code: u16, reason: &str) {
        let report = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                return;
            }
            inner.sink = None;
            inner.connection = None;
            inner.slot = None;

            if !inner.attempts.allows_retry() {
                None
            } else if code == CLOSE_NORMAL {
                self.connectivity.set(ConnectionState::Disconnected);
                info!("서버가 연결을 정상 종료");
                Some(("연결 종료됨".to_string(), LogLevel::Info))
            } else {
                let url = inner.url.clone().unwrap_or_default();
                warn!("비정상 종료: code={} reason={:?}", code, reason);
                self.schedule_reconnect(&mut inner);
                Some((close::close_message(code, reason, &url), LogLevel::Error))
            }
        };
        self.report(report);
    }

    /// 재연결 예약. 이미 예약돼 있거나 거부 상태면 아무것도 하지 않는다.
    fn schedule_reconnect(self: &Arc<Self>, inner: &mut Inner) {
        let Attempts::Counting(attempts) = inner.attempts else {
            return;
        };
        if inner.reconnect_timer.is_some() {
            return;
        }
        let delay = self.policy.delay(attempts);
        inner.attempts = Attempts::Counting(attempts.saturating_add(1));
        self.connectivity.set(ConnectionState::Reconnecting);
        info!(
            "{}ms 후 재연결 (시도 {})",
            delay.as_millis(),
            attempts.saturating_add(1)
        );

        let generation = inner.generation;
        let weak = Arc::downgrade(self);
        inner.reconnect_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let mut inner = shared.inner.lock();
            if inner.generation != generation {
                return;
            }
            inner.reconnect_timer = None;
            shared.begin_connect(&mut inner);
        }));
    }
}

/// 소켓 하나의 수명: 열기 → 수신 루프 → 종료 통지
async fn run_connection(weak: Weak<Shared>, url: String, generation: u64) {
    let Some(connector) = weak.upgrade().map(|s| Arc::clone(&s.connector)) else {
        return;
    };
    let result = connector.open(&url).await;

    let SocketChannel { sink, mut events } = match result {
        Ok(channel) => channel,
        Err(e) => {
            if let Some(shared) = weak.upgrade() {
                shared.on_open_failed(generation, &url, e);
            }
            return;
        }
    };

    {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        if !shared.on_open(generation, sink) {
            return;
        }
    }

    while let Some(event) = events.recv().await {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        match event {
            SocketEvent::Text(text) => {
                if !shared.on_text(generation, &text) {
                    return;
                }
            }
            SocketEvent::Closed { code, reason } => {
                shared.on_close(generation, code, &reason);
                return;
            }
        }
    }

    // 종료 프레임 없이 스트림이 끝남
    if let Some(shared) = weak.upgrade() {
        shared.on_close(generation, CLOSE_ABNORMAL, "");
    }
}

//! 프로세스 내 루프백 소켓.
//!
//! 실제 서버 없이 전송 계층을 구동한다. `hello`를 받으면 슬롯을 담은 `ack`로 응답하고
//! 나머지 프레임은 버린다(기록 모드에서는 보관). 테스트에서는 핸들로 수신 프레임 주입,
//! 원격 종료, 연결 거부를 흉내낸다.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;
use wob_core::error::CoreError;
use wob_core::ports::socket::{SocketChannel, SocketConnector, SocketEvent, SocketSink};

#[derive(Debug, Default)]
struct LoopbackState {
    auto_ack: bool,
    recording: bool,
    refuse: bool,
    /// 지금까지 열린 연결 수 (현재 연결 번호)
    opened: u32,
    /// 현재 연결의 이벤트 송신기
    events: Option<mpsc::UnboundedSender<SocketEvent>>,
    sent: Vec<String>,
    sent_count: u64,
    close_codes: Vec<u16>,
}

/// 루프백 커넥터. 복제본은 같은 상태를 공유한다.
#[derive(Debug, Clone)]
pub struct LoopbackConnector {
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackConnector {
    /// `ack` 응답, 프레임 폐기
    pub fn new() -> Self {
        Self::with_options(true, false)
    }

    /// `ack` 응답, 송신 프레임 보관
    pub fn recording() -> Self {
        Self::with_options(true, true)
    }

    /// 응답 없음, 송신 프레임 보관
    pub fn silent() -> Self {
        Self::with_options(false, true)
    }

    fn with_options(auto_ack: bool, recording: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(LoopbackState {
                auto_ack,
                recording,
                ..Default::default()
            })),
        }
    }

    /// 이후 연결 시도를 거부할지
    pub fn set_refuse(&self, refuse: bool) {
        self.state.lock().refuse = refuse;
    }

    /// 성공적으로 열린 연결 수
    pub fn open_count(&self) -> u32 {
        self.state.lock().opened
    }

    /// 보관된 송신 프레임 (기록 모드)
    pub fn sent(&self) -> Vec<String> {
        self.state.lock().sent.clone()
    }

    /// 보관된 송신 프레임 중 `type`이 일치하는 것
    pub fn sent_of_type(&self, kind: &str) -> Vec<Value> {
        self.sent()
            .iter()
            .filter_map(|text| serde_json::from_str::<Value>(text).ok())
            .filter(|v| v.get("type").and_then(Value::as_str) == Some(kind))
            .collect()
    }

    /// 총 송신 프레임 수
    pub fn sent_count(&self) -> u64 {
        self.state.lock().sent_count
    }

    /// 클라이언트가 보낸 종료 코드들
    pub fn close_codes(&self) -> Vec<u16> {
        self.state.lock().close_codes.clone()
    }

    /// 현재 연결로 수신 프레임 주입. 연결이 없으면 `false`.
    pub fn push_inbound(&self, text: &str) -> bool {
        match &self.state.lock().events {
            Some(tx) => tx.send(SocketEvent::Text(text.to_string())).is_ok(),
            None => false,
        }
    }

    /// 원격 측 종료
    pub fn drop_connection(&self, code: u16, reason: &str) {
        if let Some(tx) = self.state.lock().events.take() {
            let _ = tx.send(SocketEvent::Closed {
                code,
                reason: reason.to_string(),
            });
        }
    }
}

impl Default for LoopbackConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SocketConnector for LoopbackConnector {
    async fn open(&self, url: &str) -> Result<SocketChannel, CoreError> {
        let mut state = self.state.lock();
        if state.refuse {
            return Err(CoreError::Network(format!("루프백 연결 거부: {url}")));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state.opened += 1;
        state.events = Some(tx);
        debug!("루프백 연결 #{}: {}", state.opened, url);

        Ok(SocketChannel {
            sink: Box::new(LoopbackSink {
                state: Arc::clone(&self.state),
                connection: state.opened,
            }),
            events: rx,
        })
    }
}

struct LoopbackSink {
    state: Arc<Mutex<LoopbackState>>,
    connection: u32,
}

impl SocketSink for LoopbackSink {
    fn send_text(&self, text: String) -> Result<(), CoreError> {
        let mut state = self.state.lock();
        if state.opened != self.connection || state.events.is_none() {
            return Err(CoreError::Network("루프백 연결 닫힘".into()));
        }
        state.sent_count += 1;

        let is_hello = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("type").and_then(Value::as_str).map(|t| t == "hello"))
            .unwrap_or(false);
        if is_hello && state.auto_ack {
            let ack = format!(r#"{{"type":"ack","slot":{}}}"#, self.connection - 1);
            if let Some(tx) = &state.events {
                let _ = tx.send(SocketEvent::Text(ack));
            }
        }
        if state.recording {
            state.sent.push(text);
        }
        Ok(())
    }

    fn close(&self, code: u16, reason: &str) {
        let mut state = self.state.lock();
        if state.opened != self.connection {
            return;
        }
        state.close_codes.push(code);
        if let Some(tx) = state.events.take() {
            let _ = tx.send(SocketEvent::Closed {
                code,
                reason: reason.to_string(),
            });
        }
    }
}

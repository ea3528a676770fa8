//! 소켓 포트.
//!
//! 구현: `wob-network` crate (`WsConnector` — tokio-tungstenite, `LoopbackConnector`)

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::CoreError;

/// 정상 종료 코드
pub const CLOSE_NORMAL: u16 = 1000;

/// 닫기 프레임 없이 끊긴 경우의 코드
pub const CLOSE_ABNORMAL: u16 = 1006;

/// 소켓에서 올라오는 이벤트 (도착 순서대로)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// 텍스트 프레임
    Text(String),
    /// 연결 종료
    Closed { code: u16, reason: String },
}

/// 열린 소켓의 송신 측. 모든 메서드는 블로킹하지 않는다.
pub trait SocketSink: Send + Sync {
    /// 텍스트 프레임 즉시 전송
    fn send_text(&self, text: String) -> Result<(), CoreError>;

    /// 코드/사유와 함께 닫기
    fn close(&self, code: u16, reason: &str);
}

/// 열린 소켓: 송신기와 수신 이벤트 스트림
pub struct SocketChannel {
    pub sink: Box<dyn SocketSink>,
    pub events: mpsc::UnboundedReceiver<SocketEvent>,
}

/// 비동기 소켓 열기
#[async_trait]
pub trait SocketConnector: Send + Sync {
    /// URL로 소켓 열기
    async fn open(&self, url: &str) -> Result<SocketChannel, CoreError>;
}

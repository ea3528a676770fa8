//! WebSocket 소켓 어댑터.
//!
//! `tokio-tungstenite` 기반. 스트림을 송신/수신으로 나누고 각각 전용 태스크가 처리한다.
//! 송신 대기열은 몇 프레임으로 제한되며, 가득 차면 [`SocketSink::send_text`]는 프레임을
//! 쌓지 않고 에러를 돌려준다. 송신기가 해제되면 수신 태스크도 함께 정리된다.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use wob_core::error::CoreError;
use wob_core::ports::socket::{
    SocketChannel, SocketConnector, SocketEvent, SocketSink, CLOSE_ABNORMAL,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 닫기 프레임에 상태 코드가 없을 때
const CLOSE_NO_STATUS: u16 = 1005;

/// 송신 태스크에 넘길 수 있는 최대 프레임 수
const OUTBOUND_CAPACITY: usize = 4;

/// 프레임 하나를 소켓에 쓰는 데 허용하는 시간
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// 닫기 프레임 전송 대기 시간
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// tokio-tungstenite 커넥터
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SocketConnector for WsConnector {
    async fn open(&self, url: &str) -> Result<SocketChannel, CoreError> {
        info!("WebSocket 연결: {}", url);

        let (ws_stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| CoreError::Network(format!("WebSocket 연결 실패: {e}")))?;

        let (write, read) = ws_stream.split();
        let (out_tx, out_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (close_tx, close_rx) = oneshot::channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(write_loop(write, out_rx, close_rx));
        let reader = tokio::spawn(read_loop(read, event_tx)).abort_handle();

        Ok(SocketChannel {
            sink: Box::new(WsSink {
                tx: out_tx,
                close_tx: Mutex::new(Some(close_tx)),
                reader,
            }),
            events: event_rx,
        })
    }
}

/// WebSocket 송신기.
///
/// 해제되면 송신 태스크는 대기열을 닫고 끝나고, 수신 태스크는 중단된다.
/// 두 절반이 모두 해제되는 시점에 TCP 연결이 닫힌다.
struct WsSink {
    tx: mpsc::Sender<String>,
    close_tx: Mutex<Option<oneshot::Sender<CloseFrame>>>,
    reader: AbortHandle,
}

impl SocketSink for WsSink {
    fn send_text(&self, text: String) -> Result<(), CoreError> {
        self.tx.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => CoreError::Network("WebSocket 송신 대기열 가득 참".into()),
            TrySendError::Closed(_) => CoreError::Network("WebSocket 송신 채널 닫힘".into()),
        })
    }

    fn close(&self, code: u16, reason: &str) {
        if let Some(close_tx) = self.close_tx.lock().take() {
            let _ = close_tx.send(CloseFrame {
                code: CloseCode::from(code),
                reason: reason.to_string().into(),
            });
        }
    }
}

impl Drop for WsSink {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// 송신 루프. 닫기 요청이 대기 중인 프레임보다 우선한다.
async fn write_loop(
    mut write: SplitSink<WsStream, Message>,
    mut rx: mpsc::Receiver<String>,
    mut close_rx: oneshot::Receiver<CloseFrame>,
) {
    loop {
        tokio::select! {
            biased;
            frame = &mut close_rx => {
                if let Ok(frame) = frame {
                    match timeout(CLOSE_TIMEOUT, write.send(Message::Close(Some(frame)))).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => debug!("WebSocket 종료 프레임 전송 실패: {e}"),
                        Err(_) => debug!("WebSocket 종료 프레임 전송 시간 초과"),
                    }
                }
                break;
            }
            text = rx.recv() => {
                let Some(text) = text else {
                    break;
                };
                match timeout(SEND_TIMEOUT, write.send(Message::text(text))).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        warn!("WebSocket 전송 실패: {e}");
                        break;
                    }
                    Err(_) => {
                        warn!("WebSocket 전송 시간 초과 ({:?})", SEND_TIMEOUT);
                        break;
                    }
                }
            }
        }
    }
    debug!("WebSocket 송신 루프 종료");
}

/// 수신 루프
async fn read_loop(mut read: SplitStream<WsStream>, tx: mpsc::UnboundedSender<SocketEvent>) {
    while let Some(msg) = read.next().await {
        let event = match msg {
            Ok(Message::Text(text)) => SocketEvent::Text(text.to_string()),
            Ok(Message::Close(frame)) => {
                let (code, reason) = frame
                    .map(|f| (u16::from(f.code), f.reason.to_string()))
                    .unwrap_or((CLOSE_NO_STATUS, String::new()));
                let _ = tx.send(SocketEvent::Closed { code, reason });
                debug!("WebSocket 수신 루프 종료 (close {code})");
                return;
            }
            Ok(Message::Binary(data)) => {
                debug!("바이너리 프레임 무시 ({} bytes)", data.len());
                continue;
            }
            Ok(_) => continue, // Ping/Pong은 자동 처리
            Err(e) => {
                warn!("WebSocket 수신 에러: {e}");
                break;
            }
        };
        if tx.send(event).is_err() {
            debug!("WebSocket 수신 측 해제됨");
            return;
        }
    }
    let _ = tx.send(SocketEvent::Closed {
        code: CLOSE_ABNORMAL,
        reason: String::new(),
    });
    debug!("WebSocket 수신 루프 종료");
}

//! 연결 상태 게시.
//!
//! `watch` 채널로 현재 [`ConnectionState`]를 게시한다. 수신기 하나를 항상 보관하므로
//! 구독자가 없어도 게시는 실패하지 않는다.

use tokio::sync::watch;
use tracing::debug;
use wob_core::models::connection::ConnectionState;

/// 연결 상태 게시자
#[derive(Debug)]
pub struct ConnectivityMonitor {
    /// 상태 변경 브로드캐스트
    status_tx: watch::Sender<ConnectionState>,
    /// 상태 수신기 (복제 가능)
    status_rx: watch::Receiver<ConnectionState>,
}

impl ConnectivityMonitor {
    /// `Disconnected` 상태로 시작
    pub fn new() -> Self {
        let (status_tx, status_rx) = watch::channel(ConnectionState::Disconnected);
        Self {
            status_tx,
            status_rx,
        }
    }

    /// 현재 연결 상태
    pub fn status(&self) -> ConnectionState {
        *self.status_rx.borrow()
    }

    /// 상태 변경 수신기 생성
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.status_rx.clone()
    }

    /// 상태 전환. 실제로 바뀌었으면 `true`.
    pub fn set(&self, next: ConnectionState) -> bool {
        let mut previous = next;
        let changed = self.status_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            previous = *current;
            *current = next;
            true
        });
        if changed {
            debug!("연결 상태 변경: {} → {}", previous, next);
        }
        changed
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

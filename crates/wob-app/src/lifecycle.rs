//! 라이프사이클 관리.
//!
//! 종료 신호 브로드캐스트, OS 시그널 핸들링, 제한 시간 안의 컨트롤러 정리.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// 라이프사이클 관리자
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LifecycleManager {
    /// 새 라이프사이클 관리자 생성
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    /// 종료 수신기 복제
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// 종료 신호 발송
    pub fn shutdown(&self) {
        info!("종료 신호 발송");
        let _ = self.shutdown_tx.send(true);
    }

    /// 종료 신호를 보내고 작업이 끝나기를 최대 `grace`만큼 기다린다.
    /// 시간을 넘기면 작업을 중단하고 `None`.
    pub async fn shutdown_within<T>(
        &self,
        mut task: JoinHandle<T>,
        grace: Duration,
    ) -> Option<T> {
        self.shutdown();
        match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!("작업 비정상 종료: {e}");
                None
            }
            Err(_) => {
                warn!("종료 대기 시간 초과 ({}ms) - 작업 중단", grace.as_millis());
                task.abort();
                None
            }
        }
    }

    /// OS 시그널 대기 (SIGINT, SIGTERM). 핸들러 등록에 실패하면 시그널 없이 반환하지 않는다.
    pub async fn wait_for_signal(&self) {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let (mut sigint, mut sigterm) =
                match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
                    (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
                    (Err(e), _) | (_, Err(e)) => {
                        warn!("시그널 핸들러 등록 실패: {e}");
                        return std::future::pending().await;
                    }
                };

            tokio::select! {
                _ = sigint.recv() => {
                    info!("SIGINT 수신");
                }
                _ = sigterm.recv() => {
                    info!("SIGTERM 수신");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Ctrl+C 핸들러 등록 실패: {e}");
                return std::future::pending().await;
            }
            info!("Ctrl+C 수신");
        }

        self.shutdown();
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_creation() {
        let lm = LifecycleManager::new();
        let rx = lm.subscribe();
        assert!(!*rx.borrow());
    }

    #[test]
    fn shutdown_signal() {
        let lm = LifecycleManager::new();
        let rx = lm.subscribe();
        lm.shutdown();
        assert!(*rx.borrow());
    }

    #[tokio::test(start_paused = true)]
    async fn cooperative_task_finishes_within_grace() {
        let lm = LifecycleManager::new();
        let mut rx = lm.subscribe();
        let task = tokio::spawn(async move {
            let _ = rx.changed().await;
            7
        });

        let result = lm.shutdown_within(task, Duration::from_secs(2)).await;
        assert_eq!(result, Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_task_is_aborted_after_grace() {
        let lm = LifecycleManager::new();
        let task = tokio::spawn(std::future::pending::<()>());

        let started = tokio::time::Instant::now();
        let result = lm.shutdown_within(task, Duration::from_secs(2)).await;
        assert_eq!(result, None);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}

//! 데스크톱 기기 어댑터.
//!
//! 화면 꺼짐 방지와 진동을 지원하지 않는 호스트용 구현. 상태만 추적하고 로그로 남긴다.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::debug;
use wob_core::error::CoreError;
use wob_core::ports::device::{Haptics, WakeLock};

/// 상태만 보관하는 화면 꺼짐 방지
#[derive(Debug, Default)]
pub struct DesktopWakeLock {
    held: AtomicBool,
}

impl DesktopWakeLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WakeLock for DesktopWakeLock {
    async fn request(&self) -> Result<(), CoreError> {
        if !self.held.swap(true, Ordering::SeqCst) {
            debug!("화면 꺼짐 방지 획득");
        }
        Ok(())
    }

    fn release(&self) {
        if self.held.swap(false, Ordering::SeqCst) {
            debug!("화면 꺼짐 방지 해제");
        }
    }

    fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

/// 진동 대신 로그를 남기는 햅틱
#[derive(Debug, Default)]
pub struct LogHaptics {
    pulses: AtomicU64,
}

impl LogHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 지금까지 요청된 진동 횟수
    pub fn pulses(&self) -> u64 {
        self.pulses.load(Ordering::Relaxed)
    }
}

impl Haptics for LogHaptics {
    fn vibrate(&self, duration_ms: u32) {
        self.pulses.fetch_add(1, Ordering::Relaxed);
        debug!("진동 {}ms", duration_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wake_lock_tracks_state() {
        let lock = DesktopWakeLock::new();
        assert!(!lock.is_held());
        tokio_test::block_on(lock.request()).unwrap();
        tokio_test::block_on(lock.request()).unwrap();
        assert!(lock.is_held());
        lock.release();
        lock.release();
        assert!(!lock.is_held());
    }

    #[test]
    fn haptics_count_pulses() {
        let haptics = LogHaptics::new();
        haptics.vibrate(50);
        haptics.vibrate(15);
        assert_eq!(haptics.pulses(), 2);
    }
}

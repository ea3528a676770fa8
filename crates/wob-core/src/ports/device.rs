//! 기기 협력자 포트 — 화면 꺼짐 방지, 진동, 가시성 신호.

use async_trait::async_trait;

use crate::error::CoreError;

/// 페이지/앱 가시성
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// 화면 꺼짐 방지 잠금. 잠금 자체는 외부 협력자가 소유한다.
#[async_trait]
pub trait WakeLock: Send + Sync {
    /// 잠금 요청
    async fn request(&self) -> Result<(), CoreError>;

    /// 잠금 해제
    fn release(&self);

    /// 현재 잠금 보유 여부
    fn is_held(&self) -> bool;
}

/// 진동 피드백
pub trait Haptics: Send + Sync {
    /// `duration_ms` 동안 진동
    fn vibrate(&self, duration_ms: u32);
}

//! 터치 표면 포트.

use tokio::sync::mpsc;

use crate::error::CoreError;
use crate::models::touch::{SurfaceRect, TouchEvent};

/// 멀티터치 입력을 받는 경계 있는 표면
pub trait TouchSurface: Send + Sync {
    /// 현재 경계 사각형. 크기 변경을 반영하도록 이벤트마다 다시 측정한다.
    fn bounds(&self) -> SurfaceRect;

    /// start/move/end/cancel 이벤트 구독. 수신기를 drop하면 핸들러가 해제된다.
    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<TouchEvent>, CoreError>;
}

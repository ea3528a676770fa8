//! 호스트 센서 플랫폼 포트.
//!
//! 구현: `wob-sensors` crate (`DesktopPlatform`) 및 모바일 호스트 바인딩.
//! 플랫폼 이름으로 분기하지 않고 기능 플래그로만 판단한다.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::CoreError;
use crate::models::sensor::{GeoFix, RawMotion, RawOrientation, SensorAvailability};

/// 권한을 요청할 센서 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    Motion,
    Orientation,
    Geolocation,
}

/// 호스트 플랫폼 기능 플래그
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformCapabilities {
    /// 센서 API 존재 여부
    pub availability: SensorAvailability,
    /// 휴대/터치 기기로 인식되는지 (아니면 시뮬레이션 모드)
    pub handheld: bool,
    /// 사용자 제스처에 묶인 명시적 권한 요청이 필요한지
    pub permission_gated: bool,
}

/// 호스트 센서 플랫폼.
///
/// 구독은 `mpsc::UnboundedReceiver`로 반환되며, 수신기를 drop하면 리스너가 해제된다.
#[async_trait]
pub trait SensorPlatform: Send + Sync {
    /// 기능 플래그 조회 (부작용 없음)
    fn capabilities(&self) -> PlatformCapabilities;

    /// 권한 요청. 게이트된 플랫폼에서는 사용자 입력 이벤트 안에서 동기적으로 호출되어야 한다.
    async fn request_permission(&self, kind: PermissionKind) -> Result<bool, CoreError>;

    /// 모션(가속도+회전 속도) 이벤트 구독
    fn subscribe_motion(&self) -> Result<mpsc::UnboundedReceiver<RawMotion>, CoreError>;

    /// 방향 이벤트 구독
    fn subscribe_orientation(&self) -> Result<mpsc::UnboundedReceiver<RawOrientation>, CoreError>;

    /// 위치 감시 시작
    fn watch_position(&self) -> Result<mpsc::UnboundedReceiver<GeoFix>, CoreError>;
}

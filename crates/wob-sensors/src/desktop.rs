//! 데스크톱 호스트 플랫폼.
//!
//! 실제 모션/방향 센서가 없는 호스트. 휴대 기기가 아니므로
//! [`SensorSource`](crate::SensorSource)는 시뮬레이션 모드로 동작한다.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;
use wob_core::error::CoreError;
use wob_core::models::sensor::{GeoFix, RawMotion, RawOrientation, SensorAvailability};
use wob_core::ports::sensor_platform::{PermissionKind, PlatformCapabilities, SensorPlatform};

/// 데스크톱 플랫폼 (비휴대, 권한 게이트 없음)
#[derive(Debug, Clone, Copy)]
pub struct DesktopPlatform {
    availability: SensorAvailability,
}

impl DesktopPlatform {
    /// 새 데스크톱 플랫폼 생성.
    ///
    /// 모션/방향은 시뮬레이션으로 공급되므로 가용으로 보고하고, 위치는 없음.
    pub fn new() -> Self {
        Self {
            availability: SensorAvailability {
                motion: true,
                orientation: true,
                geolocation: false,
            },
        }
    }
}

impl Default for DesktopPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SensorPlatform for DesktopPlatform {
    fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities {
            availability: self.availability,
            handheld: false,
            permission_gated: false,
        }
    }

    async fn request_permission(&self, kind: PermissionKind) -> Result<bool, CoreError> {
        let granted = match kind {
            PermissionKind::Motion => self.availability.motion,
            PermissionKind::Orientation => self.availability.orientation,
            PermissionKind::Geolocation => self.availability.geolocation,
        };
        debug!("데스크톱 권한 요청: {:?} → {}", kind, granted);
        Ok(granted)
    }

    fn subscribe_motion(&self) -> Result<mpsc::UnboundedReceiver<RawMotion>, CoreError> {
        Err(CoreError::Capability("데스크톱에는 모션 센서가 없습니다".into()))
    }

    fn subscribe_orientation(&self) -> Result<mpsc::UnboundedReceiver<RawOrientation>, CoreError> {
        Err(CoreError::Capability("데스크톱에는 방향 센서가 없습니다".into()))
    }

    fn watch_position(&self) -> Result<mpsc::UnboundedReceiver<GeoFix>, CoreError> {
        Err(CoreError::Capability("데스크톱에는 위치 센서가 없습니다".into()))
    }
}

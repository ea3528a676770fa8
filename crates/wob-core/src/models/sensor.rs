//! 센서 판독값 모델.
//!
//! 정규화된 센서 그룹(가속도/자이로/방향/위치)과 선택·가용성 플래그,
//! 플랫폼에서 전달되는 원시 이벤트를 정의한다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 3축 벡터 (가속도, [-1, 1])
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// 회전 3성분 (자이로 [-1, 1] / 방향 [0, 1])
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// 위도/경도 (도 단위, 클램프 없음)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub lat: f64,
    pub lon: f64,
}

/// 정규화된 센서 판독값.
///
/// `None`은 "꺼짐"을 뜻하며 0 판독값과 구분된다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub accel: Option<Vec3>,
    pub gyro: Option<Rotation>,
    pub orient: Option<Rotation>,
    pub geo: Option<GeoPosition>,
}

impl SensorReading {
    /// 모든 그룹이 0으로 채워진 판독값
    pub fn zeroed() -> Self {
        Self {
            accel: Some(Vec3::default()),
            gyro: Some(Rotation::default()),
            orient: Some(Rotation::default()),
            geo: Some(GeoPosition::default()),
        }
    }

    /// 선택되지 않은 그룹을 제거한 사본
    pub fn filtered(&self, selection: &SensorSelection) -> Self {
        Self {
            accel: self.accel.filter(|_| selection.motion),
            gyro: self.gyro.filter(|_| selection.motion),
            orient: self.orient.filter(|_| selection.orientation),
            geo: self.geo.filter(|_| selection.geolocation),
        }
    }

    /// 포함된 그룹이 하나도 없는지
    pub fn is_empty(&self) -> bool {
        self.accel.is_none() && self.gyro.is_none() && self.orient.is_none() && self.geo.is_none()
    }
}

/// 센서 그룹 키
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKey {
    /// 가속도 + 자이로
    Motion,
    /// 기기 방향
    Orientation,
    /// GPS 위치
    Geolocation,
    /// 터치 포인트
    Touch,
}

impl SensorKey {
    /// 전체 키 목록 (표시 순서)
    pub const ALL: [SensorKey; 4] = [
        SensorKey::Motion,
        SensorKey::Orientation,
        SensorKey::Geolocation,
        SensorKey::Touch,
    ];

    /// 소문자 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKey::Motion => "motion",
            SensorKey::Orientation => "orientation",
            SensorKey::Geolocation => "geolocation",
            SensorKey::Touch => "touch",
        }
    }
}

impl fmt::Display for SensorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "motion" => Ok(SensorKey::Motion),
            "orientation" => Ok(SensorKey::Orientation),
            "geolocation" | "geo" => Ok(SensorKey::Geolocation),
            "touch" => Ok(SensorKey::Touch),
            other => Err(CoreError::validation(
                "sensor",
                format!("알 수 없는 센서 키: {other}"),
            )),
        }
    }
}

/// 브로드캐스트에 포함할 센서 그룹
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorSelection {
    pub motion: bool,
    pub orientation: bool,
    pub geolocation: bool,
    pub touch: bool,
}

impl Default for SensorSelection {
    fn default() -> Self {
        Self {
            motion: true,
            orientation: true,
            geolocation: false,
            touch: true,
        }
    }
}

impl SensorSelection {
    /// 키의 선택 여부
    pub fn is_selected(&self, key: SensorKey) -> bool {
        match key {
            SensorKey::Motion => self.motion,
            SensorKey::Orientation => self.orientation,
            SensorKey::Geolocation => self.geolocation,
            SensorKey::Touch => self.touch,
        }
    }

    /// 키의 선택 여부 설정
    pub fn set(&mut self, key: SensorKey, value: bool) {
        match key {
            SensorKey::Motion => self.motion = value,
            SensorKey::Orientation => self.orientation = value,
            SensorKey::Geolocation => self.geolocation = value,
            SensorKey::Touch => self.touch = value,
        }
    }
}

/// 호스트 플랫폼의 센서 기능 보유 여부
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorAvailability {
    pub motion: bool,
    pub orientation: bool,
    pub geolocation: bool,
}

impl SensorAvailability {
    /// 키별 가용성 (터치는 표면 연결 여부로 판단하므로 항상 true)
    pub fn is_available(&self, key: SensorKey) -> bool {
        match key {
            SensorKey::Motion => self.motion,
            SensorKey::Orientation => self.orientation,
            SensorKey::Geolocation => self.geolocation,
            SensorKey::Touch => true,
        }
    }
}

/// 센서별 권한 승인 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrants {
    pub motion: bool,
    pub orientation: bool,
    pub geolocation: bool,
}

/// 플랫폼이 전달하는 원시 모션 이벤트 (m/s², °/s). 없는 축은 `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawMotion {
    pub accel: [Option<f64>; 3],
    pub rotation_rate: [Option<f64>; 3],
}

/// 플랫폼이 전달하는 원시 방향 이벤트 (도)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawOrientation {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
}

/// 플랫폼이 전달하는 위치 고정값 (도)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
}

//! 센서·터치 정규화.
//!
//! 원시 물리량을 고정된 무차원 범위로 매핑하는 순수 함수 모음.
//! 입력이 범위를 벗어나거나 `None`/NaN이어도 출력은 항상 문서화된 범위 안에 있다.

use crate::models::sensor::{GeoFix, GeoPosition, RawMotion, RawOrientation, Rotation, Vec3};
use crate::models::touch::SurfaceRect;

/// 가속도 정규화 기준 (m/s², 1g)
pub const ACCEL_MAX: f64 = 9.81;

/// 자이로 정규화 기준 (°/s)
pub const GYRO_MAX: f64 = 360.0;

/// NaN/없음은 0으로
fn sanitize(raw: Option<f64>) -> f64 {
    match raw {
        Some(v) if !v.is_nan() => v,
        _ => 0.0,
    }
}

/// NaN 안전 클램프
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min.max(0.0).min(max);
    }
    value.clamp(min, max)
}

/// 가속도 한 축: raw ÷ 9.81, [-1, 1]
pub fn accel_axis(raw: Option<f64>) -> f64 {
    clamp(sanitize(raw) / ACCEL_MAX, -1.0, 1.0)
}

/// 자이로 한 축: raw ÷ 360, [-1, 1]
pub fn gyro_axis(raw: Option<f64>) -> f64 {
    clamp(sanitize(raw) / GYRO_MAX, -1.0, 1.0)
}

/// 방향 alpha: (raw mod 360) ÷ 360, [0, 1]
pub fn orient_alpha(raw: Option<f64>) -> f64 {
    let v = sanitize(raw);
    if !v.is_finite() {
        return 0.0;
    }
    clamp(v.rem_euclid(360.0) / 360.0, 0.0, 1.0)
}

/// 방향 beta: (raw + 180) ÷ 360, [0, 1]
pub fn orient_beta(raw: Option<f64>) -> f64 {
    clamp((sanitize(raw) + 180.0) / 360.0, 0.0, 1.0)
}

/// 방향 gamma: (raw + 90) ÷ 180, [0, 1]
pub fn orient_gamma(raw: Option<f64>) -> f64 {
    clamp((sanitize(raw) + 90.0) / 180.0, 0.0, 1.0)
}

/// 모션 이벤트를 (가속도, 자이로)로 정규화
pub fn motion(raw: &RawMotion) -> (Vec3, Rotation) {
    let accel = Vec3 {
        x: accel_axis(raw.accel[0]),
        y: accel_axis(raw.accel[1]),
        z: accel_axis(raw.accel[2]),
    };
    let gyro = Rotation {
        alpha: gyro_axis(raw.rotation_rate[0]),
        beta: gyro_axis(raw.rotation_rate[1]),
        gamma: gyro_axis(raw.rotation_rate[2]),
    };
    (accel, gyro)
}

/// 방향 이벤트 정규화
pub fn orientation(raw: &RawOrientation) -> Rotation {
    Rotation {
        alpha: orient_alpha(raw.alpha),
        beta: orient_beta(raw.beta),
        gamma: orient_gamma(raw.gamma),
    }
}

/// 위치는 도 단위 그대로 (클램프 없음)
pub fn geo(fix: &GeoFix) -> GeoPosition {
    GeoPosition {
        lat: fix.latitude,
        lon: fix.longitude,
    }
}

/// 소수점 4자리 반올림
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// 터치 좌표 한 축: (client - origin) ÷ extent, [0, 1], 소수점 4자리
pub fn touch_axis(client: f64, origin: f64, extent: f64) -> f64 {
    if !extent.is_finite() || extent <= 0.0 {
        return 0.0;
    }
    round4(clamp((client - origin) / extent, 0.0, 1.0))
}

/// 표면 경계 기준 터치 좌표 (x, y)
pub fn touch_point(client_x: f64, client_y: f64, rect: &SurfaceRect) -> (f64, f64) {
    (
        touch_axis(client_x, rect.left, rect.width),
        touch_axis(client_y, rect.top, rect.height),
    )
}

//! 시뮬레이션 파형.
//!
//! 센서 API가 없는 호스트(데스크톱)에서 정규화 범위 안의 결정적 파형을 생성한다.
//! 시각 `t`는 틱마다 [`STEP`]씩 증가하는 단조 증가 값이다.

use wob_core::models::sensor::{Rotation, Vec3};

/// 틱당 시뮬레이션 시각 증가량
pub const STEP: f64 = 0.03;

/// 한 시각의 시뮬레이션 판독값
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedFrame {
    pub accel: Vec3,
    pub gyro: Rotation,
    pub orient: Rotation,
}

/// 단조 증가 시뮬레이션 시계
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulationClock {
    t: f64,
}

impl SimulationClock {
    /// 한 틱 진행 후 새 시각 반환
    pub fn advance(&mut self) -> f64 {
        self.t += STEP;
        self.t
    }

    /// 현재 시각
    pub fn now(&self) -> f64 {
        self.t
    }
}

/// 시각 `t`의 파형 값
pub fn frame_at(t: f64) -> SimulatedFrame {
    SimulatedFrame {
        accel: Vec3 {
            x: (t * 1.2).sin() * 0.3,
            y: (t * 0.8).cos() * 0.2,
            z: (t * 0.5).sin() * 0.1 + 0.98,
        },
        gyro: Rotation {
            alpha: (t * 2.0).sin() * 0.15,
            beta: (t * 1.5).cos() * 0.1,
            gamma: (t * 1.8).sin() * 0.12,
        },
        orient: Rotation {
            alpha: ((t * 0.3).sin() + 1.0) / 2.0,
            beta: ((t * 0.4).cos() + 1.0) / 2.0,
            gamma: ((t * 0.5).sin() + 1.0) / 2.0,
        },
    }
}

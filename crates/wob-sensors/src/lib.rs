//! # wob-sensors
//!
//! 센서·터치 수집 어댑터.
//! 호스트 플랫폼의 원시 센서/터치 이벤트를 받아 정규화된 최신값으로 유지한다.
//! 휴대 기기가 아닌 호스트에서는 결정적 파형을 생성하는 시뮬레이션 모드로 동작.

pub mod desktop;
pub mod simulation;
pub mod source;
pub mod touch;

pub use source::{SensorReader, SensorSource};
pub use touch::{TouchSource, TouchTracker};

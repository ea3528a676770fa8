//! 터치 모델.
//!
//! 정규화된 터치 포인트, 스냅샷, 플랫폼 원시 터치 이벤트.

use serde::{Deserialize, Serialize};

/// 터치 상태 (와이어 값: down=1, up=0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TouchState {
    Up,
    Down,
}

impl TouchState {
    /// 와이어 표현
    pub fn as_wire(self) -> u8 {
        match self {
            TouchState::Up => 0,
            TouchState::Down => 1,
        }
    }
}

impl From<TouchState> for u8 {
    fn from(state: TouchState) -> Self {
        state.as_wire()
    }
}

impl TryFrom<u8> for TouchState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TouchState::Up),
            1 => Ok(TouchState::Down),
            other => Err(format!("잘못된 터치 상태: {other}")),
        }
    }
}

/// 정규화된 터치 포인트.
///
/// `id`는 한 번의 연속 접촉 동안만 안정적이며 해제 후 재사용될 수 있다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: i64,
    /// [0, 1], 소수점 4자리
    pub x: f64,
    /// [0, 1], 소수점 4자리
    pub y: f64,
    pub state: TouchState,
}

/// 현재 활성 터치 포인트 목록
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TouchSnapshot {
    pub touches: Vec<TouchPoint>,
    pub count: usize,
}

impl TouchSnapshot {
    /// 포인트 목록으로 스냅샷 생성
    pub fn new(touches: Vec<TouchPoint>) -> Self {
        let count = touches.len();
        Self { touches, count }
    }

    /// id로 포인트 조회
    pub fn find(&self, id: i64) -> Option<&TouchPoint> {
        self.touches.iter().find(|t| t.id == id)
    }
}

/// 터치 표면의 현재 경계 사각형 (클라이언트 좌표)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurfaceRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// 원시 터치 이벤트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEventKind {
    Start,
    Move,
    End,
    Cancel,
}

/// 플랫폼이 보고하는 단일 접촉
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawContact {
    /// 플랫폼 할당 식별자
    pub identifier: i64,
    pub client_x: f64,
    pub client_y: f64,
}

/// 원시 터치 이벤트. `contacts`는 이벤트 시점에 표면에 남아 있는 모든 접촉
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub kind: TouchEventKind,
    pub contacts: Vec<RawContact>,
}

impl TouchEvent {
    /// 이벤트 생성 헬퍼
    pub fn new(kind: TouchEventKind, contacts: Vec<RawContact>) -> Self {
        Self { kind, contacts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_state_wire_values() {
        assert_eq!(TouchState::Down.as_wire(), 1);
        assert_eq!(TouchState::Up.as_wire(), 0);
        assert!(TouchState::try_from(2).is_err());
    }

    #[test]
    fn snapshot_count_tracks_len() {
        let snap = TouchSnapshot::new(vec![TouchPoint {
            id: 7,
            x: 0.5,
            y: 0.25,
            state: TouchState::Down,
        }]);
        assert_eq!(snap.count, 1);
        assert!(snap.find(7).is_some());
        assert!(snap.find(8).is_none());
    }
}

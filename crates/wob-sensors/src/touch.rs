//! 터치 소스.
//!
//! 표면의 멀티터치 이벤트를 정규화된 [`TouchSnapshot`]으로 변환한다.
//! 해제된 포인트는 제거되기 전에 정확히 한 번 `Up` 상태로 스냅샷에 실린다.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;
use wob_core::error::CoreError;
use wob_core::models::touch::{
    RawContact, SurfaceRect, TouchEvent, TouchEventKind, TouchPoint, TouchSnapshot, TouchState,
};
use wob_core::normalize;
use wob_core::ports::touch_surface::TouchSurface;

/// 활성 터치 집합 (삽입 순서 유지)
#[derive(Debug, Default)]
pub struct TouchTracker {
    active: Vec<TouchPoint>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이벤트 하나를 처리하고 내보낼 스냅샷들을 순서대로 반환
    pub fn handle(&mut self, event: &TouchEvent, bounds: &SurfaceRect) -> Vec<TouchSnapshot> {
        match event.kind {
            TouchEventKind::Start | TouchEventKind::Move => {
                self.upsert(&event.contacts, bounds);
                vec![self.snapshot()]
            }
            TouchEventKind::End | TouchEventKind::Cancel => {
                let mut out = Vec::new();
                let lifted: Vec<i64> = self
                    .active
                    .iter()
                    .map(|p| p.id)
                    .filter(|id| !event.contacts.iter().any(|c| c.identifier == *id))
                    .collect();

                for id in lifted {
                    if let Some(point) = self.active.iter_mut().find(|p| p.id == id) {
                        point.state = TouchState::Up;
                    }
                    out.push(self.snapshot());
                    self.active.retain(|p| p.id != id);
                }

                self.upsert(&event.contacts, bounds);
                out.push(self.snapshot());
                out
            }
        }
    }

    fn upsert(&mut self, contacts: &[RawContact], bounds: &SurfaceRect) {
        for contact in contacts {
            let (x, y) = normalize::touch_point(contact.client_x, contact.client_y, bounds);
            match self.active.iter_mut().find(|p| p.id == contact.identifier) {
                Some(point) => {
                    point.x = x;
                    point.y = y;
                    point.state = TouchState::Down;
                }
                None => self.active.push(TouchPoint {
                    id: contact.identifier,
                    x,
                    y,
                    state: TouchState::Down,
                }),
            }
        }
    }

    /// 현재 활성 집합의 스냅샷
    pub fn snapshot(&self) -> TouchSnapshot {
        TouchSnapshot::new(self.active.clone())
    }

    /// 활성 집합 비우기
    pub fn clear(&mut self) {
        self.active.clear();
    }
}

/// 표면에 붙어 스냅샷을 콜백으로 내보낸다
#[derive(Default)]
pub struct TouchSource {
    tracker: Arc<Mutex<TouchTracker>>,
    task: Option<JoinHandle<()>>,
}

impl TouchSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 표면에 연결. 이전 연결은 먼저 해제한다.
    ///
    /// 경계는 이벤트마다 `surface.bounds()`로 다시 측정한다.
    pub fn init<F>(
        &mut self,
        surface: Arc<dyn TouchSurface>,
        mut on_snapshot: F,
    ) -> Result<(), CoreError>
    where
        F: FnMut(TouchSnapshot) + Send + 'static,
    {
        self.destroy();
        let mut rx = surface.subscribe()?;
        let tracker = Arc::clone(&self.tracker);

        self.task = Some(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let bounds = surface.bounds();
                let snapshots = tracker.lock().handle(&event, &bounds);
                for snapshot in snapshots {
                    on_snapshot(snapshot);
                }
            }
            debug!("터치 이벤트 스트림 종료");
        }));
        debug!("터치 표면 연결");
        Ok(())
    }

    /// 표면 연결 해제 및 활성 집합 비우기
    pub fn destroy(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("터치 표면 해제");
        }
        self.tracker.lock().clear();
    }

    /// 현재 스냅샷
    pub fn snapshot(&self) -> TouchSnapshot {
        self.tracker.lock().snapshot()
    }

    /// 표면에 연결되어 있는지
    pub fn is_enabled(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for TouchSource {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

//! 컨트롤러 루프 통합 테스트. 루프백 소켓으로 전체 파이프라인을 구동한다.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use wob_app::commands::Command;
use wob_app::controller::{Controller, Ports};
use wob_app::device::{DesktopWakeLock, LogHaptics};
use wob_app::event_bus::{AppEvent, EventBus};
use wob_core::config::AppConfig;
use wob_core::error::CoreError;
use wob_core::models::connection::ConnectionState;
use wob_core::models::sensor::{GeoFix, RawMotion, RawOrientation, SensorAvailability, SensorKey};
use wob_core::models::touch::{RawContact, SurfaceRect, TouchEvent, TouchEventKind};
use wob_core::ports::device::{Haptics, Visibility, WakeLock};
use wob_core::ports::sensor_platform::{PermissionKind, PlatformCapabilities, SensorPlatform};
use wob_core::ports::touch_surface::TouchSurface;
use wob_network::LoopbackConnector;
use wob_sensors::desktop::DesktopPlatform;

// ── 테스트 어댑터 ────────────────────────────────────────────────────

/// 권한 게이트가 있는 휴대 기기
#[derive(Default)]
struct GatedPlatform {
    permission_requests: Mutex<Vec<PermissionKind>>,
    motion_tx: Mutex<Option<mpsc::UnboundedSender<RawMotion>>>,
    orientation_tx: Mutex<Option<mpsc::UnboundedSender<RawOrientation>>>,
}

#[async_trait]
impl SensorPlatform for GatedPlatform {
    fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities {
            availability: SensorAvailability {
                motion: true,
                orientation: true,
                geolocation: false,
            },
            handheld: true,
            permission_gated: true,
        }
    }

    async fn request_permission(&self, kind: PermissionKind) -> Result<bool, CoreError> {
        self.permission_requests.lock().push(kind);
        Ok(true)
    }

    fn subscribe_motion(&self) -> Result<mpsc::UnboundedReceiver<RawMotion>, CoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.motion_tx.lock() = Some(tx);
        Ok(rx)
    }

    fn subscribe_orientation(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<RawOrientation>, CoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.orientation_tx.lock() = Some(tx);
        Ok(rx)
    }

    fn watch_position(&self) -> Result<mpsc::UnboundedReceiver<GeoFix>, CoreError> {
        Err(CoreError::Capability("위치 없음".into()))
    }
}

/// 이벤트를 직접 주입하는 터치 표면
struct FakeSurface {
    tx: Mutex<Option<mpsc::UnboundedSender<TouchEvent>>>,
}

impl FakeSurface {
    fn new() -> Self {
        Self {
            tx: Mutex::new(None),
        }
    }

    fn tap(&self, id: i64) {
        let contact = RawContact {
            identifier: id,
            client_x: 50.0,
            client_y: 50.0,
        };
        if let Some(tx) = self.tx.lock().as_ref() {
            let _ = tx.send(TouchEvent::new(TouchEventKind::Start, vec![contact]));
        }
    }
}

impl TouchSurface for FakeSurface {
    fn bounds(&self) -> SurfaceRect {
        SurfaceRect {
            left: 0.0,
            top: 0.0,
            width: 100.0,
            height: 100.0,
        }
    }

    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<TouchEvent>, CoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.tx.lock() = Some(tx);
        Ok(rx)
    }
}

// ── 하네스 ───────────────────────────────────────────────────────────

struct Harness {
    connector: LoopbackConnector,
    wake_lock: Arc<DesktopWakeLock>,
    surface: Arc<FakeSurface>,
    events: broadcast::Receiver<AppEvent>,
    commands: mpsc::Sender<Command>,
    visibility_tx: watch::Sender<Visibility>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

fn spawn(platform: Arc<dyn SensorPlatform>, address: Option<&str>) -> Harness {
    let mut config = AppConfig::default_config();
    config.server.address = address.map(str::to_string);

    let connector = LoopbackConnector::recording();
    let wake_lock = Arc::new(DesktopWakeLock::new());
    let surface = Arc::new(FakeSurface::new());
    let (visibility_tx, visibility) = watch::channel(Visibility::Visible);
    let ports = Ports {
        sensor_platform: platform,
        touch_surface: Some(Arc::clone(&surface) as Arc<dyn TouchSurface>),
        connector: Arc::new(connector.clone()),
        wake_lock: Arc::clone(&wake_lock) as Arc<dyn WakeLock>,
        haptics: Arc::new(LogHaptics::new()) as Arc<dyn Haptics>,
        visibility,
    };

    let bus = Arc::new(EventBus::new(256));
    let events = bus.subscribe();
    let (commands, command_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let controller = Controller::new(config, ports, bus);
    let handle = tokio::spawn(controller.run(command_rx, shutdown_rx));

    Harness {
        connector,
        wake_lock,
        surface,
        events,
        commands,
        visibility_tx,
        shutdown_tx,
        handle,
    }
}

impl Harness {
    fn sensor_frames(&self) -> usize {
        self.connector.sent_of_type("sensor").len()
    }

    fn touch_frames(&self) -> usize {
        self.connector.sent_of_type("touch").len()
    }

    async fn command(&self, command: Command) {
        self.commands.send(command).await.unwrap();
        wait(5).await;
    }

    fn drain(&mut self) -> Vec<AppEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    fn last_status(&mut self) -> Option<wob_app::event_bus::StatusReport> {
        self.drain().into_iter().rev().find_map(|e| match e {
            AppEvent::Status(report) => Some(report),
            _ => None,
        })
    }
}

async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// ── 시나리오 ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn desktop_startup_connects_and_broadcasts() {
    let mut h = spawn(Arc::new(DesktopPlatform::new()), Some("192.168.1.5:9980"));
    wait(10).await;

    assert_eq!(h.connector.open_count(), 1);
    assert_eq!(h.connector.sent_of_type("hello").len(), 1);
    assert!(h.wake_lock.is_held());

    h.command(Command::Status).await;
    let status = h.last_status().expect("상태 이벤트");
    assert_eq!(status.state, ConnectionState::Connected);
    assert!(status.broadcasting);
    assert!(status.simulating);
    assert_eq!(status.slot.as_deref(), Some("0"));

    // 30Hz → 33ms 주기
    let before = h.sensor_frames();
    wait(330).await;
    let sent = h.sensor_frames() - before;
    assert!((9..=11).contains(&sent), "frames = {sent}");
}

#[tokio::test(start_paused = true)]
async fn remote_config_rebases_sample_rate() {
    let mut h = spawn(Arc::new(DesktopPlatform::new()), Some("td.local:9980"));
    wait(10).await;

    assert!(h
        .connector
        .push_inbound(r#"{"type":"config","sample_rate":"10","haptic":0,"sensor_touch":"0"}"#));
    wait(5).await;
    let before = h.sensor_frames();

    // 적용 시점에서 100, 200, 300ms 후
    wait(350).await;
    assert_eq!(h.sensor_frames() - before, 3);

    let applied = h.drain().into_iter().find_map(|e| match e {
        AppEvent::ConfigApplied(cfg) => Some(cfg),
        _ => None,
    });
    let applied = applied.expect("ConfigApplied 이벤트");
    assert_eq!(applied.sample_rate, Some(10));
    assert_eq!(applied.sensor_touch, Some(false));

    h.command(Command::Status).await;
    assert_eq!(h.last_status().unwrap().sample_rate, 10);
}

#[tokio::test(start_paused = true)]
async fn touch_frames_follow_selection() {
    let h = spawn(Arc::new(DesktopPlatform::new()), Some("td.local:9980"));
    wait(10).await;

    h.surface.tap(1);
    wait(1).await;
    assert_eq!(h.touch_frames(), 1);
    let frame = &h.connector.sent_of_type("touch")[0];
    assert_eq!(frame["count"], 1);
    assert_eq!(frame["t0x"], 0.5);

    h.command(Command::Toggle(SensorKey::Touch)).await;
    h.surface.tap(2);
    wait(1).await;
    assert_eq!(h.touch_frames(), 1);
}

#[tokio::test(start_paused = true)]
async fn rejection_waits_for_manual_retry() {
    let mut h = spawn(Arc::new(DesktopPlatform::new()), Some("td.local:9980"));
    wait(10).await;

    assert!(h
        .connector
        .push_inbound(r#"{"type":"rejected","reason":"server full"}"#));
    wait(30_000).await;
    assert_eq!(h.connector.open_count(), 1);
    assert!(h
        .drain()
        .iter()
        .any(|e| matches!(e, AppEvent::ConnectionChanged(ConnectionState::Rejected))));

    h.command(Command::Retry).await;
    assert_eq!(h.connector.open_count(), 2);
    h.command(Command::Status).await;
    assert_eq!(h.last_status().unwrap().state, ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn gated_platform_waits_for_operator() {
    let platform = Arc::new(GatedPlatform::default());
    let h = spawn(
        Arc::clone(&platform) as Arc<dyn SensorPlatform>,
        Some("td.local:9980"),
    );
    wait(2_500).await;

    // 권한이 필요하면 자동으로 켜지 않는다
    assert!(platform.permission_requests.lock().is_empty());
    assert_eq!(h.sensor_frames(), 0);

    h.command(Command::Sensors).await;
    assert_eq!(
        *platform.permission_requests.lock(),
        vec![PermissionKind::Motion, PermissionKind::Orientation]
    );
    assert!(platform.motion_tx.lock().is_some());

    wait(100).await;
    assert!(h.sensor_frames() >= 2);
}

#[tokio::test(start_paused = true)]
async fn broadcast_auto_restarts_after_manual_stop() {
    let mut h = spawn(Arc::new(DesktopPlatform::new()), Some("td.local:9980"));
    wait(10).await;

    h.command(Command::Broadcast).await;
    h.command(Command::Status).await;
    assert!(!h.last_status().unwrap().broadcasting);

    // 2초 점검 주기에 다시 켜진다
    wait(2_100).await;
    h.command(Command::Status).await;
    assert!(h.last_status().unwrap().broadcasting);
}

#[tokio::test(start_paused = true)]
async fn visibility_return_reacquires_wake_lock() {
    let h = spawn(Arc::new(DesktopPlatform::new()), Some("td.local:9980"));
    wait(10).await;
    assert!(h.wake_lock.is_held());

    h.visibility_tx.send(Visibility::Hidden).unwrap();
    wait(1).await;
    assert!(!h.wake_lock.is_held());

    h.visibility_tx.send(Visibility::Visible).unwrap();
    wait(1).await;
    assert!(h.wake_lock.is_held());
}

#[tokio::test(start_paused = true)]
async fn quit_disconnects_cleanly() {
    let h = spawn(Arc::new(DesktopPlatform::new()), Some("td.local:9980"));
    wait(10).await;

    h.commands.send(Command::Quit).await.unwrap();
    h.handle.await.unwrap();

    assert_eq!(h.connector.close_codes(), vec![1000]);
    assert!(!h.wake_lock.is_held());
}

#[tokio::test(start_paused = true)]
async fn shutdown_signal_stops_loop() {
    let h = spawn(Arc::new(DesktopPlatform::new()), None);
    wait(10).await;
    assert_eq!(h.connector.open_count(), 0);

    h.shutdown_tx.send(true).unwrap();
    h.handle.await.unwrap();
}

//! 센서 소스.
//!
//! 권한 협상, 플랫폼 리스너 수명 관리, 시뮬레이션 모드, 최신 정규화 판독값 보관.
//!
//! 리스너는 각각 tokio 태스크로 실행되며 공유 상태(`Arc<Mutex<_>>`)에 최신값을 덮어쓴다.
//! 소비자는 [`SensorReader`]로 현재 값을 읽는다. 리스너 태스크는 런타임 컨텍스트 안에서
//! 생성되므로 `start_listening`/`set_selected`는 tokio 런타임 안에서 호출해야 한다.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use wob_core::config::SensorConfig;
use wob_core::models::sensor::{
    GeoPosition, PermissionGrants, Rotation, SensorAvailability, SensorKey, SensorReading,
    SensorSelection, Vec3,
};
use wob_core::normalize;
use wob_core::ports::diagnostics::DiagnosticSink;
use wob_core::ports::sensor_platform::{PermissionKind, SensorPlatform};

use crate::simulation::{self, SimulationClock};

/// 그룹별 최신 정규화 값 (항상 존재, 초기값 0)
#[derive(Debug, Clone, Copy, Default)]
struct Readings {
    accel: Vec3,
    gyro: Rotation,
    orient: Rotation,
    geo: GeoPosition,
}

impl Readings {
    fn to_reading(self) -> SensorReading {
        SensorReading {
            accel: Some(self.accel),
            gyro: Some(self.gyro),
            orient: Some(self.orient),
            geo: Some(self.geo),
        }
    }
}

#[derive(Debug, Default)]
struct SharedState {
    readings: Readings,
    selection: SensorSelection,
    /// 리스닝 시작 이후 모션/방향 이벤트 수신 여부 (watchdog용)
    events_seen: bool,
    listening: bool,
    /// 시뮬레이션 시계 (재시작해도 이어짐)
    clock: SimulationClock,
}

/// 리스너 태스크 핸들
#[derive(Default)]
struct Listeners {
    motion: Option<JoinHandle<()>>,
    orientation: Option<JoinHandle<()>>,
    geolocation: Option<JoinHandle<()>>,
    simulation: Option<JoinHandle<()>>,
    watchdog: Option<JoinHandle<()>>,
}

impl Listeners {
    fn abort_all(&mut self) {
        for handle in [
            self.motion.take(),
            self.orientation.take(),
            self.geolocation.take(),
            self.simulation.take(),
            self.watchdog.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

/// 최신 센서 값 읽기 핸들 (복제 가능)
#[derive(Clone)]
pub struct SensorReader {
    state: Arc<Mutex<SharedState>>,
}

impl SensorReader {
    /// 선택된 그룹만 포함한 현재 판독값 (선택되지 않은 그룹은 `None`)
    pub fn get_data(&self) -> SensorReading {
        let state = self.state.lock();
        state.readings.to_reading().filtered(&state.selection)
    }

    /// 선택과 무관하게 모든 그룹 포함
    pub fn get_all_data(&self) -> SensorReading {
        self.state.lock().readings.to_reading()
    }

    /// 현재 센서 선택
    pub fn selection(&self) -> SensorSelection {
        self.state.lock().selection
    }

    /// 센서 리스닝 중인지
    pub fn is_listening(&self) -> bool {
        self.state.lock().listening
    }
}

/// 센서 소스
pub struct SensorSource {
    platform: Arc<dyn SensorPlatform>,
    diagnostics: Arc<dyn DiagnosticSink>,
    state: Arc<Mutex<SharedState>>,
    listeners: Listeners,
    simulating: bool,
    watchdog_after: Duration,
    simulation_period: Duration,
}

impl SensorSource {
    /// 새 센서 소스 생성. 초기 선택과 타이밍은 설정에서 가져온다.
    pub fn new(
        platform: Arc<dyn SensorPlatform>,
        diagnostics: Arc<dyn DiagnosticSink>,
        config: &SensorConfig,
    ) -> Self {
        let state = SharedState {
            selection: config.selection(),
            ..Default::default()
        };
        Self {
            platform,
            diagnostics,
            state: Arc::new(Mutex::new(state)),
            listeners: Listeners::default(),
            simulating: false,
            watchdog_after: config.watchdog(),
            simulation_period: config.simulation_period(),
        }
    }

    /// 읽기 핸들
    pub fn reader(&self) -> SensorReader {
        SensorReader {
            state: Arc::clone(&self.state),
        }
    }

    /// 플랫폼 센서 API 존재 여부 (부작용 없음)
    pub fn detect_availability(&self) -> SensorAvailability {
        self.platform.capabilities().availability
    }

    /// 사용자 제스처에 묶인 명시적 권한 요청이 필요한지
    pub fn needs_permission_request(&self) -> bool {
        self.platform.capabilities().permission_gated
    }

    /// 센서 권한 요청.
    ///
    /// 게이트가 없는 플랫폼에서는 가용성이 곧 승인이다. 위치는 가용하고 선택된 경우에만
    /// 요청한다. 요청 실패는 거부로 기록하고 경고 진단을 남긴다.
    pub async fn request_permissions(&self) -> PermissionGrants {
        let caps = self.platform.capabilities();
        let availability = caps.availability;
        let mut grants = PermissionGrants::default();

        if caps.permission_gated {
            grants.motion = self.request_one(PermissionKind::Motion).await;
            grants.orientation = self.request_one(PermissionKind::Orientation).await;
        } else {
            grants.motion = availability.motion;
            grants.orientation = availability.orientation;
        }

        if availability.geolocation && self.state.lock().selection.geolocation {
            grants.geolocation = self.request_one(PermissionKind::Geolocation).await;
        }

        debug!(
            "센서 권한: motion={} orientation={} geolocation={}",
            grants.motion, grants.orientation, grants.geolocation
        );
        grants
    }

    async fn request_one(&self, kind: PermissionKind) -> bool {
        match self.platform.request_permission(kind).await {
            Ok(granted) => granted,
            Err(e) => {
                self.diagnostics
                    .warn(&format!("{kind:?} 권한 요청 실패: {e}"));
                false
            }
        }
    }

    /// 센서 선택 설정.
    ///
    /// 리스닝 중에 위치 선택이 바뀌면 위치 감시를 즉시 시작/중지한다.
    pub fn set_selected(&mut self, key: SensorKey, value: bool) -> SensorSelection {
        let selection = {
            let mut state = self.state.lock();
            state.selection.set(key, value);
            state.selection
        };
        debug!("센서 선택: {} = {}", key, value);

        if key == SensorKey::Geolocation && self.is_listening() && !self.simulating {
            if value {
                if self.listeners.geolocation.is_none() && self.detect_availability().geolocation {
                    self.start_geolocation();
                }
            } else {
                self.stop_geolocation();
            }
        }
        selection
    }

    /// 센서 선택 반전
    pub fn toggle_selected(&mut self, key: SensorKey) -> SensorSelection {
        let current = self.state.lock().selection.is_selected(key);
        self.set_selected(key, !current)
    }

    /// 현재 센서 선택
    pub fn selection(&self) -> SensorSelection {
        self.state.lock().selection
    }

    /// 리스닝 시작. 이전 리스너는 모두 해제한 뒤 다시 붙인다.
    ///
    /// 휴대 기기가 아니면 실제 리스너 대신 시뮬레이션 태스크를 실행한다.
    pub fn start_listening(&mut self) {
        self.listeners.abort_all();
        self.state.lock().listening = true;

        let caps = self.platform.capabilities();
        if !caps.handheld {
            self.simulating = true;
            self.start_simulation();
            self.diagnostics.info("PC 감지 — 시뮬레이션 모드");
            return;
        }
        self.simulating = false;
        self.state.lock().events_seen = false;

        let availability = caps.availability;
        if availability.motion {
            self.start_motion();
        }
        if availability.orientation {
            self.start_orientation();
        }
        if availability.geolocation && self.state.lock().selection.geolocation {
            self.start_geolocation();
        }

        if self.listeners.motion.is_some() || self.listeners.orientation.is_some() {
            self.start_watchdog();
        }
        info!("센서 리스닝 시작");
    }

    /// 리스닝 중지. 모든 리스너를 해제하고 판독값을 0으로 되돌린다.
    pub fn stop_listening(&mut self) {
        self.listeners.abort_all();
        self.simulating = false;
        {
            let mut state = self.state.lock();
            state.listening = false;
            state.readings = Readings::default();
        }
        info!("센서 리스닝 중지");
    }

    /// 선택된 그룹만 포함한 현재 판독값
    pub fn get_data(&self) -> SensorReading {
        self.reader().get_data()
    }

    /// 모든 그룹 포함
    pub fn get_all_data(&self) -> SensorReading {
        self.reader().get_all_data()
    }

    pub fn is_listening(&self) -> bool {
        self.state.lock().listening
    }

    pub fn is_simulating(&self) -> bool {
        self.simulating
    }

    // ============================================================
    // 리스너 태스크
    // ============================================================

    fn start_motion(&mut self) {
        let mut rx = match self.platform.subscribe_motion() {
            Ok(rx) => rx,
            Err(e) => {
                self.diagnostics.warn(&format!("모션 센서 연결 실패: {e}"));
                return;
            }
        };
        let state = Arc::clone(&self.state);
        self.listeners.motion = Some(tokio::spawn(async move {
            while let Some(raw) = rx.recv().await {
                let (accel, gyro) = normalize::motion(&raw);
                let mut s = state.lock();
                s.readings.accel = accel;
                s.readings.gyro = gyro;
                s.events_seen = true;
            }
            debug!("모션 이벤트 스트림 종료");
        }));
    }

    fn start_orientation(&mut self) {
        let mut rx = match self.platform.subscribe_orientation() {
            Ok(rx) => rx,
            Err(e) => {
                self.diagnostics.warn(&format!("방향 센서 연결 실패: {e}"));
                return;
            }
        };
        let state = Arc::clone(&self.state);
        self.listeners.orientation = Some(tokio::spawn(async move {
            while let Some(raw) = rx.recv().await {
                let orient = normalize::orientation(&raw);
                let mut s = state.lock();
                s.readings.orient = orient;
                s.events_seen = true;
            }
            debug!("방향 이벤트 스트림 종료");
        }));
    }

    fn start_geolocation(&mut self) {
        let mut rx = match self.platform.watch_position() {
            Ok(rx) => rx,
            Err(e) => {
                self.diagnostics.warn(&format!("위치 감시 실패: {e}"));
                return;
            }
        };
        let state = Arc::clone(&self.state);
        self.listeners.geolocation = Some(tokio::spawn(async move {
            while let Some(fix) = rx.recv().await {
                state.lock().readings.geo = normalize::geo(&fix);
            }
            debug!("위치 스트림 종료");
        }));
        debug!("위치 감시 시작");
    }

    fn stop_geolocation(&mut self) {
        if let Some(handle) = self.listeners.geolocation.take() {
            handle.abort();
            debug!("위치 감시 중지");
        }
        self.state.lock().readings.geo = GeoPosition::default();
    }

    fn start_simulation(&mut self) {
        let state = Arc::clone(&self.state);
        let period = self.simulation_period;
        self.listeners.simulation = Some(tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let mut s = state.lock();
                let t = s.clock.advance();
                let frame = simulation::frame_at(t);
                s.readings.accel = frame.accel;
                s.readings.gyro = frame.gyro;
                s.readings.orient = frame.orient;
            }
        }));
    }

    fn start_watchdog(&mut self) {
        let state = Arc::clone(&self.state);
        let diagnostics = Arc::clone(&self.diagnostics);
        let after = self.watchdog_after;
        self.listeners.watchdog = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if !state.lock().events_seen {
                diagnostics.warn(&format!(
                    "센서 이벤트 없음 ({}초) — 권한이 거부되었을 수 있습니다",
                    after.as_secs_f64()
                ));
            }
        }));
    }
}

impl Drop for SensorSource {
    fn drop(&mut self) {
        self.listeners.abort_all();
    }
}

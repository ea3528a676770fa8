//! 컨트롤러 (조립 루트).
//!
//! 전송 계층, 센서/터치 소스, 브로드캐스트 스케줄러와 기기 포트를 소유하고
//! 상태 변화·제어 메시지·운영자 명령·주기 타이머를 한 루프에서 처리한다.

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use wob_core::config::AppConfig;
use wob_core::error::CoreError;
use wob_core::models::connection::ConnectionState;
use wob_core::models::remote_config::RemoteConfig;
use wob_core::models::sensor::SensorKey;
use wob_core::models::touch::TouchSnapshot;
use wob_core::ports::device::{Haptics, Visibility, WakeLock};
use wob_core::ports::diagnostics::DiagnosticSink;
use wob_core::ports::sensor_platform::SensorPlatform;
use wob_core::ports::socket::SocketConnector;
use wob_core::ports::touch_surface::TouchSurface;
use wob_core::protocol::{InboundMessage, OutboundMessage};
use wob_network::backoff::ReconnectPolicy;
use wob_network::Transport;
use wob_sensors::{SensorSource, TouchSource};

use crate::broadcast::BroadcastScheduler;
use crate::commands::Command;
use crate::event_bus::{AppEvent, BusDiagnostics, EventBus, LogBuffer, StatusReport};

/// 트리거 진동 길이 (ms)
const TRIGGER_PULSE_MS: u32 = 50;
/// 센서 선택 변경 진동 길이 (ms)
const TOGGLE_PULSE_MS: u32 = 15;

/// 컨트롤러가 사용하는 외부 협력자
pub struct Ports {
    pub sensor_platform: Arc<dyn SensorPlatform>,
    pub touch_surface: Option<Arc<dyn TouchSurface>>,
    pub connector: Arc<dyn SocketConnector>,
    pub wake_lock: Arc<dyn WakeLock>,
    pub haptics: Arc<dyn Haptics>,
    pub visibility: watch::Receiver<Visibility>,
}

/// 컨트롤러
pub struct Controller {
    config: AppConfig,
    transport: Transport,
    sensors: SensorSource,
    touch: TouchSource,
    touch_surface: Option<Arc<dyn TouchSurface>>,
    touch_tx: mpsc::UnboundedSender<TouchSnapshot>,
    touch_rx: Option<mpsc::UnboundedReceiver<TouchSnapshot>>,
    broadcast: BroadcastScheduler,
    wake_lock: Arc<dyn WakeLock>,
    haptics: Arc<dyn Haptics>,
    visibility: watch::Receiver<Visibility>,
    diagnostics: Arc<dyn DiagnosticSink>,
    bus: Arc<EventBus>,
    log: Arc<LogBuffer>,
    haptics_enabled: bool,
    wake_lock_wanted: bool,
    dev_mode: bool,
}

impl Controller {
    /// 구성 요소 생성 및 와이어링
    pub fn new(config: AppConfig, ports: Ports, bus: Arc<EventBus>) -> Self {
        let log = Arc::new(LogBuffer::new(config.diagnostics.log_capacity));
        let diagnostics: Arc<dyn DiagnosticSink> =
            Arc::new(BusDiagnostics::new(Arc::clone(&bus), Arc::clone(&log)));

        let transport = Transport::new(
            ports.connector,
            Arc::clone(&diagnostics),
            ReconnectPolicy::new(&config.reconnect),
        );
        let sensors = SensorSource::new(
            ports.sensor_platform,
            Arc::clone(&diagnostics),
            &config.sensors,
        );
        let broadcast = BroadcastScheduler::new(
            transport.clone(),
            sensors.reader(),
            Arc::clone(&diagnostics),
            config.broadcast.sample_rate,
        );
        let (touch_tx, touch_rx) = mpsc::unbounded_channel();

        Self {
            config,
            transport,
            sensors,
            touch: TouchSource::new(),
            touch_surface: ports.touch_surface,
            touch_tx,
            touch_rx: Some(touch_rx),
            broadcast,
            wake_lock: ports.wake_lock,
            haptics: ports.haptics,
            visibility: ports.visibility,
            diagnostics,
            bus,
            log,
            haptics_enabled: true,
            wake_lock_wanted: false,
            dev_mode: true,
        }
    }

    // ── 연결 ─────────────────────────────────────────────────────────

    /// 주소로 연결. 터치 표면을 붙이고 화면 꺼짐 방지를 요청한다.
    pub async fn connect(&mut self, address: &str) -> Result<(), CoreError> {
        self.transport.connect(address, self.config.server.secure)?;
        self.diagnostics.info(&format!("연결 시도: {address}"));
        self.attach_touch();
        self.wake_lock_wanted = true;
        self.acquire_wake_lock().await;
        Ok(())
    }

    /// 수동 재연결 (거부 상태 해제 포함)
    pub fn retry(&self) -> Result<(), CoreError> {
        self.transport.retry()
    }

    /// 전체 정지: 브로드캐스트, 센서, 터치, 연결, 화면 꺼짐 방지
    pub fn disconnect(&mut self) {
        self.broadcast.stop();
        self.touch.destroy();
        self.sensors.stop_listening();
        self.transport.disconnect();
        self.wake_lock_wanted = false;
        self.wake_lock.release();
    }

    fn attach_touch(&mut self) {
        if self.touch.is_enabled() {
            return;
        }
        let Some(surface) = self.touch_surface.clone() else {
            return;
        };
        let tx = self.touch_tx.clone();
        let attached = self.touch.init(surface, move |snapshot| {
            let _ = tx.send(snapshot);
        });
        if let Err(e) = attached {
            self.diagnostics.warn(&format!("터치 표면 연결 실패: {e}"));
        }
    }

    // ── 센서 ─────────────────────────────────────────────────────────

    /// 센서 활성화/비활성화 전환.
    ///
    /// 활성화 시 권한 게이트가 있는 플랫폼이면 먼저 권한을 요청한다.
    pub async fn enable_sensors(&mut self) {
        if self.sensors.is_listening() {
            self.sensors.stop_listening();
            self.diagnostics.info("센서 비활성화");
            return;
        }

        if self.sensors.needs_permission_request() {
            self.diagnostics.info("센서 권한 요청 중...");
            let grants = self.sensors.request_permissions().await;
            self.diagnostics.info(&format!(
                "권한: motion={} orientation={} geolocation={}",
                grants.motion, grants.orientation, grants.geolocation
            ));
        } else {
            debug!("권한 요청 불필요");
        }

        self.sensors.start_listening();

        if self.transport.is_connected() && !self.broadcast.is_running() {
            self.start_broadcast();
        }

        if self.sensors.is_simulating() {
            self.diagnostics.info("센서 활성화 (시뮬레이션)");
        } else {
            self.diagnostics.info("센서 활성화");
        }
    }

    /// 센서 그룹 선택 반전. 사용할 수 없는 센서는 무시한다.
    pub fn toggle_sensor(&mut self, key: SensorKey) {
        if !self.sensors.detect_availability().is_available(key) {
            self.diagnostics
                .warn(&format!("{key} 센서를 사용할 수 없습니다"));
            return;
        }
        let selection = self.sensors.toggle_selected(key);
        self.pulse(TOGGLE_PULSE_MS);
        self.diagnostics.info(&format!(
            "{key} {}",
            if selection.is_selected(key) { "ON" } else { "OFF" }
        ));
    }

    // ── 브로드캐스트 ─────────────────────────────────────────────────

    /// 브로드캐스트 시작/중지 전환
    pub fn toggle_broadcast(&mut self) {
        if self.broadcast.is_running() {
            self.broadcast.stop();
        } else {
            self.broadcast.start();
        }
        self.bus
            .publish(AppEvent::BroadcastChanged(self.broadcast.is_running()));
    }

    /// 단발 트리거 전송. 연결되어 있지 않으면 보내지 않는다.
    pub fn send_trigger(&self) -> bool {
        if !self.transport.is_connected() {
            return false;
        }
        let sent = self.transport.send(&OutboundMessage::Trigger);
        self.pulse(TRIGGER_PULSE_MS);
        sent
    }

    fn pulse(&self, duration_ms: u32) {
        if self.haptics_enabled {
            self.haptics.vibrate(duration_ms);
        }
    }

    // ── 원격 설정 ────────────────────────────────────────────────────

    /// 원격 엔진이 보낸 설정 적용. 존재하는 필드만 반영한다.
    pub async fn apply_config(&mut self, remote: &RemoteConfig) {
        if let Some(rate) = remote.sample_rate {
            if rate != self.broadcast.sample_rate() {
                match self.broadcast.set_sample_rate(rate) {
                    Ok(()) => self.diagnostics.info(&format!("Config: sample_rate={rate}Hz")),
                    Err(e) => self.diagnostics.warn(&format!("sample_rate 적용 실패: {e}")),
                }
            }
        }

        if let Some(wanted) = remote.wake_lock {
            self.wake_lock_wanted = wanted;
            if wanted {
                self.acquire_wake_lock().await;
            } else {
                self.wake_lock.release();
            }
            self.diagnostics
                .info(&format!("Config: wake_lock={}", u8::from(wanted)));
        }

        if let Some(enabled) = remote.haptic {
            self.haptics_enabled = enabled;
            self.diagnostics
                .info(&format!("Config: haptic={}", u8::from(enabled)));
        }

        for (key, value) in remote.sensor_flags() {
            self.sensors.set_selected(key, value);
            self.diagnostics
                .info(&format!("Config: sensor_{key}={}", u8::from(value)));
        }

        if let Some(dev_mode) = remote.dev_mode {
            self.dev_mode = dev_mode;
            self.diagnostics
                .info(&format!("Config: dev_mode={}", u8::from(dev_mode)));
        }

        self.bus.publish(AppEvent::ConfigApplied(remote.clone()));
    }

    async fn acquire_wake_lock(&self) {
        if self.wake_lock.is_held() {
            return;
        }
        if let Err(e) = self.wake_lock.request().await {
            self.diagnostics
                .warn(&format!("화면 꺼짐 방지 요청 실패: {e}"));
        }
    }

    // ── 이벤트 처리 ──────────────────────────────────────────────────

    /// 연결 상태 변경 처리. 연결되면 센서 상태에 따라 브로드캐스트를 자동 시작한다.
    pub fn on_state_change(&mut self, state: ConnectionState) {
        self.bus.publish(AppEvent::ConnectionChanged(state));
        if state != ConnectionState::Connected {
            return;
        }
        if self.sensors.is_listening() {
            if !self.broadcast.is_running() {
                self.diagnostics.info("브로드캐스트 자동 시작");
                self.start_broadcast();
            }
        } else {
            self.diagnostics
                .warn("센서가 활성화되지 않았습니다 - sensors 명령으로 활성화하세요");
        }
    }

    /// 화면 표시 상태 변경 처리
    pub async fn on_visibility(&mut self, visibility: Visibility) {
        match visibility {
            Visibility::Visible => {
                if self.wake_lock_wanted && !self.wake_lock.is_held() {
                    debug!("화면 복귀, 화면 꺼짐 방지 재요청");
                    self.acquire_wake_lock().await;
                }
            }
            // 숨겨지면 플랫폼이 화면 꺼짐 방지를 풀어버린다
            Visibility::Hidden => self.wake_lock.release(),
        }
    }

    /// 주기 점검: 연결+센서 조건이 맞는데 브로드캐스트가 멈춰 있으면 다시 시작
    pub fn auto_start_tick(&mut self) {
        if self.transport.is_connected()
            && self.sensors.is_listening()
            && !self.broadcast.is_running()
        {
            self.diagnostics.info("브로드캐스트 자동 시작 (재시도)");
            self.start_broadcast();
        }
    }

    fn start_broadcast(&mut self) {
        if self.broadcast.start() {
            self.bus.publish(AppEvent::BroadcastChanged(true));
        }
    }

    /// 터치 스냅샷 전달
    pub fn on_touch(&self, snapshot: TouchSnapshot) {
        self.broadcast.send_touch(snapshot);
    }

    /// 운영자 명령 처리. 종료 명령이면 `Break`.
    pub async fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Trigger => {
                if !self.send_trigger() {
                    self.diagnostics.warn("연결되지 않아 트리거를 보내지 않았습니다");
                }
            }
            Command::Retry => {
                if let Err(e) = self.retry() {
                    self.diagnostics.error(&format!("재연결 실패: {e}"));
                }
            }
            Command::Connect(address) => {
                if let Err(e) = self.connect(&address).await {
                    self.diagnostics.error(&format!("연결 실패: {e}"));
                }
            }
            Command::Disconnect => self.disconnect(),
            Command::Broadcast => self.toggle_broadcast(),
            Command::Sensors => self.enable_sensors().await,
            Command::Toggle(key) => self.toggle_sensor(key),
            Command::Status => self.bus.publish(AppEvent::Status(self.status())),
            Command::Log => self.bus.publish(AppEvent::Log(self.log.entries())),
            Command::Help => {}
            Command::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    // ── 조회 ─────────────────────────────────────────────────────────

    /// 상태 요약
    pub fn status(&self) -> StatusReport {
        StatusReport {
            state: self.transport.state(),
            packets_per_sec: self.transport.packets_per_sec(),
            broadcasting: self.broadcast.is_running(),
            listening: self.sensors.is_listening(),
            simulating: self.sensors.is_simulating(),
            sample_rate: self.broadcast.sample_rate(),
            slot: self.transport.slot(),
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn sensors(&self) -> &SensorSource {
        &self.sensors
    }

    pub fn is_broadcasting(&self) -> bool {
        self.broadcast.is_running()
    }

    pub fn sample_rate(&self) -> u32 {
        self.broadcast.sample_rate()
    }

    pub fn haptics_enabled(&self) -> bool {
        self.haptics_enabled
    }

    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }

    pub fn log_buffer(&self) -> Arc<LogBuffer> {
        Arc::clone(&self.log)
    }

    // ── 실행 루프 ────────────────────────────────────────────────────

    /// 시작 동작: 권한 게이트가 없으면 센서를 바로 켜고, 주소가 설정돼 있으면 연결한다.
    pub async fn startup(&mut self) {
        if !self.sensors.needs_permission_request() {
            self.enable_sensors().await;
        }
        match self.config.server.address.clone() {
            Some(address) => {
                self.diagnostics.info(&format!("자동 연결: {address}"));
                if let Err(e) = self.connect(&address).await {
                    self.diagnostics.error(&format!("연결 실패: {e}"));
                }
            }
            None => self
                .diagnostics
                .warn("주소 미지정 - connect <주소> 명령으로 연결하세요"),
        }
    }

    /// 메인 루프. 종료 신호나 `quit` 명령이 오면 전체 정지 후 반환한다.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut state_rx = self.transport.subscribe_state();
        let mut control_rx = self.transport.subscribe_control();
        let mut visibility_rx = self.visibility.clone();
        let Some(mut touch_rx) = self.touch_rx.take() else {
            warn!("컨트롤러 루프가 이미 실행됨");
            return;
        };

        let retry_every = self.config.auto_start_retry();
        let mut auto_start = interval_at(Instant::now() + retry_every, retry_every);
        auto_start.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let status_every = self.config.status_interval();
        let mut status_tick = interval_at(Instant::now() + status_every, status_every);
        status_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.startup().await;

        let mut commands_open = true;
        let mut visibility_open = true;
        info!("컨트롤러 루프 시작");

        loop {
            tokio::select! {
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = *state_rx.borrow_and_update();
                    self.on_state_change(state);
                }
                message = control_rx.recv() => match message {
                    Ok(InboundMessage::Config(remote)) => self.apply_config(&remote).await,
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("제어 메시지 {}개 유실", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                Some(snapshot) = touch_rx.recv() => self.on_touch(snapshot),
                _ = auto_start.tick() => self.auto_start_tick(),
                _ = status_tick.tick() => {
                    debug!("{}", self.status().format_line());
                }
                command = commands.recv(), if commands_open => match command {
                    Some(command) => {
                        if self.handle_command(command).await.is_break() {
                            info!("종료 명령 수신");
                            break;
                        }
                    }
                    None => {
                        debug!("명령 입력 종료");
                        commands_open = false;
                    }
                },
                changed = visibility_rx.changed(), if visibility_open => {
                    if changed.is_err() {
                        visibility_open = false;
                        continue;
                    }
                    let visibility = *visibility_rx.borrow_and_update();
                    self.on_visibility(visibility).await;
                }
                _ = shutdown_rx.changed() => {
                    info!("컨트롤러 종료 신호 수신");
                    break;
                }
            }
        }

        self.disconnect();
        info!("컨트롤러 정지");
    }
}

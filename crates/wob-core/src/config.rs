//! 애플리케이션 설정 구조체.
//!
//! 엔진 주소, 전송 주기, 센서 선택, 재연결 백오프, 진단 로그 크기 등
//! 런타임 설정을 정의한다. `config` crate를 통해 파일/환경변수에서 로드.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;
use crate::models::sensor::SensorSelection;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 원격 엔진 연결 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 브로드캐스트 설정
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    /// 센서 설정
    #[serde(default)]
    pub sensors: SensorConfig,
    /// 재연결 백오프 설정
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    /// 진단 로그 설정
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

// ============================================================
// 서버 연결 설정
// ============================================================

/// 원격 엔진 연결 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// `host[:port]` 형식 주소 (스킴은 무시하고 `secure`로 결정)
    #[serde(default)]
    pub address: Option<String>,
    /// 보안 컨텍스트 여부. true면 `wss://`, false면 `ws://`
    #[serde(default)]
    pub secure: bool,
}

// ============================================================
// 브로드캐스트 설정
// ============================================================

/// 브로드캐스트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// 센서 전송 주기 (Hz). 원격 엔진이 config 메시지로 덮어쓸 수 있다.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// 연결+센서 조건 충족 시 브로드캐스트 자동 재시작 점검 주기 (밀리초)
    #[serde(default = "default_auto_start_retry_ms")]
    pub auto_start_retry_ms: u64,
    /// 상태 라인 출력 주기 (밀리초)
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            auto_start_retry_ms: default_auto_start_retry_ms(),
            status_interval_ms: default_status_interval_ms(),
        }
    }
}

// ============================================================
// 센서 설정
// ============================================================

/// 센서 설정 (초기 선택 상태와 타이밍)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// 모션(가속도+자이로) 전송
    #[serde(default = "default_true")]
    pub motion: bool,
    /// 방향 전송
    #[serde(default = "default_true")]
    pub orientation: bool,
    /// 위치 전송 (위치 폴링은 선택 시에만 시작)
    #[serde(default)]
    pub geolocation: bool,
    /// 터치 전송
    #[serde(default = "default_true")]
    pub touch: bool,
    /// 실제 센서 이벤트 미수신 경고까지 대기 시간 (밀리초)
    #[serde(default = "default_watchdog_ms")]
    pub watchdog_ms: u64,
    /// 시뮬레이션 모드 갱신 주기 (밀리초)
    #[serde(default = "default_simulation_period_ms")]
    pub simulation_period_ms: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            motion: true,
            orientation: true,
            geolocation: false,
            touch: true,
            watchdog_ms: default_watchdog_ms(),
            simulation_period_ms: default_simulation_period_ms(),
        }
    }
}

impl SensorConfig {
    /// 초기 센서 선택 상태
    pub fn selection(&self) -> SensorSelection {
        SensorSelection {
            motion: self.motion,
            orientation: self.orientation,
            geolocation: self.geolocation,
            touch: self.touch,
        }
    }

    /// 워치독 대기 시간
    pub fn watchdog(&self) -> Duration {
        Duration::from_millis(self.watchdog_ms)
    }

    /// 시뮬레이션 갱신 주기
    pub fn simulation_period(&self) -> Duration {
        Duration::from_millis(self.simulation_period_ms)
    }
}

// ============================================================
// 재연결 설정
// ============================================================

/// 재연결 백오프 설정 — `min(base * multiplier^attempts, max)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// 첫 재연결 지연 (밀리초)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// 시도마다 곱해지는 배수
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// 최대 지연 (밀리초)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

// ============================================================
// 진단 설정
// ============================================================

/// 진단 로그 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// 보관할 최근 로그 줄 수
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            log_capacity: default_log_capacity(),
        }
    }
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig::default(),
            broadcast: BroadcastConfig::default(),
            sensors: SensorConfig::default(),
            reconnect: ReconnectConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.broadcast.sample_rate == 0 {
            return Err(CoreError::Config(
                "broadcast.sample_rate는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.broadcast.auto_start_retry_ms == 0 || self.broadcast.status_interval_ms == 0 {
            return Err(CoreError::Config(
                "broadcast 점검/상태 주기는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.sensors.simulation_period_ms == 0 {
            return Err(CoreError::Config(
                "sensors.simulation_period_ms는 0보다 커야 합니다".to_string(),
            ));
        }
        if !self.reconnect.multiplier.is_finite() || self.reconnect.multiplier < 1.0 {
            return Err(CoreError::Config(format!(
                "reconnect.multiplier는 1.0 이상이어야 합니다: {}",
                self.reconnect.multiplier
            )));
        }
        if self.reconnect.max_delay_ms < self.reconnect.base_delay_ms {
            return Err(CoreError::Config(format!(
                "reconnect.max_delay_ms({})가 base_delay_ms({})보다 작습니다",
                self.reconnect.max_delay_ms, self.reconnect.base_delay_ms
            )));
        }
        if self.diagnostics.log_capacity == 0 {
            return Err(CoreError::Config(
                "diagnostics.log_capacity는 0보다 커야 합니다".to_string(),
            ));
        }
        Ok(())
    }

    /// 자동 시작 점검 주기를 Duration으로 반환
    pub fn auto_start_retry(&self) -> Duration {
        Duration::from_millis(self.broadcast.auto_start_retry_ms)
    }

    /// 상태 라인 주기를 Duration으로 반환
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast.status_interval_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}
fn default_sample_rate() -> u32 {
    30
}
fn default_auto_start_retry_ms() -> u64 {
    2_000
}
fn default_status_interval_ms() -> u64 {
    1_000
}
fn default_watchdog_ms() -> u64 {
    2_000
}
fn default_simulation_period_ms() -> u64 {
    30
}
fn default_base_delay_ms() -> u64 {
    1_000
}
fn default_multiplier() -> f64 {
    1.5
}
fn default_max_delay_ms() -> u64 {
    10_000
}
fn default_log_capacity() -> usize {
    30
}

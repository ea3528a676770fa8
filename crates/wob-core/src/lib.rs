//! # wob-core
//!
//! WOB 도메인 모델, 정규화 함수, 와이어 프로토콜, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 도메인 데이터 구조체 (센서/터치/연결 상태/원격 설정)
//! - [`normalize`] — 원시 센서·터치 값을 무차원 범위로 매핑하는 순수 함수
//! - [`protocol`] — JSON 프레임 인코딩/디코딩 (`sensor`, `touch`, `ack`, `config` ...)
//! - [`ports`] — 외부 협력자 포트 인터페이스 (async_trait)
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — 애플리케이션 설정 구조체

pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod ports;
pub mod protocol;

#[cfg(test)]
mod tests {
    use crate::models::sensor::{SensorKey, SensorSelection};

    #[test]
    fn config_defaults() {
        let config = crate::config::AppConfig::default_config();
        assert_eq!(config.broadcast.sample_rate, 30);
        assert_eq!(config.reconnect.base_delay_ms, 1_000);
        assert_eq!(config.reconnect.max_delay_ms, 10_000);
        assert_eq!(config.sensors.watchdog_ms, 2_000);
        assert_eq!(config.sensors.simulation_period_ms, 30);
        assert!(!config.server.secure);
    }

    #[test]
    fn default_selection_matches_config() {
        let config = crate::config::AppConfig::default_config();
        let selection = config.sensors.selection();
        assert_eq!(selection, SensorSelection::default());
        assert!(selection.is_selected(SensorKey::Motion));
        assert!(!selection.is_selected(SensorKey::Geolocation));
    }
}

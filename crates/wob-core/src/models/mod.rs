//! WOB 도메인 모델.
//!
//! 센서 판독값, 터치 스냅샷, 연결 상태, 원격 설정 등
//! 파이프라인 전 구간에서 공유하는 데이터 구조체를 정의한다.

pub mod connection;
pub mod diagnostic;
pub mod remote_config;
pub mod sensor;
pub mod touch;

//! 포트 인터페이스 (trait).
//!
//! 외부 협력자(호스트 센서 플랫폼, 터치 표면, 소켓, 화면 꺼짐 방지, 진동,
//! 진단 출력)의 경계. 어댑터 crate가 이 trait들을 구현하며,
//! `wob-app`에서 `Arc<dyn T>`로 와이어링한다.
//!
//! 비동기 포트는 `async_trait` 매크로로 object safety를 보장한다.

pub mod device;
pub mod diagnostics;
pub mod sensor_platform;
pub mod socket;
pub mod touch_surface;

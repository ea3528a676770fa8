//! # wob-network
//!
//! 원격 엔진과의 단일 논리 연결을 담당하는 전송 어댑터.
//! 연결 상태 머신, 지수 백오프 재연결, 서버 입장 제어(ack/rejected),
//! 초당 패킷 수 계측을 제공한다.
//!
//! ## 구성
//!
//! - [`transport`] — 상태 머신 본체 (`Transport`)
//! - [`ws_client`] — tokio-tungstenite 기반 소켓 어댑터
//! - [`loopback`] — 프로세스 내 루프백 소켓 (dry-run, 테스트)
//! - [`endpoint`] — 주소 → ws/wss URL 해석

pub mod backoff;
pub mod close;
pub mod connectivity;
pub mod endpoint;
pub mod loopback;
pub mod packet_rate;
pub mod transport;
pub mod ws_client;

pub use loopback::LoopbackConnector;
pub use transport::Transport;
pub use ws_client::WsConnector;

//! 연결 상태 모델.

use serde::{Deserialize, Serialize};

/// 전송 계층 연결 상태. 한 번에 정확히 하나만 활성이다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// 연결 끊김 (초기 상태)
    #[default]
    Disconnected,
    /// 소켓 여는 중
    Connecting,
    /// 연결됨
    Connected,
    /// 백오프 대기 후 재연결 예정
    Reconnecting,
    /// 소켓 생성 실패
    Error,
    /// 서버 정원 초과로 거부됨 (자동 재시도 없음)
    Rejected,
}

impl ConnectionState {
    /// 소문자 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Error => "error",
            ConnectionState::Rejected => "rejected",
        }
    }

    /// 운영자용 표시 문구
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connected => "Connected to TD",
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting...",
            ConnectionState::Reconnecting => "Reconnecting...",
            ConnectionState::Error => "Connection Error",
            ConnectionState::Rejected => "Server Full",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&ConnectionState::Reconnecting).unwrap();
        assert_eq!(json, "\"reconnecting\"");
        assert_eq!(ConnectionState::Rejected.to_string(), "rejected");
    }
}

//! WOB 핵심 에러 타입.
//!
//! 코어에는 치명적 에러 분류가 없다. 모든 실패는 시도한 작업만 종료시키고
//! 진단 콜백으로 보고된 뒤 프로세스는 계속 동작한다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 입력 유효성 검증 실패 (연결 시도 전에 동기적으로 거부)
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 센서/터치 API 미지원
    #[error("기능 미지원: {0}")]
    Capability(String),

    /// 센서 권한 거부
    #[error("권한 거부: {0}")]
    PermissionDenied(String),

    /// 네트워크 에러 (소켓 생성 실패, 비정상 종료, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 프로토콜 에러 (잘못된 프레임, 핸드셰이크 실패)
    #[error("프로토콜 에러: {0}")]
    Protocol(String),

    /// 서버 수용 거부 (정원 초과) — 사용자가 재시도할 때까지 종료 상태
    #[error("서버 수용 거부: {reason}")]
    Rejected {
        /// 서버가 보낸 거부 사유
        reason: String,
    },

    /// 소켓이 열려 있지 않음
    #[error("연결되지 않음")]
    NotConnected,

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 유효성 검증 에러 생성 헬퍼
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 운영자 조치가 필요한 에러인지 (권한/기능/수용 거부)
    pub fn needs_operator(&self) -> bool {
        matches!(
            self,
            Self::Capability(_)
                | Self::PermissionDenied(_)
                | Self::Rejected { .. }
                | Self::Validation { .. }
        )
    }
}

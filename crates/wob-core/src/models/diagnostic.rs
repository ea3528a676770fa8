//! 진단 로그 모델.
//!
//! 운영자에게 보여줄 `(message, level)` 항목.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 진단 레벨
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// 진단 로그 한 줄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    pub message: String,
    pub level: LogLevel,
}

impl LogEntry {
    /// 현재 시각으로 항목 생성
    pub fn now(message: impl Into<String>, level: LogLevel) -> Self {
        Self {
            time: Utc::now(),
            message: message.into(),
            level,
        }
    }

    /// `[HH:MM:SS] message` 형식
    pub fn format_line(&self) -> String {
        format!("[{}] {}", self.time.format("%H:%M:%S"), self.message)
    }
}

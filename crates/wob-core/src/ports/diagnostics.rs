//! 진단 출력 포트.
//!
//! 운영자 가시성을 위한 `(message, level)` 콜백.

use crate::models::diagnostic::LogLevel;

/// 진단 콜백
pub trait DiagnosticSink: Send + Sync {
    /// 진단 메시지 보고
    fn report(&self, message: &str, level: LogLevel);

    fn info(&self, message: &str) {
        self.report(message, LogLevel::Info);
    }

    fn warn(&self, message: &str) {
        self.report(message, LogLevel::Warn);
    }

    fn error(&self, message: &str) {
        self.report(message, LogLevel::Error);
    }
}

/// `tracing`으로만 기록하는 기본 구현
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, message: &str, level: LogLevel) {
        match level {
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warn => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
    }
}

//! 엔드포인트 주소 해석.
//!
//! `host[:port][/path]` 입력에서 스킴을 떼어내고, 호스트 컨텍스트의 보안 여부에 따라
//! `ws://` 또는 `wss://`를 붙인다. 입력에 들어 있던 스킴은 신뢰하지 않는다.

use url::Url;
use wob_core::error::CoreError;

/// 주소를 WebSocket URL로 해석
pub fn resolve_url(address: &str, secure: bool) -> Result<String, CoreError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation("address", "서버 주소를 입력하세요"));
    }

    let bare = match trimmed.find("://") {
        Some(idx) => &trimmed[idx + 3..],
        None => trimmed,
    };
    if bare.is_empty() {
        return Err(CoreError::validation(
            "address",
            format!("호스트가 없는 주소: {trimmed}"),
        ));
    }

    let scheme = if secure { "wss" } else { "ws" };
    let candidate = format!("{scheme}://{bare}");
    let parsed = Url::parse(&candidate).map_err(|e| {
        CoreError::validation("address", format!("잘못된 주소 {trimmed}: {e}"))
    })?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(CoreError::validation(
            "address",
            format!("호스트가 없는 주소: {trimmed}"),
        ));
    }

    Ok(candidate)
}

//! 종료 코드 분류.

/// 종료 코드별 운영자용 힌트
pub fn code_hint(code: u16) -> String {
    match code {
        1006 => "연결 실패 (서버 응답 없음). 가능: 잘못된 IP/포트, 방화벽, 서버 꺼짐".into(),
        1002 => "프로토콜 오류 (서버가 WebSocket을 지원하지 않을 수 있음)".into(),
        1011 => "서버 측 오류".into(),
        1015 => "TLS 오류 (wss:// 관련)".into(),
        other => format!("코드 {other}"),
    }
}

/// 비정상 종료 진단 메시지.
///
/// 서버가 보낸 사유가 있으면 앞에 붙이고, 없으면 URL을 덧붙인다.
pub fn close_message(code: u16, reason: &str, url: &str) -> String {
    let hint = code_hint(code);
    if reason.is_empty() {
        format!("{hint} | URL: {url}")
    } else {
        format!("{reason} | {hint}")
    }
}

/// 소켓 생성 실패 진단 메시지
pub fn open_failure_message(url: &str) -> String {
    format!("연결 거부/타임아웃: {url} - 서버 없음, 방화벽, IP/포트 확인")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_have_hints() {
        assert!(code_hint(1006).starts_with("연결 실패"));
        assert!(code_hint(1015).contains("TLS"));
        assert_eq!(code_hint(4000), "코드 4000");
    }

    #[test]
    fn reason_or_url() {
        assert_eq!(
            close_message(1011, "overloaded", "ws://h:1"),
            "overloaded | 서버 측 오류"
        );
        assert_eq!(close_message(4001, "", "ws://h:1"), "코드 4001 | URL: ws://h:1");
    }
}

//! 운영자 명령 파싱.
//!
//! 표준 입력 한 줄을 [`Command`]로 변환한다.

use std::str::FromStr;

use wob_core::error::CoreError;
use wob_core::models::sensor::SensorKey;

/// 운영자 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 단발 트리거 전송
    Trigger,
    /// 수동 재연결
    Retry,
    /// 새 주소로 연결
    Connect(String),
    /// 연결 해제 및 전체 정지
    Disconnect,
    /// 브로드캐스트 시작/중지 전환
    Broadcast,
    /// 센서 활성화/비활성화 전환
    Sensors,
    /// 센서 그룹 선택 반전
    Toggle(SensorKey),
    /// 상태 요약 출력
    Status,
    /// 최근 진단 로그 출력
    Log,
    /// 명령 목록
    Help,
    /// 종료
    Quit,
}

impl FromStr for Command {
    type Err = CoreError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return Err(CoreError::validation("command", "빈 명령"));
        };
        let arg = parts.next();

        let command = match (head.to_ascii_lowercase().as_str(), arg) {
            ("trigger" | "t", None) => Command::Trigger,
            ("retry" | "r", None) => Command::Retry,
            ("connect", Some(address)) => Command::Connect(address.to_string()),
            ("connect", None) => {
                return Err(CoreError::validation("command", "connect <주소> 형식이어야 합니다"))
            }
            ("disconnect", None) => Command::Disconnect,
            ("broadcast" | "b", None) => Command::Broadcast,
            ("sensors" | "s", None) => Command::Sensors,
            ("toggle", Some(key)) => Command::Toggle(key.parse()?),
            ("toggle", None) => {
                return Err(CoreError::validation(
                    "command",
                    "toggle <motion|orientation|geolocation|touch> 형식이어야 합니다",
                ))
            }
            ("status", None) => Command::Status,
            ("log", None) => Command::Log,
            ("help" | "?", None) => Command::Help,
            ("quit" | "exit" | "q", None) => Command::Quit,
            (other, _) => {
                return Err(CoreError::validation(
                    "command",
                    format!("알 수 없는 명령: {other}"),
                ))
            }
        };

        if parts.next().is_some() {
            return Err(CoreError::validation("command", "인자가 너무 많습니다"));
        }
        Ok(command)
    }
}

/// 도움말 텍스트
pub const HELP: &str = "\
명령:
  trigger            트리거 전송
  retry              재연결
  connect <주소>     새 주소로 연결
  disconnect         연결 해제
  broadcast          브로드캐스트 시작/중지
  sensors            센서 활성화/비활성화
  toggle <센서>      motion | orientation | geolocation | touch
  status             상태 요약
  log                최근 로그
  quit               종료";

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_simple_commands() {
        assert_eq!("trigger".parse::<Command>().unwrap(), Command::Trigger);
        assert_eq!("  RETRY ".parse::<Command>().unwrap(), Command::Retry);
        assert_eq!("b".parse::<Command>().unwrap(), Command::Broadcast);
        assert_eq!("quit".parse::<Command>().unwrap(), Command::Quit);
        assert_eq!("log".parse::<Command>().unwrap(), Command::Log);
    }

    #[test]
    fn parses_arguments() {
        assert_eq!(
            "toggle geolocation".parse::<Command>().unwrap(),
            Command::Toggle(SensorKey::Geolocation)
        );
        assert_eq!(
            "connect 192.168.1.5:9980".parse::<Command>().unwrap(),
            Command::Connect("192.168.1.5:9980".into())
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_matches!("".parse::<Command>(), Err(CoreError::Validation { .. }));
        assert_matches!("toggle".parse::<Command>(), Err(CoreError::Validation { .. }));
        assert!("toggle compass".parse::<Command>().is_err());
        assert!("trigger now".parse::<Command>().is_err());
        assert!("jump".parse::<Command>().is_err());
    }
}

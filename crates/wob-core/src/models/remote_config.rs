//! 원격 엔진이 푸시하는 설정.
//!
//! 모든 필드는 독립적으로 선택적이며, 존재하는 필드만 적용한다.
//! 값은 숫자 또는 숫자 문자열(`"30"`)로 올 수 있다.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::sensor::SensorKey;

/// 원격 설정 (`{type:"config", ...}`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// 전송 주기 (Hz). 0 이하 값은 없는 것으로 취급.
    #[serde(default, deserialize_with = "de_rate", skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    /// 화면 꺼짐 방지
    #[serde(default, deserialize_with = "de_flag", skip_serializing_if = "Option::is_none")]
    pub wake_lock: Option<bool>,
    /// 햅틱 피드백
    #[serde(default, deserialize_with = "de_flag", skip_serializing_if = "Option::is_none")]
    pub haptic: Option<bool>,
    #[serde(default, deserialize_with = "de_flag", skip_serializing_if = "Option::is_none")]
    pub sensor_motion: Option<bool>,
    #[serde(default, deserialize_with = "de_flag", skip_serializing_if = "Option::is_none")]
    pub sensor_orientation: Option<bool>,
    #[serde(default, deserialize_with = "de_flag", skip_serializing_if = "Option::is_none")]
    pub sensor_geolocation: Option<bool>,
    #[serde(default, deserialize_with = "de_flag", skip_serializing_if = "Option::is_none")]
    pub sensor_touch: Option<bool>,
    /// 전체 UI(1) / 최소 UI(0) — UI 협력자가 읽는다
    #[serde(default, deserialize_with = "de_flag", skip_serializing_if = "Option::is_none")]
    pub dev_mode: Option<bool>,
}

impl RemoteConfig {
    /// 존재하는 센서 선택 플래그 목록
    pub fn sensor_flags(&self) -> Vec<(SensorKey, bool)> {
        [
            (SensorKey::Motion, self.sensor_motion),
            (SensorKey::Orientation, self.sensor_orientation),
            (SensorKey::Geolocation, self.sensor_geolocation),
            (SensorKey::Touch, self.sensor_touch),
        ]
        .into_iter()
        .filter_map(|(key, flag)| flag.map(|v| (key, v)))
        .collect()
    }

    /// 적용할 필드가 하나도 없는지
    pub fn is_empty(&self) -> bool {
        *self == RemoteConfig::default()
    }
}

/// JSON 값을 정수로 해석한다.
///
/// 문자열은 앞쪽 정수 부분만 읽는다 (`"30Hz"` → 30). 해석할 수 없으면 `None`.
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_leading_int(s),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first()? {
        b'-' => (-1, &s[1..]),
        b'+' => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn de_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_int).map(|n| n != 0))
}

fn de_rate<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(parse_int)
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stringified_and_numeric_values() {
        let cfg: RemoteConfig = serde_json::from_str(
            r#"{"sample_rate":"60","wake_lock":0,"haptic":"1","sensor_geolocation":1}"#,
        )
        .unwrap();
        assert_eq!(cfg.sample_rate, Some(60));
        assert_eq!(cfg.wake_lock, Some(false));
        assert_eq!(cfg.haptic, Some(true));
        assert_eq!(cfg.sensor_geolocation, Some(true));
        assert_eq!(cfg.sensor_motion, None);
        assert_eq!(cfg.dev_mode, None);
    }

    #[test]
    fn non_positive_or_garbage_rate_is_absent() {
        let cfg: RemoteConfig = serde_json::from_str(r#"{"sample_rate":"0"}"#).unwrap();
        assert_eq!(cfg.sample_rate, None);
        let cfg: RemoteConfig = serde_json::from_str(r#"{"sample_rate":"fast"}"#).unwrap();
        assert_eq!(cfg.sample_rate, None);
        let cfg: RemoteConfig = serde_json::from_str(r#"{"sample_rate":-5}"#).unwrap();
        assert_eq!(cfg.sample_rate, None);
        assert!(cfg.is_empty());
    }

    #[test]
    fn null_fields_are_absent() {
        let cfg: RemoteConfig = serde_json::from_str(r#"{"haptic":null}"#).unwrap();
        assert_eq!(cfg.haptic, None);
    }

    #[test]
    fn parse_int_mirrors_leading_digits() {
        assert_eq!(parse_int(&Value::from("30Hz")), Some(30));
        assert_eq!(parse_int(&Value::from(" -2")), Some(-2));
        assert_eq!(parse_int(&Value::from(12.9)), Some(12));
        assert_eq!(parse_int(&Value::from("")), None);
        assert_eq!(parse_int(&Value::Null), None);
    }

    #[test]
    fn sensor_flags_only_present_fields() {
        let cfg = RemoteConfig {
            sensor_touch: Some(false),
            sensor_motion: Some(true),
            ..Default::default()
        };
        assert_eq!(
            cfg.sensor_flags(),
            vec![(SensorKey::Motion, true), (SensorKey::Touch, false)]
        );
    }
}

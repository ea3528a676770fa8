//! 와이어 프로토콜.
//!
//! 한 번 전송에 JSON 텍스트 프레임 하나, 형태는 `{type: string, ...fields}`.
//! 수신 측(TouchDesigner)이 파싱하기 쉽도록 평탄화된 필드를 사용한다.

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::models::remote_config::RemoteConfig;
use crate::models::sensor::SensorReading;
use crate::models::touch::TouchSnapshot;

/// 송신 메시지
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// 연결 직후 한 번
    Hello,
    /// 평탄화된 센서 판독값. 없는 그룹은 필드 자체를 생략
    Sensor(SensorReading),
    /// 평탄화된 터치 스냅샷
    Touch(TouchSnapshot),
    /// 필드 없는 단발 이벤트
    Trigger,
}

impl OutboundMessage {
    /// `type` 필드 값
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Hello => "hello",
            OutboundMessage::Sensor(_) => "sensor",
            OutboundMessage::Touch(_) => "touch",
            OutboundMessage::Trigger => "trigger",
        }
    }

    /// JSON 객체로 평탄화
    pub fn to_frame(&self) -> Map<String, Value> {
        let mut msg = Map::new();
        msg.insert("type".into(), Value::from(self.kind()));

        match self {
            OutboundMessage::Hello | OutboundMessage::Trigger => {}
            OutboundMessage::Sensor(reading) => {
                if let Some(a) = reading.accel {
                    msg.insert("ax".into(), Value::from(a.x));
                    msg.insert("ay".into(), Value::from(a.y));
                    msg.insert("az".into(), Value::from(a.z));
                }
                if let Some(g) = reading.gyro {
                    msg.insert("ga".into(), Value::from(g.alpha));
                    msg.insert("gb".into(), Value::from(g.beta));
                    msg.insert("gg".into(), Value::from(g.gamma));
                }
                if let Some(o) = reading.orient {
                    msg.insert("oa".into(), Value::from(o.alpha));
                    msg.insert("ob".into(), Value::from(o.beta));
                    msg.insert("og".into(), Value::from(o.gamma));
                }
                if let Some(geo) = reading.geo {
                    msg.insert("lat".into(), Value::from(geo.lat));
                    msg.insert("lon".into(), Value::from(geo.lon));
                }
            }
            OutboundMessage::Touch(snapshot) => {
                msg.insert("count".into(), Value::from(snapshot.count));
                // 인덱스는 스냅샷 내 위치 기준이며 영속 id가 아니다.
                for (idx, t) in snapshot.touches.iter().enumerate() {
                    msg.insert(format!("t{idx}x"), Value::from(t.x));
                    msg.insert(format!("t{idx}y"), Value::from(t.y));
                    msg.insert(format!("t{idx}s"), Value::from(t.state.as_wire()));
                }
            }
        }
        msg
    }

    /// JSON 텍스트로 인코딩
    pub fn encode(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(&self.to_frame())?)
    }
}

/// 수신 제어 메시지
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// 수용 확인 + 슬롯 할당
    Ack { slot: Option<String> },
    /// 원격 설정 (그대로 전달)
    Config(RemoteConfig),
    /// 정원 초과 거부
    Rejected { reason: Option<String> },
}

impl InboundMessage {
    /// 텍스트 프레임 디코딩. 알 수 없는 타입이나 잘못된 JSON은 `None`.
    pub fn decode(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;
        let kind = value.get("type")?.as_str()?;
        match kind {
            "ack" => Some(InboundMessage::Ack {
                slot: value.get("slot").and_then(opaque_string),
            }),
            "config" => serde_json::from_value::<RemoteConfig>(value)
                .ok()
                .map(InboundMessage::Config),
            "rejected" => Some(InboundMessage::Rejected {
                reason: value.get("reason").and_then(opaque_string),
            }),
            _ => None,
        }
    }
}

fn opaque_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

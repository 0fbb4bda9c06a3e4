use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════
//  Message
// ═══════════════════════════════════════════════════════════════

/// Одно принятое сообщение. Immutable после конструирования.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Иерархический topic key (e.g., "home/kitchen/temp").
    pub topic: String,
    /// Структурированный payload (произвольный JSON).
    pub data: serde_json::Value,
    /// Время приёма (local wall-clock), назначается на ingest.
    #[serde(rename = "timestamp", with = "timestamp_format")]
    pub received_at: DateTime<Local>,
}

impl Message {
    pub fn new(topic: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            topic: topic.into(),
            data,
            received_at: Local::now(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Timestamp layout: "YYYY-MM-DD HH:MM:SS"
// ═══════════════════════════════════════════════════════════════

/// Serde adapter для фиксированного текстового layout'а timestamp'ов
/// в snapshot файле и HTTP ответах. Local time, second precision.
pub(crate) mod timestamp_format {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&dt.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Local>, D::Error> {
        let s = String::deserialize(d)?;
        let naive = NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)?;
        // DST fold: earliest candidate is good enough at second precision.
        Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid local time: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_fixed_timestamp_layout() {
        let msg = Message::new("home/kitchen/temp", json!({"t": 21.5}));
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["topic"], "home/kitchen/temp");
        assert_eq!(v["data"], json!({"t": 21.5}));

        let ts = v["timestamp"].as_str().unwrap();
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[7..8], "-");
        assert_eq!(&ts[10..11], " ");
        assert_eq!(&ts[13..14], ":");
        assert_eq!(&ts[16..17], ":");
    }

    #[test]
    fn timestamp_round_trips_at_second_precision() {
        let msg = Message::new("a/b", json!(1));
        let encoded = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&encoded).unwrap();
        assert_eq!(back.topic, msg.topic);
        assert_eq!(back.data, msg.data);
        assert_eq!(back.received_at.timestamp(), msg.received_at.timestamp());
    }

    #[test]
    fn bad_timestamp_is_a_parse_error() {
        let raw = r#"{"topic":"a","data":1,"timestamp":"not a time"}"#;
        assert!(serde_json::from_str::<Message>(raw).is_err());
    }
}

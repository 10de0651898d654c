// ABOUTME: Civil-time handling for the deployment's fixed UTC+7 time zone
// ABOUTME: All persisted timestamps are naive local wall-clock values

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The deployment runs in a single civil time zone, UTC+7. Timestamps are
/// stored without an offset.
const UTC_OFFSET_SECS: i32 = 7 * 3600;

pub fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(UTC_OFFSET_SECS).expect("offset is in range")
}

/// Current wall-clock time in the deployment time zone, offset stripped.
pub fn now_local() -> NaiveDateTime {
    Utc::now().with_timezone(&local_offset()).naive_local()
}

/// Parses a client-supplied datetime string. Offset-aware values are
/// converted to the deployment time zone before the offset is stripped;
/// naive values are taken as local wall-clock time as-is.
pub fn parse_client_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&local_offset()).naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|_| format!("invalid datetime: {raw}"))
}

/// A datetime received from a client, already normalized to local civil
/// time. Serializes back out as a naive ISO 8601 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LocalTimestamp(pub NaiveDateTime);

impl From<LocalTimestamp> for NaiveDateTime {
    fn from(value: LocalTimestamp) -> Self {
        value.0
    }
}

impl Serialize for LocalTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LocalTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_client_datetime(&raw)
            .map(LocalTimestamp)
            .map_err(serde::de::Error::custom)
    }
}

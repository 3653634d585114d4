//! Timestamp deserialization for AWS CLI responses.
//!
//! The CLI emits ISO 8601 strings by default, but epoch-seconds floats under
//! older `cli_timestamp_format` settings. Both shapes decode here.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;

use pipewatch_core::types::Timestamp;

/// Deserialize an optional AWS timestamp from either an RFC 3339 string or
/// a fractional epoch-seconds number.
pub(crate) fn deserialize_aws_time<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Epoch(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Epoch(secs)) => {
            let nanos = (secs.fract().abs() * 1e9) as u32;
            DateTime::from_timestamp(secs.trunc() as i64, nanos)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("epoch out of range: {secs}")))
        }
        Some(Raw::Text(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| de::Error::custom(format!("invalid timestamp {s:?}: {e}"))),
    }
}

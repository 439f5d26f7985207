//! Decoding of the string-encoded scalars in ESS payloads

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(u64),
    Float(f64),
    Bool(bool),
    Str(String),
}

pub fn int<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Int(v) => Ok(v),
        Scalar::Str(s) if s.is_empty() => Ok(0),
        Scalar::Str(s) => s.parse().map_err(de::Error::custom),
        _ => Err(de::Error::custom("expected an integer")),
    }
}

pub fn float<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Int(v) => Ok(v as f64),
        Scalar::Float(v) => Ok(v),
        Scalar::Str(s) => s.parse().map_err(de::Error::custom),
        Scalar::Bool(_) => Err(de::Error::custom("expected a number")),
    }
}

pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Bool(v) => Ok(v),
        Scalar::Int(v) => Ok(v != 0),
        Scalar::Str(s) => match s.as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" | "" => Ok(false),
            other => Err(de::Error::custom(format!("invalid flag: {}", other))),
        },
        Scalar::Float(_) => Err(de::Error::custom("expected a flag")),
    }
}

/// Unix timestamp in seconds
pub fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = int(deserializer)?;
    let secs = i64::try_from(secs).map_err(de::Error::custom)?;
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| de::Error::custom("timestamp out of range"))
}

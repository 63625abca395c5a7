//! Lenient deserializers for fields the backend sends as either a JSON
//! number or a numeric string.

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(i64),
    Float(f64),
    Str(String),
}

pub fn f64_from_number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(n) => Ok(n as f64),
        NumberOrString::Float(n) => Ok(n),
        NumberOrString::Str(s) if s.trim().is_empty() => Ok(0.0),
        NumberOrString::Str(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

pub fn i64_from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(n) => Ok(n),
        NumberOrString::Float(n) if n.fract() == 0.0 => Ok(n as i64),
        NumberOrString::Float(n) => Err(de::Error::custom(format!("expected integer, got {n}"))),
        NumberOrString::Str(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

/// Treat `null` like an empty list. Go encodes nil slices as `null`.
pub fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

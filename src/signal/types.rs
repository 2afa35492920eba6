// src/signal/types.rs
//! Core row types for neuromonitoring recordings

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Opaque surgery identifier.
///
/// Recordings in the wild carry either numeric or string ids; both are kept in
/// their string form so equality is exact and independent of the source type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurgeryId(String);

impl SurgeryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurgeryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SurgeryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SurgeryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Serialize for SurgeryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SurgeryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SurgeryIdVisitor;

        impl<'de> Visitor<'de> for SurgeryIdVisitor {
            type Value = SurgeryId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a surgery id string or integral number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<SurgeryId, E> {
                Ok(SurgeryId::new(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<SurgeryId, E> {
                Ok(SurgeryId(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<SurgeryId, E> {
                Ok(SurgeryId(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<SurgeryId, E> {
                Ok(SurgeryId(v.to_string()))
            }

            // Integer columns holding NaN are written out as floats (17.0).
            fn visit_f64<E: de::Error>(self, v: f64) -> Result<SurgeryId, E> {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 2f64.powi(53) {
                    Ok(SurgeryId((v as i64).to_string()))
                } else {
                    Err(E::invalid_value(de::Unexpected::Float(v), &self))
                }
            }
        }

        deserializer.deserialize_any(SurgeryIdVisitor)
    }
}

/// Recording instant within a surgery.
///
/// Totally ordered through [`f64::total_cmp`] so it can key ordered maps.
/// `-0.0` and `0.0` are the same instant.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct Timestamp(pub f64);

impl Timestamp {
    pub fn new(value: f64) -> Self {
        Self(unsigned_zero(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    fn key(self) -> f64 {
        unsigned_zero(self.0)
    }
}

fn unsigned_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Timestamp::new)
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().total_cmp(&other.key())
    }
}

impl std::hash::Hash for Timestamp {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().to_bits().hash(state);
    }
}

impl From<f64> for Timestamp {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Self::new(value as f64)
    }
}

impl From<i32> for Timestamp {
    fn from(value: i32) -> Self {
        Self::new(f64::from(value))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Limb region of an SSEP row, set when upper and lower tables are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Upper,
    Lower,
}

impl Region {
    pub fn label(self) -> &'static str {
        match self {
            Region::Upper => "Upper",
            Region::Lower => "Lower",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<f64>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One measurement event: a waveform for a (surgery, timestamp, channel)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub surgery_id: SurgeryId,
    pub timestamp: Timestamp,
    pub channel: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub values: Vec<f64>,
    #[serde(default)]
    pub stimulus: serde_json::Value,
    pub signal_rate: f64,
    #[serde(default)]
    pub baseline_timestamp: Option<Timestamp>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub baseline_values: Vec<f64>,
    #[serde(default)]
    pub baseline_stimulus: serde_json::Value,
    #[serde(default)]
    pub baseline_signal_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

impl SignalRow {
    /// Minimal row with empty baseline, mostly for callers building tables by hand
    pub fn new(
        surgery_id: impl Into<SurgeryId>,
        timestamp: impl Into<Timestamp>,
        channel: impl Into<String>,
        values: Vec<f64>,
        signal_rate: f64,
    ) -> Self {
        Self {
            surgery_id: surgery_id.into(),
            timestamp: timestamp.into(),
            channel: channel.into(),
            values,
            stimulus: serde_json::Value::Null,
            signal_rate,
            baseline_timestamp: None,
            baseline_values: Vec::new(),
            baseline_stimulus: serde_json::Value::Null,
            baseline_signal_rate: None,
            region: None,
        }
    }

    pub fn with_baseline(mut self, baseline_values: Vec<f64>, baseline_signal_rate: Option<f64>) -> Self {
        self.baseline_values = baseline_values;
        self.baseline_signal_rate = baseline_signal_rate;
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Sampling rate of the baseline, falling back to the signal rate
    pub fn effective_baseline_rate(&self) -> f64 {
        self.baseline_signal_rate.unwrap_or(self.signal_rate)
    }
}

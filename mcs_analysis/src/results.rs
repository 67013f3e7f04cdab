use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::AnalysisError;

/// Outcome of one simulated race, as produced by the race simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub driverinfo: DriverInfo,
}

/// Per-driver results keyed by initials, in the order the simulation wrote
/// them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverInfo(Vec<(String, DriverResult)>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverResult {
    /// Race position at the end of every lap; the last entry is the final
    /// classification.
    #[serde(deserialize_with = "ranks")]
    pub positions: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    /// One entry per stint: `[in_lap, compound, tire_age, ...]`.
    #[serde(default)]
    pub strategy_info: Vec<Vec<Value>>,
}

impl DriverResult {
    pub fn final_position(&self) -> Option<u32> {
        self.positions.last().copied()
    }
}

impl DriverInfo {
    pub fn new(entries: Vec<(String, DriverResult)>) -> Self {
        Self(entries)
    }

    pub fn get(&self, initials: &str) -> Option<&DriverResult> {
        self.0
            .iter()
            .find(|(name, _)| name == initials)
            .map(|(_, result)| result)
    }

    pub fn initials(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DriverResult)> {
        self.0.iter().map(|(name, result)| (name.as_str(), result))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for DriverInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (initials, result) in &self.0 {
            map.serialize_entry(initials, result)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DriverInfo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedDrivers;

        impl<'de> Visitor<'de> for OrderedDrivers {
            type Value = DriverInfo;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of driver initials to driver results")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<DriverInfo, A::Error> {
                let mut entries: Vec<(String, DriverResult)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((initials, result)) = map.next_entry::<String, DriverResult>()? {
                    if entries.iter().any(|(name, _)| *name == initials) {
                        return Err(de::Error::custom(format!("duplicate driver {}", initials)));
                    }
                    entries.push((initials, result));
                }
                Ok(DriverInfo(entries))
            }
        }

        deserializer.deserialize_map(OrderedDrivers)
    }
}

// The simulation stores positions in float arrays, so 3.0 is a valid rank.
fn ranks<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u32>, D::Error> {
    Vec::<f64>::deserialize(deserializer)?
        .into_iter()
        .map(|p| {
            if p.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&p) {
                Ok(p as u32)
            } else {
                Err(de::Error::custom(format!("position {} is not a rank", p)))
            }
        })
        .collect()
}

/// Checks that `value` is a non-empty list of records that each carry a
/// `driverinfo` mapping, then decodes them.
pub fn parse_results(value: &Value) -> Result<Vec<RaceResult>, AnalysisError> {
    let records = value.as_array().ok_or_else(|| {
        AnalysisError::InvalidShape("expected a list of race results".to_string())
    })?;
    if records.is_empty() {
        return Err(AnalysisError::NoRuns);
    }

    records
        .iter()
        .enumerate()
        .map(|(run, record)| {
            if !record.get("driverinfo").map_or(false, Value::is_object) {
                return Err(AnalysisError::InvalidShape(format!(
                    "race result {} has no driverinfo mapping",
                    run
                )));
            }
            RaceResult::deserialize(record)
                .map_err(|e| AnalysisError::InvalidShape(format!("race result {}: {}", run, e)))
        })
        .collect()
}

/// Reads a JSON file holding a list of race results.
pub fn load_results(path: &Path) -> Result<Vec<RaceResult>, AnalysisError> {
    let text = fs::read_to_string(path).map_err(|source| AnalysisError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| AnalysisError::InvalidShape(format!("{}: {}", path.display(), e)))?;
    parse_results(&value)
}

use std::collections::BTreeMap;

use crate::error::ParsError;

/// Name of the fallback row every driver-keyed cross-season table carries.
pub const UNKNOWN_DRIVER: &str = "unknown";

/// A table whose every lookup is mandatory: a missing key is fatal.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonTable<T> {
    name: &'static str,
    entries: BTreeMap<String, T>,
}

impl<T: Clone> SeasonTable<T> {
    pub fn new(name: &'static str, entries: BTreeMap<String, T>) -> Self {
        Self { name, entries }
    }

    pub fn lookup(&self, key: &str) -> Result<T, ParsError> {
        self.entries.get(key).cloned().ok_or_else(|| ParsError::Lookup {
            table: self.name,
            key: key.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A driver-keyed table with a checked default row: drivers without their
/// own entry get the `"unknown"` one.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverTable<T> {
    name: &'static str,
    drivers: BTreeMap<String, T>,
    unknown: T,
}

impl<T: Clone> DriverTable<T> {
    pub fn new(name: &'static str, mut entries: BTreeMap<String, T>) -> Result<Self, ParsError> {
        let unknown = entries
            .remove(UNKNOWN_DRIVER)
            .ok_or(ParsError::MissingFallback { table: name })?;
        Ok(Self {
            name,
            drivers: entries,
            unknown,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn lookup(&self, driver: &str) -> T {
        self.drivers.get(driver).unwrap_or(&self.unknown).clone()
    }

    pub fn contains(&self, driver: &str) -> bool {
        self.drivers.contains_key(driver)
    }
}

//! Typed shapes of the parameter sections.
//!
//! Every struct keeps the keys it does not interpret in a flattened `extra`
//! map, so the simulation engine still receives them after validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub type Extra = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RacePars {
    pub season: u32,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Open-ended Monte Carlo settings; the FCY phase probabilities of the MCS
/// file are merged into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonteCarloPars(pub Extra);

impl MonteCarloPars {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTrackPars {
    pub name: String,
    #[serde(default)]
    pub t_gap_overtake_vel: Option<f64>,
    #[serde(default)]
    pub t_drseffect: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPars {
    pub name: String,
    pub t_gap_overtake_vel: f64,
    pub t_drseffect: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawCarPars {
    #[serde(flatten)]
    pub extra: Extra,
}

/// Parameters of one team's car, enriched with the season's reliability data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarPars {
    pub p_failure: f64,
    /// Shape, location and scale of the Fisk distribution of pit stop
    /// durations.
    pub t_pit_var_fisk_pars: Vec<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawDriverPars {
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverPars {
    pub name: String,
    pub p_accident: f64,
    pub t_lap_var_sigma: f64,
    /// Start performance model; its inner shape is the engine's concern.
    pub t_startperf: Value,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawEventPars {
    pub fcy_data: RawFcyData,
    pub retire_data: RawRetireData,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawFcyData {
    pub phases: Vec<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRetireData {
    pub retirements: Vec<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One full-course-yellow phase, `[start, ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FcyPhase(pub Vec<Value>);

impl FcyPhase {
    pub fn start(&self) -> Option<f64> {
        self.0.first().and_then(Value::as_f64)
    }
}

/// One retirement, `[driver, lap_or_time, ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Retirement(pub Vec<Value>);

impl Retirement {
    pub fn at(&self) -> Option<f64> {
        self.0.get(1).and_then(Value::as_f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPars {
    pub fcy_data: FcyData,
    pub retire_data: RetireData,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcyData {
    pub phases: Vec<FcyPhase>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetireData {
    pub retirements: Vec<Retirement>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VsePars {
    /// Strategy role -> VSE variant name ("supervised", "reinforcement", ...).
    #[serde(default)]
    pub vse_type: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// The validated, merged parameter set handed to the simulation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterBundle {
    pub race_pars: RacePars,
    pub monte_carlo_pars: MonteCarloPars,
    pub track_pars: TrackPars,
    pub car_pars: BTreeMap<String, CarPars>,
    pub tireset_pars: Extra,
    pub driver_pars: BTreeMap<String, DriverPars>,
    pub event_pars: EventPars,
    pub vse_pars: VsePars,
}

impl ParameterBundle {
    pub fn season(&self) -> u32 {
        self.race_pars.season
    }
}

use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::ParsError;
use crate::schema::{
    CarPars, DriverPars, EventPars, Extra, FcyData, FcyPhase, MonteCarloPars, ParameterBundle,
    RawCarPars, RawDriverPars, RawEventPars, RawTrackPars, RetireData, Retirement, TrackPars,
};
use crate::sources::{McsSource, RaceSource};

pub const DEFAULT_T_GAP_OVERTAKE_VEL: f64 = 0.0;
pub const DEFAULT_T_DRSEFFECT: f64 = -0.1;

const DRIVER_SEASON_KEYS: &[&str] = &["p_accident", "t_lap_var_sigma", "t_startperf"];
const CAR_SEASON_KEYS: &[&str] = &["p_failure", "t_pit_var_fisk_pars"];

/// A tolerated omission that was filled in with its default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Defaulted {
    pub parameter: &'static str,
    pub value: f64,
}

/// A validated bundle plus the optional parameters that were defaulted on
/// the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub bundle: ParameterBundle,
    pub defaulted: Vec<Defaulted>,
}

/// Combines the race and MCS sources into one validated bundle.
///
/// Event lists are checked before anything season-dependent is touched, so a
/// malformed event list never yields a partially merged bundle.
pub fn merge(race: RaceSource, mcs: McsSource) -> Result<Merged, ParsError> {
    let (track_pars, defaulted) = apply_track_defaults(race.track_pars);
    let event_pars = validate_events(race.event_pars)?;
    let driver_pars = enrich_drivers(race.driver_pars, &mcs)?;
    let car_pars = enrich_cars(race.car_pars, &mcs)?;
    let monte_carlo_pars = merge_fcy_phases(race.monte_carlo_pars, mcs.p_fcy_phases);

    let bundle = ParameterBundle {
        race_pars: race.race_pars,
        monte_carlo_pars,
        track_pars,
        car_pars,
        tireset_pars: race.tireset_pars,
        driver_pars,
        event_pars,
        vse_pars: race.vse_pars,
    };
    Ok(Merged { bundle, defaulted })
}

/// Fills the two optional track parameters, warning for each substitution.
pub fn apply_track_defaults(raw: RawTrackPars) -> (TrackPars, Vec<Defaulted>) {
    let mut defaulted = Vec::new();
    let mut or_default = |value: Option<f64>, parameter: &'static str, default: f64| {
        value.unwrap_or_else(|| {
            warn!(parameter, value = default, "parameter is None, continuing with default");
            defaulted.push(Defaulted {
                parameter,
                value: default,
            });
            default
        })
    };

    let t_gap_overtake_vel = or_default(
        raw.t_gap_overtake_vel,
        "t_gap_overtake_vel",
        DEFAULT_T_GAP_OVERTAKE_VEL,
    );
    let t_drseffect = or_default(raw.t_drseffect, "t_drseffect", DEFAULT_T_DRSEFFECT);

    let track = TrackPars {
        name: raw.name,
        t_gap_overtake_vel,
        t_drseffect,
        extra: raw.extra,
    };
    (track, defaulted)
}

/// Rejects non-list event entries and sorts FCY phases by start and
/// retirements by their lap/time field.
pub fn validate_events(raw: RawEventPars) -> Result<EventPars, ParsError> {
    let phases = sorted_rows("FCY phases", raw.fcy_data.phases, 0)?;
    let retirements = sorted_rows("Retirement data", raw.retire_data.retirements, 1)?;

    Ok(EventPars {
        fcy_data: FcyData {
            phases: phases.into_iter().map(FcyPhase).collect(),
            extra: raw.fcy_data.extra,
        },
        retire_data: RetireData {
            retirements: retirements.into_iter().map(Retirement).collect(),
            extra: raw.retire_data.extra,
        },
        extra: raw.extra,
    })
}

fn sorted_rows(
    list: &'static str,
    raw: Vec<Value>,
    key_index: usize,
) -> Result<Vec<Vec<Value>>, ParsError> {
    let rows = raw
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Array(row) => Ok(row),
            other => Err(ParsError::MalformedEvents {
                list,
                index,
                reason: format!("expected a list, got {}", json_kind(&other)),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut keyed = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let key = row
            .get(key_index)
            .and_then(Value::as_f64)
            .ok_or_else(|| ParsError::MalformedEvents {
                list,
                index,
                reason: format!("element {} must be a number", key_index),
            })?;
        keyed.push((key, row));
    }

    // sort_by is stable, equal keys (0.0 and -0.0 included) keep their file order
    keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

fn strip(mut extra: Extra, keys: &[&str]) -> Extra {
    for key in keys {
        extra.remove(*key);
    }
    extra
}

fn enrich_drivers(
    raw: BTreeMap<String, RawDriverPars>,
    mcs: &McsSource,
) -> Result<BTreeMap<String, DriverPars>, ParsError> {
    raw.into_iter()
        .map(|(initials, driver)| {
            let p_accident = mcs.p_accident.lookup(&driver.name)?;
            if !mcs.t_lap_var_sigma.contains(&driver.name) {
                debug!(driver = %driver.name, table = mcs.t_lap_var_sigma.name(), "using \"unknown\" driver entry");
            }
            if !mcs.t_startperf.contains(&driver.name) {
                debug!(driver = %driver.name, table = mcs.t_startperf.name(), "using \"unknown\" driver entry");
            }
            let t_lap_var_sigma = mcs.t_lap_var_sigma.lookup(&driver.name);
            let t_startperf = mcs.t_startperf.lookup(&driver.name);

            let pars = DriverPars {
                name: driver.name,
                p_accident,
                t_lap_var_sigma,
                t_startperf,
                extra: strip(driver.extra, DRIVER_SEASON_KEYS),
            };
            Ok((initials, pars))
        })
        .collect()
}

fn enrich_cars(
    raw: BTreeMap<String, RawCarPars>,
    mcs: &McsSource,
) -> Result<BTreeMap<String, CarPars>, ParsError> {
    raw.into_iter()
        .map(|(team, car)| {
            let pars = CarPars {
                p_failure: mcs.p_failure.lookup(&team)?,
                t_pit_var_fisk_pars: mcs.t_pit_var_fisk_pars.lookup(&team)?,
                extra: strip(car.extra, CAR_SEASON_KEYS),
            };
            Ok((team, pars))
        })
        .collect()
}

/// Every FCY phase probability is copied into the Monte Carlo settings,
/// overwriting keys that already exist there.
fn merge_fcy_phases(mut pars: MonteCarloPars, p_fcy_phases: Extra) -> MonteCarloPars {
    for (key, value) in p_fcy_phases {
        pars.0.insert(key, value);
    }
    pars
}

//! Lap-by-lap views of a single simulated race: tire stints and position
//! traces up to a given lap, as used for race replays.

use serde::Serialize;
use serde_json::Value;

use crate::error::AnalysisError;
use crate::results::{DriverResult, RaceResult};

/// Simulation compound code -> Pirelli compound name.
pub fn compound_name(code: &str) -> Option<&'static str> {
    match code {
        "A6" => Some("SOFT"),
        "A4" => Some("MEDIUM"),
        "A3" => Some("HARD"),
        _ => None,
    }
}

/// Team name as used by the colour tables of the plotting side.
pub fn team_key(team: &str) -> &str {
    match team {
        "ToroRosso" => "alphatauri",
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StintRow {
    pub driver: String,
    /// 1-based stint number.
    pub stint: usize,
    pub compound: Option<&'static str>,
    pub stint_length: u32,
    pub in_lap: u32,
    pub out_lap: u32,
}

fn driver<'a>(result: &'a RaceResult, initials: &str) -> Result<&'a DriverResult, AnalysisError> {
    result
        .driverinfo
        .get(initials)
        .ok_or_else(|| AnalysisError::UnknownDriver {
            initials: initials.to_string(),
        })
}

fn in_lap(stint: &[Value], initials: &str, idx: usize) -> Result<u32, AnalysisError> {
    stint
        .first()
        .and_then(Value::as_f64)
        .filter(|lap| lap.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(lap))
        .map(|lap| lap as u32)
        .ok_or_else(|| AnalysisError::MalformedStint {
            initials: initials.to_string(),
            stint: idx + 1,
        })
}

/// Stints of `drivers` as far as they were driven by the end of `at_lap`.
/// Stints that start after `at_lap` are left out, the running one is cut
/// at `at_lap`.
pub fn stints_at_lap(
    result: &RaceResult,
    drivers: &[&str],
    at_lap: u32,
    n_laps: u32,
) -> Result<Vec<StintRow>, AnalysisError> {
    let mut rows = Vec::new();
    for &initials in drivers {
        let info = driver(result, initials)?;
        for (idx, stint) in info.strategy_info.iter().enumerate() {
            let start = in_lap(stint, initials, idx)?;
            let mut out_lap = match info.strategy_info.get(idx + 1) {
                Some(next) => in_lap(next, initials, idx + 1)?,
                None => n_laps.saturating_add(1),
            };
            if start > at_lap {
                continue;
            }
            out_lap = out_lap.min(at_lap);
            rows.push(StintRow {
                driver: initials.to_string(),
                stint: idx + 1,
                compound: stint.get(1).and_then(Value::as_str).and_then(compound_name),
                stint_length: out_lap.saturating_sub(start),
                in_lap: start,
                out_lap,
            });
        }
    }
    Ok(rows)
}

/// Positions of `initials` for the first `at_lap` entries of the race.
pub fn position_trace<'a>(
    result: &'a RaceResult,
    initials: &str,
    at_lap: usize,
) -> Result<&'a [u32], AnalysisError> {
    let positions = &driver(result, initials)?.positions;
    Ok(&positions[..at_lap.min(positions.len())])
}

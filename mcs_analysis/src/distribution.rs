use serde::Serialize;
use serde_json::Value;
use std::io::Write;

use crate::error::AnalysisError;
use crate::results::{parse_results, RaceResult};

/// How often each driver finished in each rank over a batch of simulated
/// races.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionDistribution {
    /// Driver initials, in the order of the first race result.
    drivers: Vec<String>,
    /// `counts[d][i]` = number of races driver `d` finished in rank `i + 1`.
    counts: Vec<Vec<u32>>,
    runs: usize,
}

/// Mean finishing position of one driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanPosition {
    pub initials: String,
    pub mean: f64,
}

/// Counts the final classification of every driver over all race results.
///
/// # Arguments
/// * `results` - Completed simulation runs; the first one defines the field
///
/// # Returns
/// The distribution table, or an error if there are no runs, a driver of
/// the first run is missing from a later one, or a final rank lies outside
/// `1..=no_drivers`.
pub fn aggregate(results: &[RaceResult]) -> Result<PositionDistribution, AnalysisError> {
    let first = results.first().ok_or(AnalysisError::NoRuns)?;
    let drivers: Vec<String> = first.driverinfo.initials().map(str::to_string).collect();
    let no_drivers = drivers.len();
    let mut counts = vec![vec![0u32; no_drivers]; no_drivers];

    for (run, result) in results.iter().enumerate() {
        for (idx, initials) in drivers.iter().enumerate() {
            let driver = result
                .driverinfo
                .get(initials)
                .ok_or_else(|| AnalysisError::MissingDriver {
                    run,
                    initials: initials.clone(),
                })?;
            let rank = driver
                .final_position()
                .ok_or_else(|| AnalysisError::EmptyPositions {
                    run,
                    initials: initials.clone(),
                })?;
            if rank == 0 || rank as usize > no_drivers {
                return Err(AnalysisError::RankOutOfRange {
                    run,
                    initials: initials.clone(),
                    rank,
                    drivers: no_drivers,
                });
            }
            counts[idx][rank as usize - 1] += 1;
        }
    }

    Ok(PositionDistribution {
        drivers,
        counts,
        runs: results.len(),
    })
}

/// Shape-checks raw JSON race results and aggregates them.
pub fn aggregate_json(value: &Value) -> Result<PositionDistribution, AnalysisError> {
    aggregate(&parse_results(value)?)
}

impl PositionDistribution {
    /// Number of simulated races aggregated. Never zero.
    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn no_drivers(&self) -> usize {
        self.drivers.len()
    }

    pub fn drivers(&self) -> &[String] {
        &self.drivers
    }

    /// Count vector of one driver; cell `i` belongs to rank `i + 1`.
    pub fn row(&self, initials: &str) -> Option<&[u32]> {
        self.index_of(initials).map(|idx| self.counts[idx].as_slice())
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.drivers
            .iter()
            .zip(&self.counts)
            .map(|(initials, row)| (initials.as_str(), row.as_slice()))
    }

    pub fn mean_position(&self, initials: &str) -> Option<f64> {
        self.index_of(initials).map(|idx| self.mean_of(idx))
    }

    /// Mean positions, best first. Drivers with equal means keep their
    /// input order.
    pub fn mean_positions(&self) -> Vec<MeanPosition> {
        let mut means: Vec<MeanPosition> = self
            .drivers
            .iter()
            .enumerate()
            .map(|(idx, initials)| MeanPosition {
                initials: initials.clone(),
                mean: self.mean_of(idx),
            })
            .collect();
        means.sort_by(|a, b| a.mean.total_cmp(&b.mean));
        means
    }

    /// Share of races (in percent) the driver finished in each rank.
    pub fn percentages(&self, initials: &str) -> Option<Vec<f64>> {
        self.row(initials).map(|row| {
            row.iter()
                .map(|&count| count as f64 / self.runs as f64 * 100.0)
                .collect()
        })
    }

    /// Writes the mean positions, one `RESULT:` line per driver.
    pub fn write_summary<W: Write + ?Sized>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "RESULT: Mean positions after {} simulation runs...", self.runs)?;
        for entry in self.mean_positions() {
            writeln!(out, "RESULT: {}: {:.1}", entry.initials, entry.mean)?;
        }
        Ok(())
    }

    fn index_of(&self, initials: &str) -> Option<usize> {
        self.drivers.iter().position(|d| d == initials)
    }

    fn mean_of(&self, idx: usize) -> f64 {
        let weighted: u64 = self.counts[idx]
            .iter()
            .enumerate()
            .map(|(rank_idx, &count)| (rank_idx as u64 + 1) * count as u64)
            .sum();
        weighted as f64 / self.runs as f64
    }
}

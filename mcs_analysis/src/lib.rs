//! Analysis of Monte Carlo race simulation results: final position
//! distributions, mean positions and race replay views.

pub mod distribution;
pub mod error;
pub mod plot;
pub mod replay;
pub mod results;

use std::io::Write;
use tracing::info;

pub use distribution::{aggregate, aggregate_json, MeanPosition, PositionDistribution};
pub use error::AnalysisError;
pub use plot::{DistributionFigure, Panel, PlotBackend, TextPlot};
pub use replay::{compound_name, position_trace, stints_at_lap, team_key, StintRow};
pub use results::{load_results, parse_results, DriverInfo, DriverResult, RaceResult};

/// Aggregates the final positions of all runs.
///
/// # Arguments
/// * `results` - Simulated races; the first one defines the driver field
/// * `print_to` - If set, the mean positions are written here as `RESULT:` lines
/// * `plot` - If set, the position histograms are rendered with this backend
pub fn mcs_analysis(
    results: &[RaceResult],
    print_to: Option<&mut dyn Write>,
    plot: Option<&mut dyn PlotBackend>,
) -> Result<PositionDistribution, AnalysisError> {
    let dist = aggregate(results)?;
    info!(runs = dist.runs(), drivers = dist.no_drivers(), "aggregated final positions");

    if let Some(out) = print_to {
        dist.write_summary(out)?;
    }
    if let Some(backend) = plot {
        backend.render(&DistributionFigure::from_distribution(&dist))?;
    }
    Ok(dist)
}

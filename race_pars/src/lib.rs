//! Race simulation parameter import.
//!
//! Reads the race parameter file and the Monte Carlo (MCS) parameter file,
//! merges the season-dependent MCS tables into the driver and car entries,
//! validates the event lists and, when a trained VSE is in use, resolves the
//! model artifacts it needs.

pub mod error;
pub mod merge;
pub mod reader;
pub mod schema;
pub mod sources;
pub mod tables;
pub mod vse;

use std::path::PathBuf;
use tracing::info;

pub use error::{ArtifactError, ErrorClass, ParsError, SourceKind};
pub use merge::{merge, Defaulted, Merged, DEFAULT_T_DRSEFFECT, DEFAULT_T_GAP_OVERTAKE_VEL};
pub use schema::ParameterBundle;
pub use sources::{read_mcs_source, read_race_source, McsSource, RaceSource};
pub use vse::{locate_artifacts, resolve_vse_paths, ArtifactRole, VsePathSet, VseVariant};

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub race_pars_file: PathBuf,
    pub mcs_pars_file: PathBuf,
    /// Directory holding the VSE model files. `None` disables the trained
    /// VSE variants and no artifact is resolved.
    pub vse_dir: Option<PathBuf>,
}

/// Result of [`import_pars`].
#[derive(Debug, Clone)]
pub struct Imported {
    pub bundle: ParameterBundle,
    pub vse_paths: Option<VsePathSet>,
    /// Optional track parameters that were missing and got their default.
    pub defaulted: Vec<Defaulted>,
}

/// Runs the whole import: read, validate, merge, resolve VSE artifacts.
pub fn import_pars(opts: &ImportOptions) -> Result<Imported, ParsError> {
    let race = read_race_source(&opts.race_pars_file)?;
    let mcs = read_mcs_source(&opts.mcs_pars_file, race.season())?;
    let Merged { bundle, defaulted } = merge(race, mcs)?;
    info!(
        season = bundle.season(),
        track = %bundle.track_pars.name,
        drivers = bundle.driver_pars.len(),
        defaulted = defaulted.len(),
        "parameters validated"
    );

    let vse_paths = match &opts.vse_dir {
        Some(dir) => Some(resolve_vse_paths(&bundle, dir)?),
        None => None,
    };
    Ok(Imported {
        bundle,
        vse_paths,
        defaulted,
    })
}

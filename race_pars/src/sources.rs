use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ParsError, SourceKind};
use crate::reader::IniDocument;
use crate::schema::{
    Extra, MonteCarloPars, RacePars, RawCarPars, RawDriverPars, RawEventPars, RawTrackPars,
    VsePars,
};
use crate::tables::{DriverTable, SeasonTable};

pub const ALL_SEASONS: &str = "ALL_SEASONS";

pub fn season_section(season: u32) -> String {
    format!("SEASON_{}", season)
}

/// Decoded contents of the race parameter file.
#[derive(Debug, Clone)]
pub struct RaceSource {
    pub race_pars: RacePars,
    pub monte_carlo_pars: MonteCarloPars,
    pub track_pars: RawTrackPars,
    pub car_pars: BTreeMap<String, RawCarPars>,
    pub tireset_pars: Extra,
    pub driver_pars: BTreeMap<String, RawDriverPars>,
    pub event_pars: RawEventPars,
    pub vse_pars: VsePars,
}

impl RaceSource {
    pub fn from_document(doc: &IniDocument) -> Result<Self, ParsError> {
        Ok(Self {
            race_pars: doc.decode("RACE_PARS", "race_pars")?,
            monte_carlo_pars: doc.decode("MONTE_CARLO_PARS", "monte_carlo_pars")?,
            track_pars: doc.decode("TRACK_PARS", "track_pars")?,
            car_pars: doc.decode("CAR_PARS", "car_pars")?,
            tireset_pars: doc.decode("TIRESET_PARS", "tireset_pars")?,
            driver_pars: doc.decode("DRIVER_PARS", "driver_pars")?,
            event_pars: doc.decode("EVENT_PARS", "event_pars")?,
            vse_pars: doc.decode("VSE_PARS", "vse_pars")?,
        })
    }

    pub fn season(&self) -> u32 {
        self.race_pars.season
    }
}

/// Season-dependent and cross-season tables of the MCS parameter file.
#[derive(Debug, Clone)]
pub struct McsSource {
    pub season: u32,
    pub p_accident: SeasonTable<f64>,
    pub p_failure: SeasonTable<f64>,
    pub p_fcy_phases: Extra,
    pub t_pit_var_fisk_pars: SeasonTable<Vec<f64>>,
    pub t_lap_var_sigma: DriverTable<f64>,
    pub t_startperf: DriverTable<Value>,
}

impl McsSource {
    pub fn from_document(doc: &IniDocument, season: u32) -> Result<Self, ParsError> {
        let season_sec = season_section(season);
        Ok(Self {
            season,
            p_accident: SeasonTable::new("p_accident", doc.decode(&season_sec, "p_accident")?),
            p_failure: SeasonTable::new("p_failure", doc.decode(&season_sec, "p_failure")?),
            p_fcy_phases: doc.decode(ALL_SEASONS, "p_fcy_phases")?,
            t_pit_var_fisk_pars: SeasonTable::new(
                "t_pit_var_fisk_pars",
                doc.decode(ALL_SEASONS, "t_pit_var_fisk_pars")?,
            ),
            t_lap_var_sigma: DriverTable::new(
                "t_lap_var_sigma",
                doc.decode(ALL_SEASONS, "t_lap_var_sigma")?,
            )?,
            t_startperf: DriverTable::new("t_startperf", doc.decode(ALL_SEASONS, "t_startperf")?)?,
        })
    }
}

pub fn read_race_source(path: &Path) -> Result<RaceSource, ParsError> {
    info!(path = %path.display(), "loading race parameters");
    let doc = IniDocument::load(SourceKind::Race, path)?;
    let source = RaceSource::from_document(&doc)?;
    debug!(
        season = source.season(),
        track = %source.track_pars.name,
        drivers = source.driver_pars.len(),
        teams = source.car_pars.len(),
        "race parameters decoded"
    );
    Ok(source)
}

pub fn read_mcs_source(path: &Path, season: u32) -> Result<McsSource, ParsError> {
    info!(path = %path.display(), season, "loading MCS parameters");
    let doc = IniDocument::load(SourceKind::MonteCarlo, path)?;
    McsSource::from_document(&doc, season)
}

//! Resolution of the decision-model (VSE) artifacts a configuration needs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use vse_artifacts::naming;

use crate::error::ArtifactError;
use crate::schema::ParameterBundle;

/// One file a VSE variant needs at simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRole {
    SupervisedPreprocessorTc,
    SupervisedNnmodelTc,
    SupervisedPreprocessorCc,
    SupervisedNnmodelCc,
    ReinfPreprocessor,
    ReinfNnmodel,
}

impl ArtifactRole {
    pub fn key(self) -> &'static str {
        match self {
            ArtifactRole::SupervisedPreprocessorTc => "supervised_preprocessor_tc",
            ArtifactRole::SupervisedNnmodelTc => "supervised_nnmodel_tc",
            ArtifactRole::SupervisedPreprocessorCc => "supervised_preprocessor_cc",
            ArtifactRole::SupervisedNnmodelCc => "supervised_nnmodel_cc",
            ArtifactRole::ReinfPreprocessor => "reinf_preprocessor",
            ArtifactRole::ReinfNnmodel => "reinf_nnmodel",
        }
    }

    /// File name inside the VSE directory. `race` only matters for the
    /// race-specific reinforcement files.
    pub fn file_name(self, race: &str) -> String {
        match self {
            ArtifactRole::SupervisedPreprocessorTc => naming::SUPERVISED_PREPROCESSOR_TIRECHANGE.to_string(),
            ArtifactRole::SupervisedNnmodelTc => naming::SUPERVISED_NN_TIRECHANGE.to_string(),
            ArtifactRole::SupervisedPreprocessorCc => {
                naming::SUPERVISED_PREPROCESSOR_COMPOUNDCHOICE.to_string()
            }
            ArtifactRole::SupervisedNnmodelCc => naming::SUPERVISED_NN_COMPOUNDCHOICE.to_string(),
            ArtifactRole::ReinfPreprocessor => naming::preprocessor_file(race),
            ArtifactRole::ReinfNnmodel => naming::policy_tflite_file(race),
        }
    }
}

impl fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Trained VSE variants that need files on disk. Other strategy types
/// (base strategy, real strategy, ...) need none and are not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VseVariant {
    Supervised,
    Reinforcement,
}

impl VseVariant {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "supervised" => Some(VseVariant::Supervised),
            "reinforcement" => Some(VseVariant::Reinforcement),
            _ => None,
        }
    }

    pub fn roles(self) -> &'static [ArtifactRole] {
        match self {
            VseVariant::Supervised => &[
                ArtifactRole::SupervisedPreprocessorTc,
                ArtifactRole::SupervisedNnmodelTc,
                ArtifactRole::SupervisedPreprocessorCc,
                ArtifactRole::SupervisedNnmodelCc,
            ],
            VseVariant::Reinforcement => &[ArtifactRole::ReinfPreprocessor, ArtifactRole::ReinfNnmodel],
        }
    }

    /// Reinforcement models are trained per race, so their absence can be a
    /// known gap in the training data rather than a broken installation.
    pub fn race_specific(self) -> bool {
        matches!(self, VseVariant::Reinforcement)
    }
}

/// Artifact role -> existing file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VsePathSet(BTreeMap<ArtifactRole, PathBuf>);

impl VsePathSet {
    pub fn get(&self, role: ArtifactRole) -> Option<&Path> {
        self.0.get(&role).map(PathBuf::as_path)
    }

    pub fn roles(&self) -> impl Iterator<Item = ArtifactRole> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArtifactRole, &Path)> {
        self.0.iter().map(|(role, path)| (*role, path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Distinct trained variants referenced by a `vse_type` mapping.
pub fn configured_variants(vse_type: &BTreeMap<String, String>) -> BTreeSet<VseVariant> {
    vse_type
        .values()
        .filter_map(|name| VseVariant::from_name(name))
        .collect()
}

/// Checks that every file of every configured variant exists in `vse_dir`.
/// The first missing file aborts the resolution.
pub fn locate_artifacts(
    vse_type: &BTreeMap<String, String>,
    vse_dir: &Path,
    track_name: &str,
    season: u32,
) -> Result<VsePathSet, ArtifactError> {
    let race = naming::race_token(track_name, season);
    let mut paths = VsePathSet::default();

    for variant in configured_variants(vse_type) {
        for &role in variant.roles() {
            let path = vse_dir.join(role.file_name(&race));
            if !path.is_file() {
                return Err(if variant.race_specific() {
                    ArtifactError::UnavailableForRace {
                        role,
                        path,
                        race: race.clone(),
                    }
                } else {
                    ArtifactError::Missing { role, path }
                });
            }
            debug!(%role, path = %path.display(), "found VSE artifact");
            paths.0.insert(role, path);
        }
    }

    info!(artifacts = paths.len(), dir = %vse_dir.display(), "VSE artifacts resolved");
    Ok(paths)
}

pub fn resolve_vse_paths(bundle: &ParameterBundle, vse_dir: &Path) -> Result<VsePathSet, ArtifactError> {
    locate_artifacts(
        &bundle.vse_pars.vse_type,
        vse_dir,
        &bundle.track_pars.name,
        bundle.season(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn vse_type(rows: &[(&str, &str)]) -> BTreeMap<String, String> {
        rows.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"artifact").unwrap();
    }

    #[test]
    fn test_no_trained_variant_needs_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let types = vse_type(&[("HAM", "basestrategy"), ("VET", "realstrategy")]);
        let paths = locate_artifacts(&types, dir.path(), "Shanghai", 2019).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_supervised_roles_resolved() {
        let dir = tempfile::tempdir().unwrap();
        for role in VseVariant::Supervised.roles() {
            touch(dir.path(), &role.file_name("unused"));
        }
        let types = vse_type(&[("HAM", "supervised"), ("VET", "supervised")]);
        let paths = locate_artifacts(&types, dir.path(), "Shanghai", 2019).unwrap();

        assert_eq!(paths.len(), 4);
        assert_eq!(
            paths.get(ArtifactRole::SupervisedPreprocessorTc),
            Some(dir.path().join("preprocessor_supervised_tirechange.pkl").as_path())
        );
        assert!(paths.get(ArtifactRole::ReinfNnmodel).is_none());
    }

    #[test]
    fn test_missing_supervised_preprocessor_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "nn_supervised_tirechange.tflite");
        touch(dir.path(), "preprocessor_supervised_compoundchoice.pkl");
        touch(dir.path(), "nn_supervised_compoundchoice.tflite");

        let types = vse_type(&[("HAM", "supervised")]);
        let err = locate_artifacts(&types, dir.path(), "Shanghai", 2019).unwrap_err();
        match err {
            ArtifactError::Missing { role, path } => {
                assert_eq!(role, ArtifactRole::SupervisedPreprocessorTc);
                assert!(path.ends_with("preprocessor_supervised_tirechange.pkl"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_reinforcement_files_are_race_specific() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "preprocessor_reinforcement_Shanghai_2019.pkl");
        touch(dir.path(), "nn_reinforcement_Shanghai_2019.tflite");

        let types = vse_type(&[("HAM", "reinforcement")]);
        let paths = locate_artifacts(&types, dir.path(), "Shanghai", 2019).unwrap();
        assert_eq!(
            paths.roles().collect::<Vec<_>>(),
            vec![ArtifactRole::ReinfPreprocessor, ArtifactRole::ReinfNnmodel]
        );

        let err = locate_artifacts(&types, dir.path(), "Shanghai", 2018).unwrap_err();
        match &err {
            ArtifactError::UnavailableForRace { role, race, .. } => {
                assert_eq!(*role, ArtifactRole::ReinfPreprocessor);
                assert_eq!(race, "Shanghai_2018");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(err.to_string().contains("wet races"));
        assert!(err.path().ends_with("preprocessor_reinforcement_Shanghai_2018.pkl"));
    }

    #[test]
    fn test_path_set_serializes_by_role_key() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "preprocessor_reinforcement_Monza_2019.pkl");
        touch(dir.path(), "nn_reinforcement_Monza_2019.tflite");
        let types = vse_type(&[("LEC", "reinforcement")]);
        let paths = locate_artifacts(&types, dir.path(), "Monza", 2019).unwrap();

        let json = serde_json::to_value(&paths).unwrap();
        assert!(json.get("reinf_preprocessor").is_some());
        assert!(json.get("reinf_nnmodel").is_some());
    }
}

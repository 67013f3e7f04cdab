use anyhow::{bail, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::naming;

/// Turns a trained policy (as saved by the training framework) into the
/// deployable inference model. Conversion itself happens outside this crate.
pub trait ModelConverter {
    fn convert(&self, policy_dir: &Path) -> Result<Vec<u8>>;
}

/// Writes a fitted preprocessor under its race-specific name and returns the
/// file path.
pub fn save_preprocessor<P: Serialize>(preprocessor: &P, save_dir: &Path, race: &str) -> Result<PathBuf> {
    fs::create_dir_all(save_dir)
        .with_context(|| format!("failed to create {}", save_dir.display()))?;
    let path = save_dir.join(naming::preprocessor_file(race));

    let file = File::create(&path)
        .with_context(|| format!("failed to create preprocessor file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, preprocessor)
        .with_context(|| format!("failed to serialize preprocessor to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), "saved preprocessor");
    Ok(path)
}

pub fn load_preprocessor<P: DeserializeOwned>(path: &Path) -> Result<P> {
    let file = File::open(path)
        .with_context(|| format!("failed to open preprocessor at {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse preprocessor {}", path.display()))
}

/// Converts the policy in `policy_dir` and stores the result under the
/// race-specific model name.
pub fn save_policy_tflite(
    converter: &dyn ModelConverter,
    policy_dir: &Path,
    save_dir: &Path,
    race: &str,
) -> Result<PathBuf> {
    if !policy_dir.is_dir() {
        bail!("policy directory {} does not exist", policy_dir.display());
    }
    let model = converter
        .convert(policy_dir)
        .with_context(|| format!("failed to convert policy at {}", policy_dir.display()))?;
    if model.is_empty() {
        bail!("converter produced an empty model for {}", policy_dir.display());
    }

    fs::create_dir_all(save_dir)
        .with_context(|| format!("failed to create {}", save_dir.display()))?;
    let path = save_dir.join(naming::policy_tflite_file(race));
    fs::write(&path, &model).with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), bytes = model.len(), "saved policy model");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct OneHotPreprocessor {
        categories: BTreeMap<String, Vec<String>>,
    }

    struct ConcatConverter;

    impl ModelConverter for ConcatConverter {
        fn convert(&self, policy_dir: &Path) -> Result<Vec<u8>> {
            let mut names: Vec<_> = fs::read_dir(policy_dir)?
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            Ok(names.join(",").into_bytes())
        }
    }

    #[test]
    fn test_preprocessor_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let save_dir = dir.path().join("nested").join("vse");
        let pre = OneHotPreprocessor {
            categories: [("compound".to_string(), vec!["A3".to_string(), "A4".to_string()])]
                .into_iter()
                .collect(),
        };

        let path = save_preprocessor(&pre, &save_dir, "Shanghai_2019").unwrap();
        assert_eq!(path, save_dir.join("preprocessor_reinforcement_Shanghai_2019.pkl"));
        let loaded: OneHotPreprocessor = load_preprocessor(&path).unwrap();
        assert_eq!(loaded, pre);
    }

    #[test]
    fn test_policy_saved_under_model_name() {
        let dir = tempfile::tempdir().unwrap();
        let policy_dir = dir.path().join("policy");
        fs::create_dir_all(&policy_dir).unwrap();
        fs::write(policy_dir.join("saved_model.pb"), b"graph").unwrap();

        let path = save_policy_tflite(&ConcatConverter, &policy_dir, dir.path(), "Monza_2019").unwrap();
        assert!(path.ends_with("nn_reinforcement_Monza_2019.tflite"));
        assert_eq!(fs::read(&path).unwrap(), b"saved_model.pb");
    }

    #[test]
    fn test_empty_conversion_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let policy_dir = dir.path().join("policy");
        fs::create_dir_all(&policy_dir).unwrap();
        let err = save_policy_tflite(&ConcatConverter, &policy_dir, dir.path(), "Monza_2019").unwrap_err();
        assert!(err.to_string().contains("empty model"));
        assert!(save_policy_tflite(&ConcatConverter, &dir.path().join("nope"), dir.path(), "x").is_err());
    }
}

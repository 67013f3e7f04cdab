use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::vse::ArtifactRole;

/// Which of the two layered parameter files a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Race,
    MonteCarlo,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Race => f.write_str("race parameter"),
            SourceKind::MonteCarlo => f.write_str("MCS parameter"),
        }
    }
}

/// Coarse failure taxonomy callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Configuration,
    Validation,
    Lookup,
    ArtifactNotFound,
}

#[derive(Debug, Error)]
pub enum ParsError {
    #[error("specified {kind} config file does not exist or is empty: {}", path.display())]
    SourceUnavailable { kind: SourceKind, path: PathBuf },

    #[error("{}:{line}: {message}", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("missing section [{section}]")]
    MissingSection { section: String },

    #[error("missing option '{key}' in section [{section}]")]
    MissingKey { section: String, key: String },

    #[error("failed to decode [{section}] {key}: {source}")]
    Decode {
        section: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("table {table} has no \"unknown\" fallback entry")]
    MissingFallback { table: &'static str },

    #[error("{list} must be a list of lists (element {index}: {reason})")]
    MalformedEvents {
        list: &'static str,
        index: usize,
        reason: String,
    },

    #[error("no entry for '{key}' in {table}")]
    Lookup { table: &'static str, key: String },

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl ParsError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ParsError::SourceUnavailable { .. }
            | ParsError::Syntax { .. }
            | ParsError::MissingSection { .. }
            | ParsError::MissingKey { .. }
            | ParsError::Decode { .. }
            | ParsError::MissingFallback { .. } => ErrorClass::Configuration,
            ParsError::MalformedEvents { .. } => ErrorClass::Validation,
            ParsError::Lookup { .. } => ErrorClass::Lookup,
            ParsError::Artifact(_) => ErrorClass::ArtifactNotFound,
        }
    }
}

/// A decision-model file required by the configured VSE variants is absent.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{role} file is not available in the input path: {}", path.display())]
    Missing { role: ArtifactRole, path: PathBuf },

    /// Reinforcement models are trained per race; some races (the partly wet
    /// ones) were left out of the training data and have no model at all.
    #[error(
        "{role} file is not available in the input path: {}. No reinforcement model \
         was trained for race {race}; was it one of the (partly) wet races excluded \
         from the training data?",
        path.display()
    )]
    UnavailableForRace {
        role: ArtifactRole,
        path: PathBuf,
        race: String,
    },
}

impl ArtifactError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ArtifactError::Missing { path, .. } | ArtifactError::UnavailableForRace { path, .. } => {
                path
            }
        }
    }
}

use crate::media::CommandCamera;
use crate::service::{EmbeddingModel, VerificationPolicy, DEFAULT_THRESHOLD_PERCENT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("reading settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Where the comparison service lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000/compare".into(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    ServerReported,
    Threshold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub policy: PolicyKind,
    pub threshold_percent: f64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::ServerReported,
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
        }
    }
}

impl VerificationConfig {
    pub fn to_policy(&self) -> VerificationPolicy {
        match self.policy {
            PolicyKind::ServerReported => VerificationPolicy::ServerReported,
            PolicyKind::Threshold => VerificationPolicy::Threshold {
                percent: self.threshold_percent,
            },
        }
    }
}

/// Frontend settings, loadable from YAML. Every key is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub service: ServiceConfig,
    pub default_model: EmbeddingModel,
    pub verification: VerificationConfig,
    pub camera: CommandCamera,
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|source| SettingsError::Read {
            path: path_ref.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_yaml::from_str(&contents).map_err(|source| SettingsError::Parse {
                path: path_ref.to_path_buf(),
                source,
            })?;
        log::debug!("settings loaded from {}", path_ref.display());
        Ok(settings)
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

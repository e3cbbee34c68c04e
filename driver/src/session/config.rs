use anyhow::Context;
use rupacore::service::{EmbeddingModel, VerificationPolicy};
use rupacore::Settings;
use std::path::Path;

/// Settings for one driver run: the YAML file with command-line overrides
/// applied on top.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub settings: Settings,
    pub model: EmbeddingModel,
    pub policy: VerificationPolicy,
}

/// Reads the settings file when one is given, defaults otherwise.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    Settings::load_or_default(path).context("loading frontend settings")
}

impl SessionConfig {
    pub fn from_args(
        mut settings: Settings,
        model: Option<EmbeddingModel>,
        service_url: Option<String>,
        threshold: Option<f64>,
    ) -> Self {
        if let Some(url) = service_url {
            settings.service.url = url;
        }
        let policy = match threshold {
            Some(percent) => VerificationPolicy::Threshold { percent },
            None => settings.verification.to_policy(),
        };
        Self {
            model: model.unwrap_or(settings.default_model),
            policy,
            settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn overrides_win_over_settings() {
        let config = SessionConfig::from_args(
            Settings::default(),
            Some(EmbeddingModel::SFace),
            Some("http://127.0.0.1:9100/compare".into()),
            Some(70.0),
        );
        assert_eq!(config.model, EmbeddingModel::SFace);
        assert_eq!(config.settings.service.url, "http://127.0.0.1:9100/compare");
        assert_eq!(config.policy, VerificationPolicy::Threshold { percent: 70.0 });
    }

    #[test]
    fn settings_supply_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"default_model: OpenFace\n").unwrap();
        let path = temp.into_temp_path();
        let settings = load_settings(Some(&path)).unwrap();
        let config = SessionConfig::from_args(settings, None, None, None);
        assert_eq!(config.model, EmbeddingModel::OpenFace);
        assert_eq!(config.policy, VerificationPolicy::ServerReported);
    }
}

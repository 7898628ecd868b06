use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::provider::{anthropic, openai, ProviderKind};

pub const DEFAULT_CONFIG_FILE: &str = "lc_assist.toml";
const ENV_PREFIX: &str = "LC";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub provider: Option<ProviderKind>,
    pub anthropic_key: Option<String>,
    pub openai_key: Option<String>,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Pause between revealing correction boxes and filling them.
    #[serde(default = "default_fill_delay_ms")]
    pub fill_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// What a provider call needs, once settings are validated.
#[derive(Debug, Clone)]
pub struct Credential {
    pub provider: ProviderKind,
    pub api_key: String,
    pub model: String,
}

fn default_anthropic_model() -> String {
    anthropic::DEFAULT_MODEL.to_string()
}

fn default_openai_model() -> String {
    openai::DEFAULT_MODEL.to_string()
}

fn default_fill_delay_ms() -> u64 {
    50
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Settings {
    /// Optional TOML file, overridden by `LC_*` environment variables.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;
        debug!(
            provider = ?settings.provider,
            has_anthropic_key = settings.anthropic_key.is_some(),
            has_openai_key = settings.openai_key.is_some(),
            "Settings loaded"
        );
        Ok(settings)
    }

    /// Resolve the provider to call: `override_provider` wins over the
    /// configured one, and the chosen provider must have a non-blank key.
    pub fn credential(&self, override_provider: Option<ProviderKind>) -> Result<Credential, ConfigError> {
        let provider = override_provider
            .or(self.provider)
            .ok_or(ConfigError::NoProvider)?;

        let (key, model) = match provider {
            ProviderKind::Anthropic => (&self.anthropic_key, &self.anthropic_model),
            ProviderKind::OpenAi => (&self.openai_key, &self.openai_model),
        };
        let api_key = key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingKey(provider.label()))?;

        Ok(Credential {
            provider,
            api_key: api_key.to_string(),
            model: model.clone(),
        })
    }

    pub fn fill_delay(&self) -> Duration {
        Duration::from_millis(self.fill_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_apply() {
        let s = from_toml("provider = \"anthropic\"\nanthropic_key = \"sk-ant\"");
        assert_eq!(s.fill_delay(), Duration::from_millis(50));
        assert_eq!(s.anthropic_model, anthropic::DEFAULT_MODEL);
        assert_eq!(s.openai_model, openai::DEFAULT_MODEL);
    }

    #[test]
    fn credential_for_selected_provider() {
        let s = from_toml("provider = \"openai\"\nopenai_key = \" sk-open \"\nopenai_model = \"gpt-test\"");
        let c = s.credential(None).unwrap();
        assert_eq!(c.provider, ProviderKind::OpenAi);
        assert_eq!(c.api_key, "sk-open");
        assert_eq!(c.model, "gpt-test");
    }

    #[test]
    fn no_provider_selected() {
        let s = from_toml("anthropic_key = \"sk-ant\"");
        assert!(matches!(s.credential(None), Err(ConfigError::NoProvider)));
        assert!(s.credential(Some(ProviderKind::Anthropic)).is_ok());
    }

    #[test]
    fn selected_provider_needs_a_key() {
        let s = from_toml("provider = \"anthropic\"\nanthropic_key = \"  \"\nopenai_key = \"sk-open\"");
        assert!(matches!(s.credential(None), Err(ConfigError::MissingKey(_))));
        assert!(s.credential(Some(ProviderKind::OpenAi)).is_ok());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let s = Settings::load(Path::new("tests/fixtures/does_not_exist.toml")).unwrap();
        assert_eq!(s.request_timeout(), Duration::from_secs(s.request_timeout_secs));
    }
}

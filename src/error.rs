use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Failed to parse AI response as JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("AI response missing corrections array")]
    MissingCorrections,

    #[error("Corrections array length ({actual}) does not match sentences length ({expected})")]
    LengthMismatch { actual: usize, expected: usize },
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{provider} returned malformed JSON: {source}")]
    Decode {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} returned no text content")]
    EmptyResponse { provider: &'static str },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("No AI provider selected. Set LC_PROVIDER to \"anthropic\" or \"openai\".")]
    NoProvider,

    #[error("No API key configured for {0}")]
    MissingKey(&'static str),
}

/// Terminal failure of one correction cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("No sentences found on this page")]
    NoSentences,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

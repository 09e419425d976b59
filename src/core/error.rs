//! Error taxonomy shared by every stage of the synthesis pipeline.

use thiserror::Error;

use super::options::{AudioFormat, Provider, VoiceGender};

/// Errors raised while validating, resolving, transforming, synthesizing or
/// routing a text-to-speech request.
#[derive(Debug, Error)]
pub enum T2SError {
    /// Malformed request, e.g. SSML text without a `<speak>` root.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Provider {provider} does not support audio format {format}")]
    UnsupportedFormat {
        provider: Provider,
        format: AudioFormat,
    },

    /// No provider reported a voice matching the constraints.
    #[error(
        "No voice found for language '{language_code}', gender '{gender}', engine '{engine}' (tried: {})",
        format_providers(.tried)
    )]
    VoiceNotFound {
        language_code: String,
        gender: VoiceGender,
        engine: String,
        tried: Vec<Provider>,
    },

    #[error("Transform error: {0}")]
    Transform(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider not ready: {0}")]
    ProviderNotReady(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Every adapter close failure collected during shutdown.
    #[error("Failed to close {} provider(s): {}", .0.len(), format_errors(.0))]
    Shutdown(Vec<T2SError>),
}

/// Result type for the orchestration layer
pub type T2SResult<T> = Result<T, T2SError>;

fn format_providers(providers: &[Provider]) -> String {
    if providers.is_empty() {
        return "none".to_string();
    }
    providers
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_errors(errors: &[T2SError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

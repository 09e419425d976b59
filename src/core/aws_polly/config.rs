//! Configuration types for the Amazon Polly adapter.
//!
//! Polly names its formats with strings (`mp3`, `ogg_vorbis`, `pcm`, `json`)
//! and its engines with lowercase identifiers. The canonical [`AudioFormat`]
//! maps onto [`PollyOutputFormat`] in both directions.

use serde::{Deserialize, Serialize};

use crate::config::T2SConfig;
use crate::core::options::AudioFormat;
use crate::core::ssml::ProsodyStrategy;
use crate::storage::StorageCredentials;

// =============================================================================
// Polly Engine
// =============================================================================

/// Amazon Polly synthesis engine options.
///
/// - **Standard**: Basic TTS, lowest latency
/// - **Neural**: High-quality neural voices
/// - **LongForm**: Optimized for longer content like audiobooks
/// - **Generative**: Generative AI voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollyEngine {
    #[serde(rename = "standard")]
    Standard,
    #[serde(rename = "neural")]
    Neural,
    #[serde(rename = "long-form")]
    LongForm,
    #[serde(rename = "generative")]
    Generative,
}

impl PollyEngine {
    /// Convert to AWS API string.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Neural => "neural",
            Self::LongForm => "long-form",
            Self::Generative => "generative",
        }
    }

    /// Parse a caller-supplied engine name. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "neural" => Some(Self::Neural),
            "long-form" | "longform" | "long_form" => Some(Self::LongForm),
            "generative" => Some(Self::Generative),
            _ => None,
        }
    }
}

impl std::fmt::Display for PollyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Polly Output Format
// =============================================================================

/// Audio output formats supported by Amazon Polly.
///
/// - **Mp3**: Compressed audio (default)
/// - **OggVorbis**: Open-source compression
/// - **Pcm**: Raw 16-bit signed little-endian audio
/// - **Json**: Speech marks instead of audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PollyOutputFormat {
    #[default]
    #[serde(rename = "mp3")]
    Mp3,
    #[serde(rename = "ogg_vorbis")]
    OggVorbis,
    #[serde(rename = "pcm")]
    Pcm,
    #[serde(rename = "json")]
    Json,
}

impl PollyOutputFormat {
    /// Convert to AWS API string.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::OggVorbis => "ogg_vorbis",
            Self::Pcm => "pcm",
            Self::Json => "json",
        }
    }

    /// Parse an AWS API string. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mp3" => Some(Self::Mp3),
            "ogg_vorbis" => Some(Self::OggVorbis),
            "pcm" => Some(Self::Pcm),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Map a canonical format. `Unspecified` selects MP3.
    pub fn from_audio_format(format: AudioFormat) -> Option<Self> {
        match format {
            AudioFormat::Unspecified | AudioFormat::Mp3 => Some(Self::Mp3),
            AudioFormat::Ogg => Some(Self::OggVorbis),
            AudioFormat::Pcm => Some(Self::Pcm),
            AudioFormat::Json => Some(Self::Json),
            AudioFormat::Linear16 | AudioFormat::Mulaw | AudioFormat::Alaw => None,
        }
    }

    pub fn to_audio_format(self) -> AudioFormat {
        match self {
            Self::Mp3 => AudioFormat::Mp3,
            Self::OggVorbis => AudioFormat::Ogg,
            Self::Pcm => AudioFormat::Pcm,
            Self::Json => AudioFormat::Json,
        }
    }
}

impl std::fmt::Display for PollyOutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical formats Polly can produce.
pub const POLLY_SUPPORTED_FORMATS: &[AudioFormat] = &[
    AudioFormat::Mp3,
    AudioFormat::Ogg,
    AudioFormat::Pcm,
    AudioFormat::Json,
];

// =============================================================================
// Main Configuration
// =============================================================================

/// Maximum total input length including SSML tags (characters).
pub const MAX_TOTAL_LENGTH: usize = 6000;

/// Configuration for the Amazon Polly adapter.
///
/// Credentials come from the explicit key fields when both are set, and from
/// the default AWS provider chain (environment, profile, IAM role) otherwise.
#[derive(Clone, Default)]
pub struct AwsPollyConfig {
    /// AWS region for the Polly service
    pub region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    /// How prosody is embedded into text that is already SSML
    pub prosody_strategy: ProsodyStrategy,
    /// Credentials for uploads to S3
    pub storage: StorageCredentials,
}

impl std::fmt::Debug for AwsPollyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsPollyConfig")
            .field("region", &self.region)
            .field("explicit_credentials", &self.has_explicit_credentials())
            .field("prosody_strategy", &self.prosody_strategy)
            .finish()
    }
}

impl AwsPollyConfig {
    pub fn from_config(config: &T2SConfig) -> Self {
        Self {
            region: config.effective_aws_region().to_string(),
            aws_access_key_id: config.aws_access_key_id.clone(),
            aws_secret_access_key: config.aws_secret_access_key.clone(),
            aws_session_token: config.aws_session_token.clone(),
            prosody_strategy: config.prosody_strategy,
            storage: StorageCredentials::from_config(config),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.region.trim().is_empty() {
            return Err("AWS region must not be empty".to_string());
        }
        if self.aws_access_key_id.is_some() != self.aws_secret_access_key.is_some() {
            return Err(
                "AWS access key id and secret access key must be provided together".to_string(),
            );
        }
        Ok(())
    }

    /// Check if explicit AWS credentials are provided.
    pub fn has_explicit_credentials(&self) -> bool {
        self.aws_access_key_id.is_some() && self.aws_secret_access_key.is_some()
    }
}

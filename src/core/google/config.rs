//! Configuration types for the Google Cloud Text-to-Speech adapter.

use serde::{Deserialize, Serialize};

use crate::config::T2SConfig;
use crate::core::options::AudioFormat;
use crate::storage::StorageCredentials;

/// Default Text-to-Speech REST endpoint.
pub const GOOGLE_TTS_URL: &str = "https://texttospeech.googleapis.com";

/// Pitch range of the API in semitones; canonical pitch [-1, 1] is scaled by it.
pub const GOOGLE_PITCH_SEMITONES: f64 = 20.0;

/// Speaking rate bounds accepted by the API.
pub const GOOGLE_SPEAKING_RATE_RANGE: (f64, f64) = (0.25, 4.0);

/// Volume gain bounds accepted by the API, in dB.
pub const GOOGLE_VOLUME_GAIN_RANGE: (f64, f64) = (-96.0, 16.0);

// =============================================================================
// Audio Encoding
// =============================================================================

/// Google `AudioEncoding` values with their protobuf codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoogleAudioEncoding {
    #[serde(rename = "LINEAR16")]
    Linear16,
    #[serde(rename = "MP3")]
    Mp3,
    #[serde(rename = "OGG_OPUS")]
    OggOpus,
    #[serde(rename = "MULAW")]
    Mulaw,
    #[serde(rename = "ALAW")]
    Alaw,
}

impl GoogleAudioEncoding {
    /// Protobuf enum code.
    #[inline]
    pub fn code(&self) -> i32 {
        match self {
            Self::Linear16 => 1,
            Self::Mp3 => 2,
            Self::OggOpus => 3,
            Self::Mulaw => 5,
            Self::Alaw => 6,
        }
    }

    /// REST enum name.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear16 => "LINEAR16",
            Self::Mp3 => "MP3",
            Self::OggOpus => "OGG_OPUS",
            Self::Mulaw => "MULAW",
            Self::Alaw => "ALAW",
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Linear16),
            2 => Some(Self::Mp3),
            3 => Some(Self::OggOpus),
            5 => Some(Self::Mulaw),
            6 => Some(Self::Alaw),
            _ => None,
        }
    }

    /// Map a canonical format. `Unspecified` selects MP3.
    pub fn from_audio_format(format: AudioFormat) -> Option<Self> {
        match format {
            AudioFormat::Unspecified | AudioFormat::Mp3 => Some(Self::Mp3),
            AudioFormat::Ogg => Some(Self::OggOpus),
            AudioFormat::Linear16 => Some(Self::Linear16),
            AudioFormat::Mulaw => Some(Self::Mulaw),
            AudioFormat::Alaw => Some(Self::Alaw),
            AudioFormat::Pcm | AudioFormat::Json => None,
        }
    }

    pub fn to_audio_format(self) -> AudioFormat {
        match self {
            Self::Linear16 => AudioFormat::Linear16,
            Self::Mp3 => AudioFormat::Mp3,
            Self::OggOpus => AudioFormat::Ogg,
            Self::Mulaw => AudioFormat::Mulaw,
            Self::Alaw => AudioFormat::Alaw,
        }
    }
}

impl std::fmt::Display for GoogleAudioEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical formats Google can produce.
pub const GOOGLE_SUPPORTED_FORMATS: &[AudioFormat] = &[
    AudioFormat::Mp3,
    AudioFormat::Ogg,
    AudioFormat::Linear16,
    AudioFormat::Mulaw,
    AudioFormat::Alaw,
];

// =============================================================================
// Main Configuration
// =============================================================================

/// Configuration for the Google adapter.
///
/// Requests are authorized with `api_key` when set, otherwise with OAuth
/// credentials from `credentials_path` or application default credentials.
#[derive(Clone)]
pub struct GoogleConfig {
    /// REST base URL
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Path to a service-account JSON file
    pub credentials_path: Option<String>,
    /// Credentials for uploads to GCS
    pub storage: StorageCredentials,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            endpoint: GOOGLE_TTS_URL.to_string(),
            api_key: None,
            credentials_path: None,
            storage: StorageCredentials::default(),
        }
    }
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("credentials_path", &self.credentials_path)
            .finish()
    }
}

impl GoogleConfig {
    pub fn from_config(config: &T2SConfig) -> Self {
        Self {
            endpoint: config
                .google_endpoint
                .clone()
                .unwrap_or_else(|| GOOGLE_TTS_URL.to_string()),
            api_key: config.google_api_key.clone(),
            credentials_path: config.google_credentials.clone(),
            storage: StorageCredentials::from_config(config),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.endpoint)
            .map_err(|e| format!("Invalid Google endpoint '{}': {e}", self.endpoint))?;
        if self.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err("Google API key must not be empty".to_string());
        }
        Ok(())
    }

    pub fn voices_url(&self) -> String {
        format!("{}/v1/voices", self.endpoint.trim_end_matches('/'))
    }

    pub fn synthesize_url(&self) -> String {
        format!("{}/v1/text:synthesize", self.endpoint.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_codes() {
        assert_eq!(GoogleAudioEncoding::Linear16.code(), 1);
        assert_eq!(GoogleAudioEncoding::Mp3.code(), 2);
        assert_eq!(GoogleAudioEncoding::OggOpus.code(), 3);
        assert_eq!(GoogleAudioEncoding::Mulaw.code(), 5);
        assert_eq!(GoogleAudioEncoding::Alaw.code(), 6);
        assert_eq!(GoogleAudioEncoding::from_code(4), None);
    }

    #[test]
    fn test_encoding_mapping_is_bidirectional() {
        for format in GOOGLE_SUPPORTED_FORMATS {
            let encoding = GoogleAudioEncoding::from_audio_format(*format).unwrap();
            assert_eq!(GoogleAudioEncoding::from_code(encoding.code()), Some(encoding));
            assert_eq!(encoding.to_audio_format(), *format);
        }
        assert_eq!(
            GoogleAudioEncoding::from_audio_format(AudioFormat::Unspecified),
            Some(GoogleAudioEncoding::Mp3)
        );
        assert_eq!(GoogleAudioEncoding::from_audio_format(AudioFormat::Pcm), None);
        assert_eq!(GoogleAudioEncoding::from_audio_format(AudioFormat::Json), None);
    }

    #[test]
    fn test_urls() {
        let mut config = GoogleConfig::default();
        assert_eq!(
            config.synthesize_url(),
            "https://texttospeech.googleapis.com/v1/text:synthesize"
        );
        config.endpoint = "http://127.0.0.1:8080/".to_string();
        assert_eq!(config.voices_url(), "http://127.0.0.1:8080/v1/voices");
    }

    #[test]
    fn test_validate() {
        let mut config = GoogleConfig::default();
        assert!(config.validate().is_ok());

        config.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = GoogleConfig::default();
        config.api_key = Some("  ".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut config = GoogleConfig::default();
        config.api_key = Some("g-secret".into());
        assert!(!format!("{config:?}").contains("g-secret"));
    }
}

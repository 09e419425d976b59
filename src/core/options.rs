//! Vendor-neutral request model.
//!
//! A [`TextToSpeechRequest`] is built by the caller and copied through the
//! pipeline. The orchestrator validates it, resolves `TextType::Auto`, fills
//! voice defaults and finally hands a provider-specific [`ResolvedRequest`]
//! to the chosen adapter.
//!
//! # Example
//!
//! ```rust
//! use t2s_orchestrator::core::options::{AudioFormat, Prosody, TextToSpeechRequest, TextType};
//!
//! let mut request = TextToSpeechRequest::new("<speak>Hello</speak>")
//!     .with_output_format(AudioFormat::Mp3)
//!     .with_prosody(Prosody { speaking_rate: 1.1, ..Default::default() });
//!
//! request.validate().unwrap();
//! request.infer_text_type();
//! assert_eq!(request.text_type, TextType::Ssml);
//! ```

use serde::{Deserialize, Serialize};

use super::error::{T2SError, T2SResult};
use super::ssml;

/// Language used when the caller gives no voice constraints.
pub const DEFAULT_LANGUAGE_CODE: &str = "en-US";

/// Gender used when the caller gives no voice constraints.
pub const DEFAULT_GENDER: VoiceGender = VoiceGender::Male;

// =============================================================================
// Text Type
// =============================================================================

/// How the request text should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextType {
    /// Plain text
    #[serde(rename = "text")]
    Text,
    /// SSML markup wrapped in a `<speak>` root
    #[serde(rename = "ssml")]
    Ssml,
    /// Detect from the text before any provider sees it
    #[default]
    #[serde(rename = "auto")]
    Auto,
}

impl TextType {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Ssml => "ssml",
            Self::Auto => "auto",
        }
    }

    /// Parse from string, with fallback to Auto.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Self::Text,
            "ssml" => Self::Ssml,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for TextType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Voice Gender
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VoiceGender {
    #[default]
    #[serde(rename = "unspecified")]
    Unspecified,
    #[serde(rename = "male")]
    Male,
    #[serde(rename = "female")]
    Female,
    #[serde(rename = "male_child")]
    MaleChild,
    #[serde(rename = "female_child")]
    FemaleChild,
    #[serde(rename = "neutral")]
    Neutral,
}

impl VoiceGender {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "Unspecified",
            Self::Male => "Male",
            Self::Female => "Female",
            Self::MaleChild => "Male_Child",
            Self::FemaleChild => "Female_Child",
            Self::Neutral => "Neutral",
        }
    }

    /// Parse from string, with fallback to Unspecified.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().replace('-', "_").as_str() {
            "male" | "m" => Self::Male,
            "female" | "f" => Self::Female,
            "male_child" => Self::MaleChild,
            "female_child" => Self::FemaleChild,
            "neutral" => Self::Neutral,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for VoiceGender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Voice Selector
// =============================================================================

/// An explicit vendor voice identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoiceId {
    pub id: String,
    /// Synthesis engine, `None` means the provider default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}

impl VoiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            engine: None,
        }
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// A voice id is empty iff its id string is empty; the engine is irrelevant.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }
}

/// Voice constraints resolved through a catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoiceParams {
    #[serde(default)]
    pub language_code: String,
    #[serde(default)]
    pub gender: VoiceGender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}

impl VoiceParams {
    pub fn new(language_code: impl Into<String>, gender: VoiceGender) -> Self {
        Self {
            language_code: language_code.into(),
            gender,
            engine: None,
        }
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Empty iff both the language code and the gender are unset.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.language_code.is_empty() && self.gender == VoiceGender::Unspecified
    }

    /// The installed defaults, `{en-US, Male, engine: None}`.
    pub fn defaults() -> Self {
        Self {
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            gender: DEFAULT_GENDER,
            engine: None,
        }
    }

    /// Requested engine, treating an empty string as "provider default".
    pub fn engine(&self) -> Option<&str> {
        self.engine.as_deref().filter(|e| !e.is_empty())
    }
}

/// Either an explicit voice id or lookup constraints. Both may be populated,
/// in which case a non-empty voice id wins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoiceSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<VoiceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_params: Option<VoiceParams>,
}

impl VoiceSelector {
    pub fn is_voice_id_empty(&self) -> bool {
        self.voice_id.as_ref().is_none_or(VoiceId::is_empty)
    }

    pub fn is_voice_params_empty(&self) -> bool {
        self.voice_params.as_ref().is_none_or(VoiceParams::is_empty)
    }

    /// The explicit voice id, if it is set and non-empty.
    pub fn explicit_voice(&self) -> Option<&VoiceId> {
        self.voice_id.as_ref().filter(|v| !v.is_empty())
    }
}

// =============================================================================
// Prosody
// =============================================================================

/// Speech delivery parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prosody {
    /// 1.0 is normal speed
    pub speaking_rate: f64,
    /// 0.0 is normal, recommended range [-1, 1]
    pub pitch: f64,
    /// Gain in dB, 0.0 is normal
    pub volume: f64,
}

impl Default for Prosody {
    fn default() -> Self {
        Self {
            speaking_rate: 1.0,
            pitch: 0.0,
            volume: 0.0,
        }
    }
}

impl Prosody {
    #[inline]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

// =============================================================================
// Audio Format
// =============================================================================

/// Canonical output formats. Each provider supports a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AudioFormat {
    #[default]
    #[serde(rename = "unspecified")]
    Unspecified,
    #[serde(rename = "mp3")]
    Mp3,
    #[serde(rename = "ogg")]
    Ogg,
    #[serde(rename = "pcm")]
    Pcm,
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "linear16")]
    Linear16,
    #[serde(rename = "mulaw")]
    Mulaw,
    #[serde(rename = "alaw")]
    Alaw,
}

impl AudioFormat {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
            Self::Pcm => "pcm",
            Self::Json => "json",
            Self::Linear16 => "linear16",
            Self::Mulaw => "mulaw",
            Self::Alaw => "alaw",
        }
    }

    /// Parse from string, with fallback to Unspecified.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mp3" | "mpeg" => Self::Mp3,
            "ogg" | "ogg_vorbis" | "ogg_opus" | "opus" => Self::Ogg,
            "pcm" | "raw" => Self::Pcm,
            "json" => Self::Json,
            "linear16" | "wav" => Self::Linear16,
            "mulaw" | "ulaw" => Self::Mulaw,
            "alaw" => Self::Alaw,
            _ => Self::default(),
        }
    }

    /// Canonical file extension, including the leading dot.
    pub fn file_extension(&self) -> Option<&'static str> {
        match self {
            Self::Unspecified => None,
            Self::Mp3 => Some(".mp3"),
            Self::Ogg => Some(".ogg"),
            Self::Pcm => Some(".pcm"),
            Self::Json => Some(".json"),
            // LINEAR16, MULAW and ALAW payloads carry a WAV header
            Self::Linear16 | Self::Mulaw | Self::Alaw => Some(".wav"),
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Vendor-native output format value. Bypasses [`AudioFormat`] validation
/// when set on a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputFormatRaw {
    /// String-valued vendor format, e.g. Polly's `ogg_vorbis`
    Name(String),
    /// Integer-valued vendor format, e.g. a Google `AudioEncoding` code
    Code(i32),
}

impl std::fmt::Display for OutputFormatRaw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::Code(code) => write!(f, "{code}"),
        }
    }
}

// =============================================================================
// Provider
// =============================================================================

/// Known synthesis vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Provider {
    #[default]
    #[serde(rename = "unspecified")]
    Unspecified,
    /// Amazon Polly with S3 storage
    #[serde(rename = "aws")]
    Aws,
    /// Google Cloud Text-to-Speech with GCS storage
    #[serde(rename = "gcp")]
    Google,
}

impl Provider {
    /// Every concrete provider, in declaration order.
    pub const ALL: [Provider; 2] = [Provider::Aws, Provider::Google];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Aws => "aws",
            Self::Google => "gcp",
        }
    }

    /// Parse from string, with fallback to Unspecified.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "aws" | "polly" | "aws-polly" | "amazon" => Self::Aws,
            "gcp" | "google" | "google-cloud" => Self::Google,
            _ => Self::default(),
        }
    }

    #[inline]
    pub fn is_unspecified(&self) -> bool {
        *self == Self::Unspecified
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Request
// =============================================================================

/// A caller-built synthesis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToSpeechRequest {
    pub text: String,
    #[serde(default)]
    pub text_type: TextType,
    #[serde(default)]
    pub voice: VoiceSelector,
    #[serde(default)]
    pub prosody: Prosody,
    /// Vendor-specific effect profiles, passed through untouched
    #[serde(default)]
    pub audio_effects: Vec<String>,
    /// Sample rate in Hz, 0 means vendor default
    #[serde(default)]
    pub sample_rate: u32,
    #[serde(default)]
    pub output_format: AudioFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format_raw: Option<OutputFormatRaw>,
    #[serde(default = "default_add_file_extension")]
    pub add_file_extension: bool,
    #[serde(default)]
    pub provider: Provider,
}

fn default_add_file_extension() -> bool {
    true
}

impl Default for TextToSpeechRequest {
    fn default() -> Self {
        Self {
            text: String::new(),
            text_type: TextType::Auto,
            voice: VoiceSelector::default(),
            prosody: Prosody::default(),
            audio_effects: Vec::new(),
            sample_rate: 0,
            output_format: AudioFormat::Unspecified,
            output_format_raw: None,
            add_file_extension: true,
            provider: Provider::Unspecified,
        }
    }
}

impl TextToSpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_text_type(mut self, text_type: TextType) -> Self {
        self.text_type = text_type;
        self
    }

    pub fn with_voice_id(mut self, voice_id: VoiceId) -> Self {
        self.voice.voice_id = Some(voice_id);
        self
    }

    pub fn with_voice_params(mut self, params: VoiceParams) -> Self {
        self.voice.voice_params = Some(params);
        self
    }

    pub fn with_prosody(mut self, prosody: Prosody) -> Self {
        self.prosody = prosody;
        self
    }

    pub fn with_output_format(mut self, format: AudioFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_output_format_raw(mut self, raw: OutputFormatRaw) -> Self {
        self.output_format_raw = Some(raw);
        self
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_audio_effects(mut self, effects: Vec<String>) -> Self {
        self.audio_effects = effects;
        self
    }

    pub fn with_add_file_extension(mut self, add: bool) -> Self {
        self.add_file_extension = add;
        self
    }

    /// Reject SSML text that lacks a `<speak>` root after trimming.
    pub fn validate(&self) -> T2SResult<()> {
        if self.text_type == TextType::Ssml && !ssml::has_root_tag(&self.text) {
            return Err(T2SError::Validation(
                "text type is SSML but the text is not wrapped in <speak></speak>".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve `TextType::Auto` to `Ssml` or `Text`. No-op otherwise.
    pub fn infer_text_type(&mut self) {
        if self.text_type != TextType::Auto {
            return;
        }
        self.text_type = if ssml::has_root_tag(&self.text) {
            TextType::Ssml
        } else {
            TextType::Text
        };
    }

    /// Back-fill voice lookup constraints.
    ///
    /// Installs the full defaults when neither selector form is set and fills
    /// only the empty language code or gender of a partial `VoiceParams`.
    /// The engine is never touched. A non-empty voice id makes this a no-op.
    pub fn fill_voice_defaults(&mut self) {
        if !self.voice.is_voice_id_empty() {
            return;
        }
        let defaults = VoiceParams::defaults();
        match self.voice.voice_params.as_mut() {
            Some(params) if !params.is_empty() => {
                if params.language_code.is_empty() {
                    params.language_code = defaults.language_code;
                }
                if params.gender == VoiceGender::Unspecified {
                    params.gender = defaults.gender;
                }
            }
            Some(params) => {
                // Both empty: keep a caller-supplied engine
                let engine = params.engine.take();
                *params = VoiceParams { engine, ..defaults };
            }
            None => self.voice.voice_params = Some(defaults),
        }
    }

    /// Voice params after defaulting, for lookups.
    pub fn voice_params(&self) -> VoiceParams {
        self.voice
            .voice_params
            .clone()
            .unwrap_or_else(VoiceParams::defaults)
    }
}

// =============================================================================
// Resolution Products
// =============================================================================

/// A voice one provider offers for the requested constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceCandidate {
    pub voice_id: String,
    pub engine: Option<String>,
    pub provider: Provider,
}

impl VoiceCandidate {
    pub fn new(provider: Provider, voice_id: impl Into<String>, engine: Option<String>) -> Self {
        Self {
            voice_id: voice_id.into(),
            engine,
            provider,
        }
    }

    pub fn to_voice_id(&self) -> VoiceId {
        VoiceId {
            id: self.voice_id.clone(),
            engine: self.engine.clone(),
        }
    }
}

/// A request with provider and voice fixed and text and options transformed
/// for that provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub provider: Provider,
    pub text: String,
    /// Never `Auto`
    pub text_type: TextType,
    pub voice: VoiceId,
    pub prosody: Prosody,
    pub audio_effects: Vec<String>,
    pub sample_rate: u32,
    pub output_format: AudioFormat,
    pub output_format_raw: OutputFormatRaw,
    pub add_file_extension: bool,
}

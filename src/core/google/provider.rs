//! Google Cloud Text-to-Speech adapter implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::auth::GoogleAuth;
use super::config::{
    GOOGLE_PITCH_SEMITONES, GOOGLE_SPEAKING_RATE_RANGE, GOOGLE_SUPPORTED_FORMATS,
    GOOGLE_VOLUME_GAIN_RANGE, GoogleAudioEncoding, GoogleConfig,
};
use crate::config::T2SConfig;
use crate::core::error::{T2SError, T2SResult};
use crate::core::options::{
    AudioFormat, OutputFormatRaw, Prosody, Provider, ResolvedRequest, TextToSpeechRequest,
    TextType, VoiceCandidate, VoiceGender, VoiceParams,
};
use crate::core::provider::{T2SProvider, resolve_common, unique_object_name};
use crate::storage::{self, StorageLocation};

// =============================================================================
// REST Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleVoicesResponse {
    pub voices: Option<Vec<GoogleVoice>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GoogleVoice {
    #[serde(default)]
    pub language_codes: Vec<String>,
    pub name: String,
    pub ssml_gender: Option<String>,
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelectionParams<'a>,
    #[serde(rename = "audioConfig")]
    audio_config: AudioConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum SynthesisInput<'a> {
    Text(&'a str),
    Ssml(&'a str),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelectionParams<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig<'a> {
    audio_encoding: &'static str,
    speaking_rate: f64,
    pitch: f64,
    volume_gain_db: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate_hertz: Option<u32>,
    #[serde(skip_serializing_if = "is_empty_slice")]
    effects_profile_id: &'a [String],
}

fn is_empty_slice(values: &&[String]) -> bool {
    values.is_empty()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

// =============================================================================
// Helper Functions
// =============================================================================

fn gender_to_ssml(gender: VoiceGender) -> Option<&'static str> {
    match gender {
        VoiceGender::Male => Some("MALE"),
        VoiceGender::Female => Some("FEMALE"),
        VoiceGender::Neutral => Some("NEUTRAL"),
        VoiceGender::Unspecified => Some("SSML_VOICE_GENDER_UNSPECIFIED"),
        VoiceGender::MaleChild | VoiceGender::FemaleChild => None,
    }
}

fn gender_matches(voice: &GoogleVoice, gender: VoiceGender) -> bool {
    if gender == VoiceGender::Unspecified {
        return true;
    }
    match (gender_to_ssml(gender), voice.ssml_gender.as_deref()) {
        (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
        _ => false,
    }
}

/// Google has no engine parameter; the voice family in the name
/// (`Standard`, `Wavenet`, `Neural2`, ...) plays that role.
fn engine_matches(voice: &GoogleVoice, engine: Option<&str>) -> bool {
    engine.is_none_or(|engine| {
        voice
            .name
            .to_lowercase()
            .contains(&engine.to_lowercase())
    })
}

fn language_matches(voice: &GoogleVoice, language_code: &str) -> bool {
    voice.language_codes.is_empty()
        || voice
            .language_codes
            .iter()
            .any(|code| code.eq_ignore_ascii_case(language_code))
}

/// First catalog voice matching language, gender and engine.
pub(crate) fn select_voice(voices: &[GoogleVoice], params: &VoiceParams) -> Option<VoiceCandidate> {
    let engine = params.engine();
    voices
        .iter()
        .find(|v| {
            language_matches(v, &params.language_code)
                && gender_matches(v, params.gender)
                && engine_matches(v, engine)
        })
        .map(|v| VoiceCandidate::new(Provider::Google, &v.name, engine.map(str::to_string)))
}

/// `en-US-Neural2-A` speaks `en-US`.
pub(crate) fn language_code_from_voice(name: &str) -> String {
    name.splitn(3, '-').take(2).collect::<Vec<_>>().join("-")
}

/// Canonical prosody in the API's units and bounds.
pub(crate) fn native_prosody(prosody: &Prosody) -> Prosody {
    Prosody {
        speaking_rate: prosody
            .speaking_rate
            .clamp(GOOGLE_SPEAKING_RATE_RANGE.0, GOOGLE_SPEAKING_RATE_RANGE.1),
        pitch: prosody.pitch.clamp(-1.0, 1.0) * GOOGLE_PITCH_SEMITONES,
        volume: prosody
            .volume
            .clamp(GOOGLE_VOLUME_GAIN_RANGE.0, GOOGLE_VOLUME_GAIN_RANGE.1),
    }
}

// =============================================================================
// Google Adapter
// =============================================================================

/// Google Cloud Text-to-Speech adapter over the v1 REST API.
///
/// Prosody is passed natively in `audioConfig`, so plain text is never
/// rewritten into markup. Uploads to GCS go through `object_store`.
pub struct GoogleT2S {
    config: GoogleConfig,
    http: reqwest::Client,
    auth: RwLock<Option<Arc<GoogleAuth>>>,
    request_counter: AtomicU64,
}

impl GoogleT2S {
    pub fn new(config: GoogleConfig) -> T2SResult<Self> {
        config.validate().map_err(T2SError::Configuration)?;

        Ok(Self {
            config,
            http: reqwest::Client::new(),
            auth: RwLock::new(None),
            request_counter: AtomicU64::new(0),
        })
    }

    pub fn from_config(config: &T2SConfig) -> T2SResult<Self> {
        Self::new(GoogleConfig::from_config(config))
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Load credentials.
    pub async fn connect(&self) -> T2SResult<()> {
        let auth = GoogleAuth::from_config(&self.config).await?;
        info!(endpoint = %self.config.endpoint, auth = ?auth, "Google Text-to-Speech client initialized");
        *self.auth.write().await = Some(Arc::new(auth));
        Ok(())
    }

    async fn auth(&self) -> T2SResult<Arc<GoogleAuth>> {
        self.auth
            .read()
            .await
            .clone()
            .ok_or_else(|| T2SError::ProviderNotReady("Google client not initialized".into()))
    }

    fn encoding(raw: &OutputFormatRaw) -> T2SResult<GoogleAudioEncoding> {
        match raw {
            OutputFormatRaw::Code(code) => GoogleAudioEncoding::from_code(*code).ok_or_else(|| {
                T2SError::Transform(format!("Unknown Google audio encoding code: {code}"))
            }),
            OutputFormatRaw::Name(name) => Err(T2SError::Transform(format!(
                "Google audio encodings are numeric, got '{name}'"
            ))),
        }
    }

    async fn error_body(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        format!("Google TTS API error ({status}): {body}")
    }

    pub(crate) async fn list_voices(&self, language_code: &str) -> T2SResult<Vec<GoogleVoice>> {
        let auth = self.auth().await?;
        let builder = self
            .http
            .get(self.config.voices_url())
            .query(&[("languageCode", language_code)]);

        let response = auth
            .authorize(builder)
            .await?
            .send()
            .await
            .map_err(|e| T2SError::Synthesis(format!("Google voices request failed: {e}")))?;

        if !response.status().is_success() {
            let message = Self::error_body(response).await;
            error!(language_code = %language_code, "{message}");
            return Err(T2SError::Synthesis(message));
        }

        let voices: GoogleVoicesResponse = response
            .json()
            .await
            .map_err(|e| T2SError::Synthesis(format!("Invalid Google voices response: {e}")))?;
        Ok(voices.voices.unwrap_or_default())
    }
}

#[async_trait]
impl T2SProvider for GoogleT2S {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn transform_options(&self, request: TextToSpeechRequest) -> T2SResult<ResolvedRequest> {
        let common = resolve_common(self, &request)?;
        Self::encoding(&common.output_format_raw)?;

        Ok(ResolvedRequest {
            provider: Provider::Google,
            text: request.text,
            text_type: common.text_type,
            voice: common.voice,
            prosody: native_prosody(&request.prosody),
            audio_effects: request.audio_effects,
            sample_rate: request.sample_rate,
            output_format: request.output_format,
            output_format_raw: common.output_format_raw,
            add_file_extension: request.add_file_extension,
        })
    }

    async fn find_voice(&self, params: &VoiceParams) -> T2SResult<Option<VoiceCandidate>> {
        let voices = self.list_voices(&params.language_code).await?;
        let candidate = select_voice(&voices, params);
        debug!(
            language_code = %params.language_code,
            gender = %params.gender,
            catalog_size = voices.len(),
            found = candidate.is_some(),
            "Google voice lookup finished"
        );
        Ok(candidate)
    }

    fn supported_audio_formats(&self) -> &'static [AudioFormat] {
        GOOGLE_SUPPORTED_FORMATS
    }

    fn is_own_storage_url(&self, url: &str) -> bool {
        storage::is_google_url(url)
    }

    fn create_temp_destination(&self, bucket: &str, file_name: &str) -> String {
        format!(
            "https://storage.cloud.google.com/{bucket}/{}",
            unique_object_name(file_name)
        )
    }

    fn output_format_raw(&self, format: AudioFormat) -> T2SResult<OutputFormatRaw> {
        GoogleAudioEncoding::from_audio_format(format)
            .map(|e| OutputFormatRaw::Code(e.code()))
            .ok_or(T2SError::UnsupportedFormat {
                provider: Provider::Google,
                format,
            })
    }

    fn audio_format_from_raw(&self, raw: &OutputFormatRaw) -> T2SResult<AudioFormat> {
        Self::encoding(raw).map(GoogleAudioEncoding::to_audio_format)
    }

    async fn synthesize(&self, request: &ResolvedRequest) -> T2SResult<Bytes> {
        let auth = self.auth().await?;
        let encoding = Self::encoding(&request.output_format_raw)?;
        let request_id = self.request_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let language_code = language_code_from_voice(&request.voice.id);

        let body = SynthesizeRequest {
            input: match request.text_type {
                TextType::Ssml => SynthesisInput::Ssml(&request.text),
                TextType::Text | TextType::Auto => SynthesisInput::Text(&request.text),
            },
            voice: VoiceSelectionParams {
                language_code: &language_code,
                name: &request.voice.id,
            },
            audio_config: AudioConfig {
                audio_encoding: encoding.as_str(),
                speaking_rate: request.prosody.speaking_rate,
                pitch: request.prosody.pitch,
                volume_gain_db: request.prosody.volume,
                sample_rate_hertz: Some(request.sample_rate).filter(|r| *r > 0),
                effects_profile_id: &request.audio_effects,
            },
        };

        debug!(
            request_id = request_id,
            text_len = request.text.len(),
            voice = %request.voice.id,
            encoding = %encoding,
            "Synthesizing text with Google Text-to-Speech"
        );

        let builder = self.http.post(self.config.synthesize_url()).json(&body);
        let response = auth
            .authorize(builder)
            .await?
            .send()
            .await
            .map_err(|e| {
                error!(request_id = request_id, error = %e, "Google synthesize request failed");
                T2SError::Synthesis(format!("Google synthesize request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let message = Self::error_body(response).await;
            error!(request_id = request_id, "{message}");
            return Err(T2SError::Synthesis(message));
        }

        let payload: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| T2SError::Synthesis(format!("Invalid Google synthesize response: {e}")))?;
        let audio = BASE64.decode(payload.audio_content.as_bytes()).map_err(|e| {
            T2SError::Synthesis(format!("Google audio content is not valid base64: {e}"))
        })?;

        debug!(
            request_id = request_id,
            audio_bytes = audio.len(),
            "Successfully synthesized audio"
        );
        Ok(Bytes::from(audio))
    }

    async fn upload_file(&self, audio: Bytes, destination: &str) -> T2SResult<()> {
        let StorageLocation::Google { bucket, key } = StorageLocation::parse(destination)? else {
            return Err(T2SError::Upload(format!(
                "{destination} is not a GCS location"
            )));
        };

        let store = storage::gcs_store(&bucket, &self.config.storage)?;
        storage::put_object(store.as_ref(), &key, audio).await
    }

    async fn close(&self) -> T2SResult<()> {
        if self.auth.write().await.take().is_some() {
            debug!("Google Text-to-Speech client released");
        }
        Ok(())
    }
}

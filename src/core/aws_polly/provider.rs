//! Amazon Polly adapter implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_polly::Client as PollyClient;
use aws_sdk_polly::config::Builder as PollyConfigBuilder;
use aws_sdk_polly::primitives::ByteStream;
use aws_sdk_polly::types::{
    Engine, LanguageCode, OutputFormat, TextType as PollyTextType, Voice,
    VoiceId as PollyVoiceId,
};
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::config::{
    AwsPollyConfig, MAX_TOTAL_LENGTH, POLLY_SUPPORTED_FORMATS, PollyEngine, PollyOutputFormat,
};
use crate::config::T2SConfig;
use crate::core::error::{T2SError, T2SResult};
use crate::core::options::{
    AudioFormat, OutputFormatRaw, Provider, ResolvedRequest, TextToSpeechRequest, TextType,
    VoiceCandidate, VoiceGender, VoiceParams,
};
use crate::core::provider::{T2SProvider, resolve_common, unique_object_name};
use crate::core::ssml;
use crate::storage::{self, StorageLocation};

// =============================================================================
// Helper Functions
// =============================================================================

fn text_type_to_sdk(text_type: TextType) -> PollyTextType {
    match text_type {
        TextType::Ssml => PollyTextType::Ssml,
        TextType::Text | TextType::Auto => PollyTextType::Text,
    }
}

/// Polly only catalogs adult male and female voices.
fn gender_matches(voice: &Voice, gender: VoiceGender) -> bool {
    if gender == VoiceGender::Unspecified {
        return true;
    }
    voice
        .gender()
        .is_some_and(|g| g.as_str().eq_ignore_ascii_case(gender.as_str()))
}

fn engine_matches(voice: &Voice, engine: Option<&str>) -> bool {
    let Some(engine) = engine else {
        return true;
    };
    let wanted = PollyEngine::parse(engine)
        .map(|e| e.as_str().to_string())
        .unwrap_or_else(|| engine.to_lowercase());
    voice
        .supported_engines()
        .iter()
        .any(|e| e.as_str().eq_ignore_ascii_case(&wanted))
}

/// First catalog voice matching gender and engine.
pub(crate) fn select_voice(voices: &[Voice], params: &VoiceParams) -> Option<VoiceCandidate> {
    let engine = params.engine();
    voices
        .iter()
        .filter(|v| gender_matches(v, params.gender) && engine_matches(v, engine))
        .find_map(|v| {
            v.id().map(|id| {
                VoiceCandidate::new(Provider::Aws, id.as_str(), engine.map(str::to_string))
            })
        })
}

// =============================================================================
// Amazon Polly Adapter
// =============================================================================

/// Amazon Polly adapter using the AWS SDK.
///
/// The SDK client is created by [`connect`](Self::connect) and dropped by
/// [`close`](T2SProvider::close). Uploads to S3 go through `object_store`.
pub struct AwsPollyT2S {
    config: AwsPollyConfig,
    /// AWS Polly client (initialized on connect)
    client: Arc<RwLock<Option<PollyClient>>>,
    /// Request counter for logging
    request_counter: AtomicU64,
}

impl AwsPollyT2S {
    pub fn new(config: AwsPollyConfig) -> T2SResult<Self> {
        config.validate().map_err(T2SError::Configuration)?;

        Ok(Self {
            config,
            client: Arc::new(RwLock::new(None)),
            request_counter: AtomicU64::new(0),
        })
    }

    pub fn from_config(config: &T2SConfig) -> T2SResult<Self> {
        Self::new(AwsPollyConfig::from_config(config))
    }

    pub fn config(&self) -> &AwsPollyConfig {
        &self.config
    }

    /// Build the SDK client.
    pub async fn connect(&self) -> T2SResult<()> {
        let client = self.init_client().await?;
        *self.client.write().await = Some(client);
        info!(region = %self.config.region, "Amazon Polly client initialized");
        Ok(())
    }

    async fn init_client(&self) -> T2SResult<PollyClient> {
        let region = Region::new(self.config.region.clone());

        if let (Some(access_key), Some(secret_key)) = (
            &self.config.aws_access_key_id,
            &self.config.aws_secret_access_key,
        ) {
            let credentials = Credentials::new(
                access_key,
                secret_key,
                self.config.aws_session_token.clone(),
                None,
                "t2s-orchestrator",
            );
            let polly_config = PollyConfigBuilder::new()
                .behavior_version(BehaviorVersion::latest())
                .region(region)
                .credentials_provider(credentials)
                .build();
            return Ok(PollyClient::from_conf(polly_config));
        }

        // Default credential chain (environment, profile, IAM roles)
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;
        Ok(PollyClient::new(&aws_config))
    }

    async fn client(&self) -> T2SResult<PollyClient> {
        self.client
            .read()
            .await
            .clone()
            .ok_or_else(|| T2SError::ProviderNotReady("Polly client not initialized".into()))
    }

    fn polly_format(raw: &OutputFormatRaw) -> T2SResult<PollyOutputFormat> {
        match raw {
            OutputFormatRaw::Name(name) => PollyOutputFormat::parse(name).ok_or_else(|| {
                T2SError::Transform(format!("Unknown Polly output format: {name}"))
            }),
            OutputFormatRaw::Code(code) => Err(T2SError::Transform(format!(
                "Polly output formats are named, got numeric value {code}"
            ))),
        }
    }
}

#[async_trait]
impl T2SProvider for AwsPollyT2S {
    fn provider(&self) -> Provider {
        Provider::Aws
    }

    fn transform_options(&self, request: TextToSpeechRequest) -> T2SResult<ResolvedRequest> {
        let common = resolve_common(self, &request)?;
        Self::polly_format(&common.output_format_raw)?;

        let mut voice = common.voice;
        if let Some(engine) = voice.engine.as_deref().filter(|e| !e.is_empty()) {
            let parsed = PollyEngine::parse(engine).ok_or_else(|| {
                T2SError::Transform(format!("Unknown Polly engine: {engine}"))
            })?;
            voice.engine = Some(parsed.as_str().to_string());
        }

        let (text, text_type) = if request.prosody.is_default() {
            (request.text, common.text_type)
        } else {
            let text = ssml::apply_prosody(
                &request.text,
                common.text_type,
                &request.prosody,
                self.config.prosody_strategy,
            );
            (text, TextType::Ssml)
        };

        Ok(ResolvedRequest {
            provider: Provider::Aws,
            text,
            text_type,
            voice,
            prosody: request.prosody,
            audio_effects: request.audio_effects,
            sample_rate: request.sample_rate,
            output_format: request.output_format,
            output_format_raw: common.output_format_raw,
            add_file_extension: request.add_file_extension,
        })
    }

    async fn find_voice(&self, params: &VoiceParams) -> T2SResult<Option<VoiceCandidate>> {
        let client = self.client().await?;
        let mut voices = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = client
                .describe_voices()
                .language_code(LanguageCode::from(params.language_code.as_str()))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    error!(language_code = %params.language_code, error = %e, "Polly DescribeVoices failed");
                    T2SError::Synthesis(format!("Polly DescribeVoices error: {e}"))
                })?;

            voices.extend(response.voices().iter().cloned());
            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        let candidate = select_voice(&voices, params);
        debug!(
            language_code = %params.language_code,
            gender = %params.gender,
            catalog_size = voices.len(),
            found = candidate.is_some(),
            "Polly voice lookup finished"
        );
        Ok(candidate)
    }

    fn supported_audio_formats(&self) -> &'static [AudioFormat] {
        POLLY_SUPPORTED_FORMATS
    }

    fn is_own_storage_url(&self, url: &str) -> bool {
        storage::is_aws_url(url)
    }

    fn create_temp_destination(&self, bucket: &str, file_name: &str) -> String {
        format!(
            "https://{bucket}.s3.amazonaws.com/{}",
            unique_object_name(file_name)
        )
    }

    fn output_format_raw(&self, format: AudioFormat) -> T2SResult<OutputFormatRaw> {
        PollyOutputFormat::from_audio_format(format)
            .map(|f| OutputFormatRaw::Name(f.as_str().to_string()))
            .ok_or(T2SError::UnsupportedFormat {
                provider: Provider::Aws,
                format,
            })
    }

    fn audio_format_from_raw(&self, raw: &OutputFormatRaw) -> T2SResult<AudioFormat> {
        Self::polly_format(raw).map(PollyOutputFormat::to_audio_format)
    }

    async fn synthesize(&self, request: &ResolvedRequest) -> T2SResult<Bytes> {
        let client = self.client().await?;

        if request.text.chars().count() > MAX_TOTAL_LENGTH {
            return Err(T2SError::Synthesis(format!(
                "Text length {} exceeds Polly maximum of {} characters",
                request.text.chars().count(),
                MAX_TOTAL_LENGTH
            )));
        }

        let format = Self::polly_format(&request.output_format_raw)?;
        let request_id = self.request_counter.fetch_add(1, Ordering::Relaxed) + 1;

        debug!(
            request_id = request_id,
            text_len = request.text.len(),
            voice = %request.voice.id,
            format = %format,
            "Synthesizing text with Amazon Polly"
        );

        let mut call = client
            .synthesize_speech()
            .text(&request.text)
            .voice_id(PollyVoiceId::from(request.voice.id.as_str()))
            .output_format(OutputFormat::from(format.as_str()))
            .text_type(text_type_to_sdk(request.text_type));

        if let Some(engine) = request.voice.engine.as_deref() {
            call = call.engine(Engine::from(engine));
        }
        if request.sample_rate > 0 {
            call = call.sample_rate(request.sample_rate.to_string());
        }
        if !request.audio_effects.is_empty() {
            warn!(
                request_id = request_id,
                effects = ?request.audio_effects,
                "Polly has no audio effect profiles, ignoring"
            );
        }

        let response = call.send().await.map_err(|e| {
            error!(request_id = request_id, error = %e, "Polly API error");
            T2SError::Synthesis(format!("Polly API error: {e}"))
        })?;

        let audio_stream: ByteStream = response.audio_stream;
        let audio_bytes = audio_stream.collect().await.map_err(|e| {
            error!(request_id = request_id, error = %e, "Failed to read audio stream");
            T2SError::Synthesis(format!("Failed to read Polly audio stream: {e}"))
        })?;
        let bytes = audio_bytes.into_bytes();

        debug!(
            request_id = request_id,
            audio_bytes = bytes.len(),
            "Successfully synthesized audio"
        );
        Ok(bytes)
    }

    async fn upload_file(&self, audio: Bytes, destination: &str) -> T2SResult<()> {
        let StorageLocation::Aws {
            bucket,
            key,
            region,
        } = StorageLocation::parse(destination)?
        else {
            return Err(T2SError::Upload(format!(
                "{destination} is not an S3 location"
            )));
        };

        let store = storage::s3_store(&bucket, &region, &self.config.storage)?;
        storage::put_object(store.as_ref(), &key, audio).await
    }

    async fn close(&self) -> T2SResult<()> {
        if self.client.write().await.take().is_some() {
            debug!("Amazon Polly client released");
        }
        Ok(())
    }
}

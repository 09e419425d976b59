//! Provider capability adapter interface and factory.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;

use super::aws_polly::AwsPollyT2S;
use super::error::{T2SError, T2SResult};
use super::google::GoogleT2S;
use super::options::{
    AudioFormat, OutputFormatRaw, Provider, ResolvedRequest, TextToSpeechRequest, TextType,
    VoiceCandidate, VoiceId, VoiceParams,
};
use super::ssml;
use crate::config::T2SConfig;

/// Capability interface every vendor adapter implements.
///
/// Adapters are owned by the orchestrator's registry and shared across
/// concurrent voice lookups, so implementations must be `Send + Sync`.
#[async_trait]
pub trait T2SProvider: Send + Sync {
    /// The provider this adapter speaks for.
    fn provider(&self) -> Provider;

    /// Rewrite a request for this vendor.
    ///
    /// Embeds prosody in markup or native call parameters, resolves
    /// `output_format_raw` from `output_format` when unset, and fixes the voice.
    /// The request must carry a non-empty voice id and a resolved text type.
    ///
    /// # Errors
    /// `UnsupportedFormat` when the vendor has no mapping for the requested
    /// format, `Transform` for any other embedding failure.
    fn transform_options(&self, request: TextToSpeechRequest) -> T2SResult<ResolvedRequest>;

    /// Look up a voice for the constraints. `Ok(None)` means no match.
    async fn find_voice(&self, params: &VoiceParams) -> T2SResult<Option<VoiceCandidate>>;

    fn supported_audio_formats(&self) -> &'static [AudioFormat];

    fn supports_format(&self, format: AudioFormat) -> bool {
        self.supported_audio_formats().contains(&format)
    }

    /// True when `url` points at this vendor's object storage.
    fn is_own_storage_url(&self, url: &str) -> bool;

    /// Staging location in this vendor's storage for `file_name`.
    fn create_temp_destination(&self, bucket: &str, file_name: &str) -> String;

    /// Vendor value for a canonical format.
    fn output_format_raw(&self, format: AudioFormat) -> T2SResult<OutputFormatRaw>;

    /// Canonical format for a vendor value.
    fn audio_format_from_raw(&self, raw: &OutputFormatRaw) -> T2SResult<AudioFormat>;

    async fn synthesize(&self, request: &ResolvedRequest) -> T2SResult<Bytes>;

    /// Upload audio to a URL in this vendor's own storage.
    async fn upload_file(&self, audio: Bytes, destination: &str) -> T2SResult<()>;

    /// Release the vendor client. Further calls fail with `ProviderNotReady`.
    async fn close(&self) -> T2SResult<()>;
}

/// Create and connect the adapter for a provider.
///
/// # Errors
/// `Configuration` for `Provider::Unspecified` or when the vendor client
/// cannot be built from `config`.
pub async fn create_provider(
    provider: Provider,
    config: &T2SConfig,
) -> T2SResult<Arc<dyn T2SProvider>> {
    match provider {
        Provider::Aws => {
            let adapter = AwsPollyT2S::from_config(config)?;
            adapter.connect().await?;
            Ok(Arc::new(adapter))
        }
        Provider::Google => {
            let adapter = GoogleT2S::from_config(config)?;
            adapter.connect().await?;
            Ok(Arc::new(adapter))
        }
        Provider::Unspecified => Err(T2SError::Configuration(
            "Cannot create an adapter for an unspecified provider. Supported providers: aws, gcp"
                .to_string(),
        )),
    }
}

/// Request fields every adapter resolves the same way.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonResolution {
    pub voice: VoiceId,
    pub text_type: TextType,
    pub output_format_raw: OutputFormatRaw,
}

/// Fix the voice, resolve `Auto` text and map the output format.
///
/// A caller-supplied `output_format_raw` is taken as-is.
pub fn resolve_common<P: T2SProvider + ?Sized>(
    adapter: &P,
    request: &TextToSpeechRequest,
) -> T2SResult<CommonResolution> {
    let voice = request.voice.explicit_voice().cloned().ok_or_else(|| {
        T2SError::Transform(format!(
            "{} requires a resolved voice id before transforming options",
            adapter.provider()
        ))
    })?;

    let text_type = match request.text_type {
        TextType::Auto if ssml::has_root_tag(&request.text) => TextType::Ssml,
        TextType::Auto => TextType::Text,
        resolved => resolved,
    };

    let output_format_raw = match &request.output_format_raw {
        Some(raw) => raw.clone(),
        None => adapter.output_format_raw(request.output_format)?,
    };

    Ok(CommonResolution {
        voice,
        text_type,
        output_format_raw,
    })
}

/// `file_name` suffixed with the current Unix time in nanoseconds.
pub fn unique_object_name(file_name: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{file_name}{nanos}")
}

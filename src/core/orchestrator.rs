//! Synthesis orchestrator
//!
//! [`T2SClient`] runs one request end to end:
//!
//! 1. validate the request and resolve `Auto` text type
//! 2. fix provider and voice, by concurrent lookup plus selection when no
//!    provider is pinned, or by a direct lookup on the pinned provider
//! 3. transform options for the chosen adapter and synthesize
//! 4. append the file extension and route the audio to its destination
//!
//! Adapters are created lazily and cached for the lifetime of the client;
//! call [`T2SClient::shutdown`] to close them.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use super::error::{T2SError, T2SResult};
use super::options::{ResolvedRequest, TextToSpeechRequest, VoiceCandidate};
use super::provider::T2SProvider;
use super::registry::ProviderRegistry;
use super::selection::select_candidate;
use super::voice_resolution::{candidates_for_voice_id, resolve_voice_on, resolve_voices};
use crate::config::T2SConfig;
use crate::storage::{CloudStorage, ObjectStorage, StorageLocation, is_cloud_url};

/// Audio produced for a request, before routing.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub request: ResolvedRequest,
    pub audio: Bytes,
}

pub struct T2SClient {
    config: Arc<T2SConfig>,
    registry: ProviderRegistry,
    storage: Arc<dyn ObjectStorage>,
    http: reqwest::Client,
}

impl T2SClient {
    /// Client with `object_store` backed storage built from `config`.
    pub fn new(config: T2SConfig) -> T2SResult<Self> {
        let storage = Arc::new(CloudStorage::from_config(&config));
        Self::with_storage(config, storage)
    }

    /// Client routing non-provider destinations through `storage`.
    pub fn with_storage(config: T2SConfig, storage: Arc<dyn ObjectStorage>) -> T2SResult<Self> {
        config.validate().map_err(T2SError::Configuration)?;
        let config = Arc::new(config);

        Ok(Self {
            registry: ProviderRegistry::new(config.clone()),
            config,
            storage,
            http: reqwest::Client::new(),
        })
    }

    pub fn config(&self) -> &T2SConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Fix provider and voice for `request` without synthesizing.
    pub async fn resolve_voice(
        &self,
        request: TextToSpeechRequest,
        destination: &str,
    ) -> T2SResult<VoiceCandidate> {
        let (adapter, request) = self.resolve(request, destination).await?;
        let voice = request
            .voice
            .explicit_voice()
            .cloned()
            .unwrap_or_default();
        Ok(VoiceCandidate::new(adapter.provider(), voice.id, voice.engine))
    }

    /// Synthesize `request` and return the audio without routing it.
    ///
    /// `destination` only steers provider selection toward its own storage.
    pub async fn synthesize_audio(
        &self,
        request: TextToSpeechRequest,
        destination: &str,
    ) -> T2SResult<SynthesizedAudio> {
        let (adapter, request) = self.resolve(request, destination).await?;
        self.synthesize_with(adapter.as_ref(), request).await
    }

    /// Synthesize `request` into `destination`.
    ///
    /// Returns the final destination, which carries the audio file extension
    /// when the request asks for one.
    pub async fn synthesize_direct(
        &self,
        request: TextToSpeechRequest,
        destination: &str,
    ) -> T2SResult<String> {
        let (adapter, request) = self.resolve(request, destination).await?;
        let SynthesizedAudio { request, audio } =
            self.synthesize_with(adapter.as_ref(), request).await?;

        let destination = final_destination(adapter.as_ref(), &request, destination);
        self.route(adapter.as_ref(), audio, &destination).await?;

        info!(
            provider = %request.provider,
            voice_id = %request.voice.id,
            destination = %destination,
            "Synthesis complete"
        );
        Ok(destination)
    }

    /// Read the text from `source` and synthesize it into `destination`.
    ///
    /// `source` may be an S3 or GCS URL, an `http(s)` URL or a local path.
    /// The text of `request` is replaced by the source contents.
    pub async fn synthesize_from_source(
        &self,
        source: &str,
        destination: &str,
        mut request: TextToSpeechRequest,
    ) -> T2SResult<String> {
        request.text = self.read_source(source).await?;
        self.synthesize_direct(request, destination).await
    }

    /// Close every adapter created by this client.
    pub async fn shutdown(&self) -> T2SResult<()> {
        self.registry.close_all().await
    }

    async fn resolve(
        &self,
        mut request: TextToSpeechRequest,
        destination: &str,
    ) -> T2SResult<(Arc<dyn T2SProvider>, TextToSpeechRequest)> {
        request.validate()?;
        request.infer_text_type();
        let timeout = self.config.voice_lookup_timeout();

        if request.provider.is_unspecified() {
            let adapters = self.registry.available().await;
            if adapters.is_empty() {
                return Err(T2SError::Configuration(
                    "No provider adapter could be created".to_string(),
                ));
            }

            let candidates = match request.voice.explicit_voice().cloned() {
                Some(voice) => candidates_for_voice_id(&adapters, &voice),
                None => {
                    request.fill_voice_defaults();
                    resolve_voices(&adapters, &request.voice_params(), timeout).await?
                }
            };

            let Some(candidate) =
                select_candidate(candidates, &adapters, destination, request.output_format)
            else {
                let params = request.voice_params();
                return Err(T2SError::VoiceNotFound {
                    language_code: params.language_code.clone(),
                    gender: params.gender,
                    engine: params.engine().unwrap_or_default().to_string(),
                    tried: adapters.iter().map(|a| a.provider()).collect(),
                });
            };

            let adapter = adapters
                .into_iter()
                .find(|a| a.provider() == candidate.provider)
                .ok_or_else(|| {
                    T2SError::Configuration(format!(
                        "No adapter for selected provider {}",
                        candidate.provider
                    ))
                })?;
            request.provider = candidate.provider;
            request.voice.voice_id = Some(candidate.to_voice_id());
            return Ok((adapter, request));
        }

        let adapter = self.registry.get_or_create(request.provider).await?;
        if request.voice.is_voice_id_empty() {
            request.fill_voice_defaults();
            let candidate =
                resolve_voice_on(adapter.as_ref(), &request.voice_params(), timeout).await?;
            request.voice.voice_id = Some(candidate.to_voice_id());
        }
        Ok((adapter, request))
    }

    async fn synthesize_with(
        &self,
        adapter: &dyn T2SProvider,
        request: TextToSpeechRequest,
    ) -> T2SResult<SynthesizedAudio> {
        let request = adapter.transform_options(request)?;
        debug!(
            provider = %request.provider,
            voice_id = %request.voice.id,
            text_type = %request.text_type,
            output_format = %request.output_format_raw,
            "Dispatching synthesis"
        );
        let audio = adapter.synthesize(&request).await?;
        Ok(SynthesizedAudio { request, audio })
    }

    async fn route(
        &self,
        adapter: &dyn T2SProvider,
        audio: Bytes,
        destination: &str,
    ) -> T2SResult<()> {
        let provider = adapter.provider();
        if adapter.is_own_storage_url(destination) {
            debug!(provider = %provider, destination = %destination, "Uploading to provider storage");
            return adapter.upload_file(audio, destination).await;
        }

        let location = StorageLocation::parse(destination)?;
        if location.is_local() {
            return self.storage.upload(&location, audio).await;
        }

        let Some(bucket) = self.config.temp_bucket(provider) else {
            debug!(provider = %provider, destination = %destination, "Uploading through storage collaborator");
            return self.storage.upload(&location, audio).await;
        };

        let temp_url = adapter.create_temp_destination(bucket, &location.file_name());
        let temp = StorageLocation::parse(&temp_url)?;
        adapter.upload_file(audio, &temp_url).await?;
        debug!(provider = %provider, temp = %temp_url, destination = %destination, "Staged audio in provider storage");

        let copied = self.storage.copy(&temp, &location).await;
        if self.config.delete_temp_file
            && let Err(e) = self.storage.delete(&temp).await
        {
            warn!(temp = %temp_url, error = %e, "Failed to delete staged audio");
        }
        copied
    }

    async fn read_source(&self, source: &str) -> T2SResult<String> {
        let data = if is_cloud_url(source) {
            self.storage.download(&StorageLocation::parse(source)?).await?
        } else if source.starts_with("http://") || source.starts_with("https://") {
            let response = self
                .http
                .get(source)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| T2SError::Download(format!("Failed to fetch {source}: {e}")))?;
            response
                .bytes()
                .await
                .map_err(|e| T2SError::Download(format!("Failed to read {source}: {e}")))?
        } else {
            Bytes::from(tokio::fs::read(source).await.map_err(|e| {
                T2SError::Download(format!("Failed to read {source}: {e}"))
            })?)
        };

        String::from_utf8(data.to_vec())
            .map_err(|_| T2SError::Validation(format!("Source {source} is not UTF-8 text")))
    }
}

/// `destination` with the audio extension appended when requested and not
/// already present.
///
/// The format is recovered from the vendor value through the adapter; when
/// that fails the destination is returned unchanged.
pub fn final_destination(
    adapter: &dyn T2SProvider,
    request: &ResolvedRequest,
    destination: &str,
) -> String {
    if !request.add_file_extension {
        return destination.to_string();
    }

    let format = match adapter.audio_format_from_raw(&request.output_format_raw) {
        Ok(format) => format,
        Err(e) => {
            warn!(
                provider = %request.provider,
                output_format = %request.output_format_raw,
                error = %e,
                "Cannot determine file extension; leaving destination unchanged"
            );
            return destination.to_string();
        }
    };

    match format.file_extension() {
        Some(ext) if !destination.ends_with(ext) => format!("{destination}{ext}"),
        _ => destination.to_string(),
    }
}

impl std::fmt::Debug for T2SClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("T2SClient")
            .field("enabled_providers", &self.config.enabled_providers)
            .finish()
    }
}

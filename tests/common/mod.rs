//! Shared test doubles for the integration tests.
//!
//! - `MockProvider`: scriptable adapter that records every call
//! - `InMemoryStorage`: storage collaborator keyed by location URL

// Each test binary uses a different subset of the helpers
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use t2s_orchestrator::core::provider::resolve_common;
use t2s_orchestrator::storage::{self, ObjectStorage, StorageLocation};
use t2s_orchestrator::{
    AudioFormat, OutputFormatRaw, Provider, ResolvedRequest, T2SConfig, T2SError, T2SProvider,
    T2SResult, TextToSpeechRequest, VoiceCandidate, VoiceParams,
};

pub const MOCK_AUDIO: &[u8] = b"mock-audio";

// =============================================================================
// Mock Provider
// =============================================================================

pub struct MockProvider {
    provider: Provider,
    voice: Option<String>,
    formats: &'static [AudioFormat],
    lookup_delay: Duration,
    fail_lookup: bool,
    fail_close: bool,
    storage: Option<Arc<InMemoryStorage>>,

    pub lookups: Mutex<Vec<VoiceParams>>,
    pub synthesized: Mutex<Vec<ResolvedRequest>>,
    pub uploads: Mutex<Vec<String>>,
    pub closes: AtomicUsize,
}

impl MockProvider {
    /// Adapter offering `voice` for every lookup, or nothing when `None`.
    pub fn new(provider: Provider, voice: Option<&str>) -> Self {
        Self {
            provider,
            voice: voice.map(str::to_string),
            formats: &[AudioFormat::Mp3, AudioFormat::Ogg],
            lookup_delay: Duration::ZERO,
            fail_lookup: false,
            fail_close: false,
            storage: None,
            lookups: Mutex::new(Vec::new()),
            synthesized: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
        }
    }

    pub fn with_formats(mut self, formats: &'static [AudioFormat]) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = delay;
        self
    }

    pub fn failing_lookup(mut self) -> Self {
        self.fail_lookup = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Mirror uploads into `storage` so staged objects can be copied.
    pub fn with_storage(mut self, storage: Arc<InMemoryStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.lock().len()
    }

    pub fn last_synthesized(&self) -> Option<ResolvedRequest> {
        self.synthesized.lock().last().cloned()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl T2SProvider for MockProvider {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn transform_options(&self, request: TextToSpeechRequest) -> T2SResult<ResolvedRequest> {
        let common = resolve_common(self, &request)?;
        Ok(ResolvedRequest {
            provider: self.provider,
            text: request.text,
            text_type: common.text_type,
            voice: common.voice,
            prosody: request.prosody,
            audio_effects: request.audio_effects,
            sample_rate: request.sample_rate,
            output_format: request.output_format,
            output_format_raw: common.output_format_raw,
            add_file_extension: request.add_file_extension,
        })
    }

    async fn find_voice(&self, params: &VoiceParams) -> T2SResult<Option<VoiceCandidate>> {
        self.lookups.lock().push(params.clone());
        if !self.lookup_delay.is_zero() {
            tokio::time::sleep(self.lookup_delay).await;
        }
        if self.fail_lookup {
            return Err(T2SError::Synthesis(format!("{} catalog unavailable", self.provider)));
        }
        Ok(self.voice.as_ref().map(|id| {
            VoiceCandidate::new(self.provider, id, params.engine().map(str::to_string))
        }))
    }

    fn supported_audio_formats(&self) -> &'static [AudioFormat] {
        self.formats
    }

    fn is_own_storage_url(&self, url: &str) -> bool {
        match self.provider {
            Provider::Aws => storage::is_aws_url(url),
            Provider::Google => storage::is_google_url(url),
            Provider::Unspecified => false,
        }
    }

    fn create_temp_destination(&self, bucket: &str, file_name: &str) -> String {
        match self.provider {
            Provider::Google => format!("gs://{bucket}/{file_name}.tmp"),
            _ => format!("s3://{bucket}/{file_name}.tmp"),
        }
    }

    fn output_format_raw(&self, format: AudioFormat) -> T2SResult<OutputFormatRaw> {
        match format {
            AudioFormat::Unspecified => Ok(OutputFormatRaw::Name("mp3".into())),
            f if self.supports_format(f) => Ok(OutputFormatRaw::Name(f.as_str().into())),
            f => Err(T2SError::UnsupportedFormat {
                provider: self.provider,
                format: f,
            }),
        }
    }

    fn audio_format_from_raw(&self, raw: &OutputFormatRaw) -> T2SResult<AudioFormat> {
        match raw {
            OutputFormatRaw::Name(name) => match AudioFormat::from_str_or_default(name) {
                AudioFormat::Unspecified => {
                    Err(T2SError::Transform(format!("unknown output format {name}")))
                }
                format => Ok(format),
            },
            OutputFormatRaw::Code(code) => {
                Err(T2SError::Transform(format!("unknown output format {code}")))
            }
        }
    }

    async fn synthesize(&self, request: &ResolvedRequest) -> T2SResult<Bytes> {
        self.synthesized.lock().push(request.clone());
        Ok(Bytes::from_static(MOCK_AUDIO))
    }

    async fn upload_file(&self, audio: Bytes, destination: &str) -> T2SResult<()> {
        self.uploads.lock().push(destination.to_string());
        if let Some(storage) = &self.storage {
            storage
                .upload(&StorageLocation::parse(destination)?, audio)
                .await?;
        }
        Ok(())
    }

    async fn close(&self) -> T2SResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(T2SError::Configuration(format!(
                "{} client refused to close",
                self.provider
            )));
        }
        Ok(())
    }
}

// =============================================================================
// In-Memory Storage
// =============================================================================

#[derive(Default)]
pub struct InMemoryStorage {
    objects: Mutex<HashMap<String, Bytes>>,
    pub operations: Mutex<Vec<String>>,
    fail_delete: bool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_delete() -> Self {
        Self {
            fail_delete: true,
            ..Self::default()
        }
    }

    pub fn insert(&self, url: &str, data: &[u8]) {
        let location = StorageLocation::parse(url).unwrap();
        self.objects
            .lock()
            .insert(location.to_string(), Bytes::copy_from_slice(data));
    }

    pub fn get(&self, url: &str) -> Option<Bytes> {
        let location = StorageLocation::parse(url).unwrap();
        self.objects.lock().get(&location.to_string()).cloned()
    }

    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().clone()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn upload(&self, location: &StorageLocation, data: Bytes) -> T2SResult<()> {
        self.operations.lock().push(format!("upload {location}"));
        self.objects.lock().insert(location.to_string(), data);
        Ok(())
    }

    async fn download(&self, location: &StorageLocation) -> T2SResult<Bytes> {
        self.operations.lock().push(format!("download {location}"));
        self.objects
            .lock()
            .get(&location.to_string())
            .cloned()
            .ok_or_else(|| T2SError::Download(format!("Object not found: {location}")))
    }

    async fn copy(&self, from: &StorageLocation, to: &StorageLocation) -> T2SResult<()> {
        self.operations.lock().push(format!("copy {from} {to}"));
        let mut objects = self.objects.lock();
        let data = objects
            .get(&from.to_string())
            .cloned()
            .ok_or_else(|| T2SError::Download(format!("Object not found: {from}")))?;
        objects.insert(to.to_string(), data);
        Ok(())
    }

    async fn delete(&self, location: &StorageLocation) -> T2SResult<()> {
        self.operations.lock().push(format!("delete {location}"));
        if self.fail_delete {
            return Err(T2SError::Upload(format!("Failed to delete {location}")));
        }
        self.objects.lock().remove(&location.to_string());
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Configuration enabling only `providers`.
pub fn config_for(providers: &[Provider]) -> T2SConfig {
    let mut config = T2SConfig::default();
    config.enabled_providers = providers.to_vec();
    config
}

pub fn adapters(mocks: &[&Arc<MockProvider>]) -> Vec<Arc<dyn T2SProvider>> {
    mocks
        .iter()
        .map(|m| (*m).clone() as Arc<dyn T2SProvider>)
        .collect()
}

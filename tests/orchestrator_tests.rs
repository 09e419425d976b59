//! End-to-end pipeline tests against mock adapters.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{InMemoryStorage, MOCK_AUDIO, MockProvider, config_for};
use t2s_orchestrator::{
    AudioFormat, OutputFormatRaw, Prosody, Provider, T2SClient, T2SConfig, T2SError,
    TextToSpeechRequest, TextType, VoiceGender, VoiceId, VoiceParams,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    client: T2SClient,
    storage: Arc<InMemoryStorage>,
    aws: Arc<MockProvider>,
    google: Arc<MockProvider>,
}

async fn harness_with(
    config: T2SConfig,
    storage: Arc<InMemoryStorage>,
    aws: MockProvider,
    google: MockProvider,
) -> Harness {
    let aws = Arc::new(aws.with_storage(storage.clone()));
    let google = Arc::new(google.with_storage(storage.clone()));
    let client = T2SClient::with_storage(config, storage.clone()).unwrap();
    client.registry().register(aws.clone()).await;
    client.registry().register(google.clone()).await;
    Harness {
        client,
        storage,
        aws,
        google,
    }
}

async fn harness(aws: MockProvider, google: MockProvider) -> Harness {
    harness_with(
        config_for(&[Provider::Aws, Provider::Google]),
        Arc::new(InMemoryStorage::new()),
        aws,
        google,
    )
    .await
}

fn both_match() -> (MockProvider, MockProvider) {
    (
        MockProvider::new(Provider::Aws, Some("Joanna")),
        MockProvider::new(Provider::Google, Some("en-US-Standard-C")),
    )
}

// =============================================================================
// Resolution
// =============================================================================

#[tokio::test]
async fn test_selects_only_provider_with_voice() {
    let h = harness(
        MockProvider::new(Provider::Aws, None),
        MockProvider::new(Provider::Google, Some("en-US-Standard-C")),
    )
    .await;

    let destination = h
        .client
        .synthesize_direct(TextToSpeechRequest::new("Hello"), "s3://bucket/out")
        .await
        .unwrap();

    assert_eq!(destination, "s3://bucket/out.mp3");
    let synthesized = h.google.last_synthesized().unwrap();
    assert_eq!(synthesized.voice.id, "en-US-Standard-C");
    assert!(h.aws.last_synthesized().is_none());
    assert_eq!(
        h.storage.get("s3://bucket/out.mp3").as_deref(),
        Some(MOCK_AUDIO)
    );
}

#[tokio::test]
async fn test_prefers_destination_owner() {
    let (aws, google) = both_match();
    let h = harness(aws, google).await;

    let destination = h
        .client
        .synthesize_direct(TextToSpeechRequest::new("Hello"), "gs://media/out.mp3")
        .await
        .unwrap();

    assert_eq!(destination, "gs://media/out.mp3");
    assert_eq!(*h.google.uploads.lock(), vec!["gs://media/out.mp3".to_string()]);
    assert!(h.aws.uploads.lock().is_empty());
}

#[tokio::test]
async fn test_unsupported_format_fails_in_transform() {
    let (aws, google) = both_match();
    let h = harness(aws, google).await;

    let request = TextToSpeechRequest::new("Hello").with_output_format(AudioFormat::Alaw);
    let result = h.client.synthesize_direct(request, "/tmp/unused").await;

    assert!(matches!(
        result,
        Err(T2SError::UnsupportedFormat {
            provider: Provider::Aws,
            format: AudioFormat::Alaw
        })
    ));
    assert!(h.aws.last_synthesized().is_none());
}

#[tokio::test]
async fn test_voice_defaults_used_for_lookup() {
    let (aws, google) = both_match();
    let h = harness(aws, google).await;

    h.client
        .synthesize_audio(TextToSpeechRequest::new("Hello"), "")
        .await
        .unwrap();

    let lookups = h.aws.lookups.lock().clone();
    assert_eq!(lookups, vec![VoiceParams::new("en-US", VoiceGender::Male)]);
}

#[tokio::test]
async fn test_no_voice_anywhere() {
    let h = harness(
        MockProvider::new(Provider::Aws, None),
        MockProvider::new(Provider::Google, None),
    )
    .await;

    let result = h
        .client
        .synthesize_direct(TextToSpeechRequest::new("Hello"), "/tmp/unused")
        .await;
    match result {
        Err(T2SError::VoiceNotFound { tried, .. }) => {
            assert_eq!(tried, vec![Provider::Aws, Provider::Google]);
        }
        other => panic!("expected VoiceNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_pinned_provider_skips_selection() {
    let (aws, google) = both_match();
    let h = harness(aws, google).await;

    let request = TextToSpeechRequest::new("Hello")
        .with_provider(Provider::Google)
        .with_voice_params(VoiceParams::new("en-GB", VoiceGender::Female));
    let candidate = h.client.resolve_voice(request, "s3://bucket/out").await.unwrap();

    assert_eq!(candidate.provider, Provider::Google);
    assert_eq!(h.aws.lookup_count(), 0);
    assert_eq!(
        h.google.lookups.lock()[0],
        VoiceParams::new("en-GB", VoiceGender::Female)
    );
}

#[tokio::test]
async fn test_pinned_provider_without_voice() {
    let h = harness(
        MockProvider::new(Provider::Aws, Some("Joanna")),
        MockProvider::new(Provider::Google, None),
    )
    .await;

    let request = TextToSpeechRequest::new("Hello").with_provider(Provider::Google);
    let result = h.client.synthesize_direct(request, "/tmp/unused").await;
    match result {
        Err(T2SError::VoiceNotFound { tried, .. }) => assert_eq!(tried, vec![Provider::Google]),
        other => panic!("expected VoiceNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_pinned_voice_id_skips_lookup() {
    let (aws, google) = both_match();
    let h = harness(aws, google).await;

    let request = TextToSpeechRequest::new("Hello").with_voice_id(VoiceId::new("Custom"));
    let candidate = h
        .client
        .resolve_voice(request, "gs://bucket/out.mp3")
        .await
        .unwrap();

    assert_eq!(candidate.provider, Provider::Google);
    assert_eq!(candidate.voice_id, "Custom");
    assert_eq!(h.aws.lookup_count(), 0);
    assert_eq!(h.google.lookup_count(), 0);
}

#[tokio::test]
async fn test_slow_provider_is_excluded() {
    let mut config = config_for(&[Provider::Aws, Provider::Google]);
    config.voice_lookup_timeout_ms = 100;
    let h = harness_with(
        config,
        Arc::new(InMemoryStorage::new()),
        MockProvider::new(Provider::Aws, Some("Joanna")).with_lookup_delay(Duration::from_secs(30)),
        MockProvider::new(Provider::Google, Some("en-US-Standard-C")),
    )
    .await;

    let candidate = h
        .client
        .resolve_voice(TextToSpeechRequest::new("Hello"), "")
        .await
        .unwrap();
    assert_eq!(candidate.provider, Provider::Google);
}

#[tokio::test]
async fn test_ssml_type_mismatch_rejected() {
    let (aws, google) = both_match();
    let h = harness(aws, google).await;

    let request = TextToSpeechRequest::new("plain text").with_text_type(TextType::Ssml);
    let result = h.client.synthesize_direct(request, "/tmp/unused").await;
    assert!(matches!(result, Err(T2SError::Validation(_))));
    assert_eq!(h.aws.lookup_count(), 0);
}

#[tokio::test]
async fn test_auto_text_type_resolved() {
    let (aws, google) = both_match();
    let h = harness(aws, google).await;

    let request = TextToSpeechRequest::new("  <speak>Hi</speak>\n").with_prosody(Prosody {
        speaking_rate: 1.2,
        ..Default::default()
    });
    let audio = h.client.synthesize_audio(request, "").await.unwrap();
    assert_eq!(audio.request.text_type, TextType::Ssml);
    assert_eq!(&audio.audio[..], MOCK_AUDIO);
}

// =============================================================================
// File Extensions
// =============================================================================

#[tokio::test]
async fn test_extension_appended_unless_present() {
    let (aws, google) = both_match();
    let h = harness(aws, google).await;

    let cases = [
        ("s3://bucket/test1.wav", "s3://bucket/test1.wav.mp3"),
        ("s3://bucket/test1.mp3", "s3://bucket/test1.mp3"),
    ];
    for (destination, expected) in cases {
        let result = h
            .client
            .synthesize_direct(TextToSpeechRequest::new("Hi"), destination)
            .await
            .unwrap();
        assert_eq!(result, expected);
    }

    let request = TextToSpeechRequest::new("Hi")
        .with_output_format(AudioFormat::Ogg)
        .with_add_file_extension(false);
    let result = h
        .client
        .synthesize_direct(request, "s3://bucket/plain")
        .await
        .unwrap();
    assert_eq!(result, "s3://bucket/plain");
}

#[tokio::test]
async fn test_unknown_raw_format_keeps_destination() {
    let (aws, google) = both_match();
    let h = harness(aws, google).await;

    let request = TextToSpeechRequest::new("Hi")
        .with_provider(Provider::Aws)
        .with_output_format_raw(OutputFormatRaw::Name("vendor-special".into()));
    let result = h
        .client
        .synthesize_direct(request, "s3://bucket/out")
        .await
        .unwrap();
    assert_eq!(result, "s3://bucket/out");
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn test_local_destination_written() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("nested/out");
    let h = harness_with(
        config_for(&[Provider::Aws, Provider::Google]),
        Arc::new(InMemoryStorage::new()),
        MockProvider::new(Provider::Aws, Some("Joanna")),
        MockProvider::new(Provider::Google, None),
    )
    .await;

    let result = h
        .client
        .synthesize_direct(
            TextToSpeechRequest::new("Hi"),
            destination.to_str().unwrap(),
        )
        .await
        .unwrap();

    assert!(result.ends_with("nested/out.mp3"));
    assert!(h.aws.uploads.lock().is_empty());
    assert_eq!(h.storage.get(&result).as_deref(), Some(MOCK_AUDIO));
}

#[tokio::test]
async fn test_cross_storage_staging_through_temp_bucket() {
    let mut config = config_for(&[Provider::Aws, Provider::Google]);
    config.temp_buckets.insert(Provider::Aws, "staging".to_string());
    let (aws, google) = both_match();
    let h = harness_with(config, Arc::new(InMemoryStorage::new()), aws, google).await;

    let request = TextToSpeechRequest::new("Hi").with_provider(Provider::Aws);
    let result = h
        .client
        .synthesize_direct(request, "gs://media/out.mp3")
        .await
        .unwrap();

    assert_eq!(result, "gs://media/out.mp3");
    assert_eq!(
        *h.aws.uploads.lock(),
        vec!["s3://staging/out.mp3.tmp".to_string()]
    );
    assert_eq!(
        h.storage.operations(),
        vec![
            "upload s3://staging/out.mp3.tmp",
            "copy s3://staging/out.mp3.tmp gs://media/out.mp3",
            "delete s3://staging/out.mp3.tmp",
        ]
    );
    assert_eq!(h.storage.get("gs://media/out.mp3").as_deref(), Some(MOCK_AUDIO));
    assert!(h.storage.get("s3://staging/out.mp3.tmp").is_none());
}

#[tokio::test]
async fn test_staged_file_kept_when_configured() {
    let mut config = config_for(&[Provider::Aws, Provider::Google]);
    config.temp_buckets.insert(Provider::Aws, "staging".to_string());
    config.delete_temp_file = false;
    let (aws, google) = both_match();
    let h = harness_with(config, Arc::new(InMemoryStorage::new()), aws, google).await;

    let request = TextToSpeechRequest::new("Hi").with_provider(Provider::Aws);
    h.client
        .synthesize_direct(request, "gs://media/out.mp3")
        .await
        .unwrap();

    assert!(h.storage.get("s3://staging/out.mp3.tmp").is_some());
    assert!(!h.storage.operations().iter().any(|op| op.starts_with("delete")));
}

#[tokio::test]
async fn test_staged_file_delete_failure_is_not_fatal() {
    let mut config = config_for(&[Provider::Aws, Provider::Google]);
    config.temp_buckets.insert(Provider::Aws, "staging".to_string());
    let (aws, google) = both_match();
    let h = harness_with(config, Arc::new(InMemoryStorage::failing_delete()), aws, google).await;

    let request = TextToSpeechRequest::new("Hi").with_provider(Provider::Aws);
    let result = h.client.synthesize_direct(request, "gs://media/out.mp3").await;
    assert_eq!(result.unwrap(), "gs://media/out.mp3");
    assert_eq!(h.storage.get("gs://media/out.mp3").as_deref(), Some(MOCK_AUDIO));
}

#[tokio::test]
async fn test_cross_storage_without_temp_bucket_uploads_directly() {
    let (aws, google) = both_match();
    let h = harness(aws, google).await;

    let request = TextToSpeechRequest::new("Hi").with_provider(Provider::Aws);
    h.client
        .synthesize_direct(request, "gs://media/out.mp3")
        .await
        .unwrap();

    assert!(h.aws.uploads.lock().is_empty());
    assert_eq!(h.storage.operations(), vec!["upload gs://media/out.mp3"]);
}

// =============================================================================
// Sources
// =============================================================================

#[tokio::test]
async fn test_synthesize_from_local_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("input.txt");
    std::fs::write(&source, "Text from a file").unwrap();

    let (aws, google) = both_match();
    let h = harness(aws, google).await;
    h.client
        .synthesize_from_source(
            source.to_str().unwrap(),
            "s3://bucket/out",
            TextToSpeechRequest::new(""),
        )
        .await
        .unwrap();

    assert_eq!(h.aws.last_synthesized().unwrap().text, "Text from a file");
}

#[tokio::test]
async fn test_synthesize_from_cloud_source() {
    let storage = Arc::new(InMemoryStorage::new());
    storage.insert("gs://texts/story.txt", b"<speak>Once</speak>");
    let (aws, google) = both_match();
    let h = harness_with(config_for(&[Provider::Aws, Provider::Google]), storage, aws, google).await;

    h.client
        .synthesize_from_source(
            "gs://texts/story.txt",
            "gs://media/story",
            TextToSpeechRequest::new(""),
        )
        .await
        .unwrap();

    let synthesized = h.google.last_synthesized().unwrap();
    assert_eq!(synthesized.text, "<speak>Once</speak>");
    assert_eq!(synthesized.text_type, TextType::Ssml);
}

#[tokio::test]
async fn test_synthesize_from_http_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/script.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Text over HTTP"))
        .mount(&server)
        .await;

    let (aws, google) = both_match();
    let h = harness(aws, google).await;
    h.client
        .synthesize_from_source(
            &format!("{}/script.txt", server.uri()),
            "s3://bucket/out",
            TextToSpeechRequest::new(""),
        )
        .await
        .unwrap();

    assert_eq!(h.aws.last_synthesized().unwrap().text, "Text over HTTP");
}

#[tokio::test]
async fn test_missing_source() {
    let (aws, google) = both_match();
    let h = harness(aws, google).await;
    let result = h
        .client
        .synthesize_from_source(
            "/definitely/not/here.txt",
            "s3://bucket/out",
            TextToSpeechRequest::new(""),
        )
        .await;
    assert!(matches!(result, Err(T2SError::Download(_))));
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test]
async fn test_shutdown_aggregates_close_errors() {
    let h = harness(
        MockProvider::new(Provider::Aws, None).failing_close(),
        MockProvider::new(Provider::Google, None).failing_close(),
    )
    .await;

    match h.client.shutdown().await {
        Err(T2SError::Shutdown(errors)) => assert_eq!(errors.len(), 2),
        other => panic!("expected Shutdown, got {other:?}"),
    }
    assert_eq!(h.aws.close_count(), 1);
    assert_eq!(h.google.close_count(), 1);

    assert!(h.client.shutdown().await.is_ok());
    assert_eq!(h.aws.close_count(), 1);
}

#[tokio::test]
async fn test_shutdown_closes_all_after_one_failure() {
    let h = harness(
        MockProvider::new(Provider::Aws, None).failing_close(),
        MockProvider::new(Provider::Google, None),
    )
    .await;

    match h.client.shutdown().await {
        Err(T2SError::Shutdown(errors)) => assert_eq!(errors.len(), 1),
        other => panic!("expected Shutdown, got {other:?}"),
    }
    assert_eq!(h.google.close_count(), 1);
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = T2SConfig::default();
    config.voice_lookup_timeout_ms = 0;
    assert!(matches!(
        T2SClient::new(config),
        Err(T2SError::Configuration(_))
    ));
}

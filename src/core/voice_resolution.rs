//! Concurrent voice lookup across providers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::error::{T2SError, T2SResult};
use super::options::{Provider, VoiceCandidate, VoiceId, VoiceParams};
use super::provider::T2SProvider;

type LookupResults = Arc<Mutex<HashMap<Provider, T2SResult<Option<VoiceCandidate>>>>>;

/// Ask every adapter for a matching voice at once.
///
/// Waits for all lookups before filtering. Failed, timed-out and empty
/// lookups are dropped; the survivors come back in the order of `adapters`.
///
/// # Errors
/// `VoiceNotFound` naming every provider tried when no lookup matched.
pub async fn resolve_voices(
    adapters: &[Arc<dyn T2SProvider>],
    params: &VoiceParams,
    lookup_timeout: Duration,
) -> T2SResult<Vec<VoiceCandidate>> {
    let results: LookupResults = Arc::new(Mutex::new(HashMap::new()));
    let mut tasks = JoinSet::new();

    for adapter in adapters {
        let adapter = adapter.clone();
        let params = params.clone();
        let results = results.clone();
        tasks.spawn(async move {
            let provider = adapter.provider();
            let outcome = match tokio::time::timeout(lookup_timeout, adapter.find_voice(&params))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(T2SError::Timeout(format!(
                    "{provider} voice lookup exceeded {}ms",
                    lookup_timeout.as_millis()
                ))),
            };
            results.lock().insert(provider, outcome);
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "Voice lookup task failed to complete");
        }
    }

    let mut results = std::mem::take(&mut *results.lock());
    let mut candidates = Vec::new();
    for adapter in adapters {
        let provider = adapter.provider();
        match results.remove(&provider) {
            Some(Ok(Some(candidate))) => {
                debug!(provider = %provider, voice_id = %candidate.voice_id, "Voice candidate found");
                candidates.push(candidate);
            }
            Some(Ok(None)) => debug!(provider = %provider, "No matching voice"),
            Some(Err(e)) => debug!(provider = %provider, error = %e, "Voice lookup failed"),
            None => debug!(provider = %provider, "Voice lookup produced no result"),
        }
    }

    if candidates.is_empty() {
        return Err(voice_not_found(
            params,
            adapters.iter().map(|a| a.provider()).collect(),
        ));
    }
    Ok(candidates)
}

/// Look up a voice on a single pinned provider.
pub async fn resolve_voice_on(
    adapter: &dyn T2SProvider,
    params: &VoiceParams,
    lookup_timeout: Duration,
) -> T2SResult<VoiceCandidate> {
    let provider = adapter.provider();
    let found = tokio::time::timeout(lookup_timeout, adapter.find_voice(params))
        .await
        .map_err(|_| {
            T2SError::Timeout(format!(
                "{provider} voice lookup exceeded {}ms",
                lookup_timeout.as_millis()
            ))
        })??;

    found.ok_or_else(|| voice_not_found(params, vec![provider]))
}

/// Candidates for a caller-supplied voice id when no provider is pinned.
///
/// No lookup is made; every adapter is assumed to know the voice.
pub fn candidates_for_voice_id(
    adapters: &[Arc<dyn T2SProvider>],
    voice: &VoiceId,
) -> Vec<VoiceCandidate> {
    warn!(
        voice_id = %voice.id,
        "Voice id given without a provider; assuming every provider offers it"
    );
    adapters
        .iter()
        .map(|a| VoiceCandidate::new(a.provider(), &voice.id, voice.engine.clone()))
        .collect()
}

fn voice_not_found(params: &VoiceParams, tried: Vec<Provider>) -> T2SError {
    T2SError::VoiceNotFound {
        language_code: params.language_code.clone(),
        gender: params.gender,
        engine: params.engine().unwrap_or_default().to_string(),
        tried,
    }
}

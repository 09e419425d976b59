//! Provider selection among voice candidates.

use std::sync::Arc;

use tracing::debug;

use super::options::{AudioFormat, Provider, VoiceCandidate};
use super::provider::T2SProvider;

/// Pick one candidate for a request with no pinned provider.
///
/// 1. A single candidate wins outright.
/// 2. A candidate whose own storage holds `destination` wins next.
/// 3. With a concrete `format`, candidates that cannot produce it are
///    dropped, unless that would drop all of them.
/// 4. The first remaining candidate wins.
///
/// Candidates keep the order they were resolved in, so ties go to the
/// provider listed first in the configuration. Candidates without a
/// matching adapter are ignored by the storage and format checks.
pub fn select_candidate(
    candidates: Vec<VoiceCandidate>,
    adapters: &[Arc<dyn T2SProvider>],
    destination: &str,
    format: AudioFormat,
) -> Option<VoiceCandidate> {
    if candidates.len() <= 1 {
        return candidates.into_iter().next();
    }

    let adapter_for = |provider: Provider| adapters.iter().find(|a| a.provider() == provider);

    if let Some(index) = candidates.iter().position(|c| {
        adapter_for(c.provider).is_some_and(|a| a.is_own_storage_url(destination))
    }) {
        debug!(provider = %candidates[index].provider, destination = %destination, "Selected provider owning the destination storage");
        return candidates.into_iter().nth(index);
    }

    let mut remaining = candidates;
    if format != AudioFormat::Unspecified {
        let supporting: Vec<_> = remaining
            .iter()
            .filter(|c| adapter_for(c.provider).is_some_and(|a| a.supports_format(format)))
            .cloned()
            .collect();
        if supporting.is_empty() {
            debug!(format = %format, "No candidate supports the requested format; keeping all");
        } else {
            remaining = supporting;
        }
    }

    let selected = remaining.into_iter().next();
    if let Some(candidate) = &selected {
        debug!(provider = %candidate.provider, voice_id = %candidate.voice_id, "Selected provider");
    }
    selected
}

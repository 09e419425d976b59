//! Google Cloud Text-to-Speech adapter.
//!
//! Talks to the v1 REST API (`voices`, `text:synthesize`) with `reqwest`.
//! Prosody is expressed natively through `audioConfig`; canonical pitch in
//! [-1, 1] is scaled to ±20 semitones. GCS is the adapter's own storage.
//!
//! Authorization uses an API key when configured, otherwise OAuth credentials
//! from a service-account file or application default credentials.

mod auth;
mod config;
mod provider;


pub use auth::{GOOGLE_CLOUD_PLATFORM_SCOPE, GoogleAuth};
pub use config::{
    GOOGLE_PITCH_SEMITONES, GOOGLE_SUPPORTED_FORMATS, GOOGLE_TTS_URL, GoogleAudioEncoding,
    GoogleConfig,
};
pub use provider::GoogleT2S;

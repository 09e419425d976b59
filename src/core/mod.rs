pub mod aws_polly;
pub mod error;
pub mod google;
pub mod options;
pub mod orchestrator;
pub mod provider;
pub mod registry;
pub mod selection;
pub mod ssml;
pub mod voice_resolution;

// Re-export commonly used types for convenience
pub use error::{T2SError, T2SResult};

pub use options::{
    AudioFormat, OutputFormatRaw, Prosody, Provider, ResolvedRequest, TextToSpeechRequest,
    TextType, VoiceCandidate, VoiceGender, VoiceId, VoiceParams, VoiceSelector,
};

pub use provider::{T2SProvider, create_provider};

pub use orchestrator::{SynthesizedAudio, T2SClient};

pub use registry::ProviderRegistry;

pub use aws_polly::AwsPollyT2S;
pub use google::GoogleT2S;

//! Amazon Polly adapter.
//!
//! Implements [`T2SProvider`](crate::core::provider::T2SProvider) on top of the
//! AWS SDK for Rust.
//!
//! # Features
//!
//! - Voice discovery through `DescribeVoices`, filtered by gender and engine
//! - Engines: standard, neural, long-form, generative
//! - Output formats: mp3, ogg_vorbis, pcm, json (speech marks)
//! - Prosody embedded as SSML, either nested or fused into a leading
//!   `<prosody>` element
//! - S3 as own storage for direct uploads
//!
//! # Authentication
//!
//! Explicit keys from [`T2SConfig`](crate::config::T2SConfig) are used when
//! both the access key id and secret are present. Otherwise the default AWS
//! credential chain applies (`AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`,
//! `~/.aws/credentials`, IAM roles).
//!
//! # Example
//!
//! ```rust,ignore
//! use t2s_orchestrator::config::T2SConfig;
//! use t2s_orchestrator::core::aws_polly::AwsPollyT2S;
//! use t2s_orchestrator::core::provider::T2SProvider;
//! use t2s_orchestrator::core::options::{VoiceGender, VoiceParams};
//!
//! let polly = AwsPollyT2S::from_config(&T2SConfig::from_env()?)?;
//! polly.connect().await?;
//! let voice = polly
//!     .find_voice(&VoiceParams::new("en-GB", VoiceGender::Female))
//!     .await?;
//! ```

mod config;
mod provider;


pub use config::{
    AwsPollyConfig, MAX_TOTAL_LENGTH, POLLY_SUPPORTED_FORMATS, PollyEngine, PollyOutputFormat,
};
pub use provider::AwsPollyT2S;

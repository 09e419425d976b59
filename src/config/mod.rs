//! Configuration for the orchestration client
//!
//! Configuration is read from environment variables (a `.env` file is loaded
//! into the environment by the binary at startup) and optionally from a YAML
//! file. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Example
//! ```rust,no_run
//! use t2s_orchestrator::config::T2SConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = T2SConfig::from_env()?;
//!
//! // Load from YAML file with environment variable fallbacks
//! let config = T2SConfig::from_file(&PathBuf::from("t2s.yaml"))?;
//! println!("providers: {:?}", config.enabled_providers);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

mod yaml;

pub use yaml::{AwsYaml, GoogleYaml, SynthesisYaml, YamlConfig};

use crate::core::options::Provider;
use crate::core::ssml::ProsodyStrategy;

/// Default per-provider voice lookup deadline.
pub const DEFAULT_VOICE_LOOKUP_TIMEOUT_MS: u64 = 10_000;

/// Region used for AWS clients and S3 URLs that carry none.
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Orchestration client configuration
#[derive(Debug, Clone)]
pub struct T2SConfig {
    pub aws_region: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,

    /// Path to a Google service-account JSON file
    pub google_credentials: Option<String>,
    /// API key for the Text-to-Speech REST API, used instead of OAuth credentials
    pub google_api_key: Option<String>,
    /// Base URL override for the Text-to-Speech REST API
    pub google_endpoint: Option<String>,

    /// Staging bucket per provider for cross-storage destinations
    pub temp_buckets: HashMap<Provider, String>,
    /// Remove staged objects once copied to their destination
    pub delete_temp_file: bool,
    pub voice_lookup_timeout_ms: u64,
    /// Providers considered during voice resolution
    pub enabled_providers: Vec<Provider>,
    pub prosody_strategy: ProsodyStrategy,
}

impl Default for T2SConfig {
    fn default() -> Self {
        Self {
            aws_region: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_session_token: None,
            google_credentials: None,
            google_api_key: None,
            google_endpoint: None,
            temp_buckets: HashMap::new(),
            delete_temp_file: true,
            voice_lookup_timeout_ms: DEFAULT_VOICE_LOOKUP_TIMEOUT_MS,
            enabled_providers: Provider::ALL.to_vec(),
            prosody_strategy: ProsodyStrategy::default(),
        }
    }
}

/// Zeroize secret fields when the configuration is dropped.
impl Drop for T2SConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.aws_access_key_id {
            key.zeroize();
        }
        if let Some(ref mut secret) = self.aws_secret_access_key {
            secret.zeroize();
        }
        if let Some(ref mut token) = self.aws_session_token {
            token.zeroize();
        }
        if let Some(ref mut key) = self.google_api_key {
            key.zeroize();
        }
    }
}

impl T2SConfig {
    /// Load configuration from environment variables
    ///
    /// Recognised variables:
    /// - `AWS_REGION`, `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_SESSION_TOKEN`
    /// - `GOOGLE_APPLICATION_CREDENTIALS`, `GOOGLE_TTS_API_KEY`, `GOOGLE_TTS_ENDPOINT`
    /// - `T2S_AWS_TEMP_BUCKET`, `T2S_GCP_TEMP_BUCKET`
    /// - `T2S_PROVIDERS` (comma separated, e.g. `aws,gcp`)
    /// - `T2S_DELETE_TEMP_FILE`, `T2S_VOICE_LOOKUP_TIMEOUT_MS`, `T2S_PROSODY_STRATEGY`
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Self::load_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variables as base
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an environment
    /// variable is malformed, or validation fails.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = YamlConfig::from_file(path)?;

        let mut config = Self::load_env()?;
        config.apply_yaml(yaml_config);
        config.validate()?;

        Ok(config)
    }

    fn load_env() -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = Self::default();

        config.aws_region = env_string("AWS_REGION");
        config.aws_access_key_id = env_string("AWS_ACCESS_KEY_ID");
        config.aws_secret_access_key = env_string("AWS_SECRET_ACCESS_KEY");
        config.aws_session_token = env_string("AWS_SESSION_TOKEN");

        config.google_credentials = env_string("GOOGLE_APPLICATION_CREDENTIALS");
        config.google_api_key = env_string("GOOGLE_TTS_API_KEY");
        config.google_endpoint = env_string("GOOGLE_TTS_ENDPOINT");

        if let Some(bucket) = env_string("T2S_AWS_TEMP_BUCKET") {
            config.temp_buckets.insert(Provider::Aws, bucket);
        }
        if let Some(bucket) = env_string("T2S_GCP_TEMP_BUCKET") {
            config.temp_buckets.insert(Provider::Google, bucket);
        }

        if let Some(list) = env_string("T2S_PROVIDERS") {
            config.enabled_providers = parse_provider_list(&list)?;
        }
        if let Some(value) = env_string("T2S_DELETE_TEMP_FILE") {
            config.delete_temp_file = parse_bool(&value)
                .ok_or_else(|| format!("Invalid T2S_DELETE_TEMP_FILE value: {value}"))?;
        }
        if let Some(value) = env_string("T2S_VOICE_LOOKUP_TIMEOUT_MS") {
            config.voice_lookup_timeout_ms = value
                .parse()
                .map_err(|e| format!("Invalid T2S_VOICE_LOOKUP_TIMEOUT_MS value: {e}"))?;
        }
        if let Some(value) = env_string("T2S_PROSODY_STRATEGY") {
            config.prosody_strategy = ProsodyStrategy::from_str_or_default(&value);
        }

        Ok(config)
    }

    fn apply_yaml(&mut self, yaml: YamlConfig) {
        if let Some(aws) = yaml.aws {
            override_with(&mut self.aws_region, aws.region);
            override_with(&mut self.aws_access_key_id, aws.access_key_id);
            override_with(&mut self.aws_secret_access_key, aws.secret_access_key);
            override_with(&mut self.aws_session_token, aws.session_token);
            if let Some(bucket) = aws.temp_bucket {
                self.temp_buckets.insert(Provider::Aws, bucket);
            }
        }

        if let Some(google) = yaml.google {
            override_with(&mut self.google_credentials, google.credentials);
            override_with(&mut self.google_api_key, google.api_key);
            override_with(&mut self.google_endpoint, google.endpoint);
            if let Some(bucket) = google.temp_bucket {
                self.temp_buckets.insert(Provider::Google, bucket);
            }
        }

        if let Some(synthesis) = yaml.synthesis {
            if let Some(providers) = synthesis.providers {
                self.enabled_providers = providers;
            }
            if let Some(delete) = synthesis.delete_temp_file {
                self.delete_temp_file = delete;
            }
            if let Some(timeout) = synthesis.voice_lookup_timeout_ms {
                self.voice_lookup_timeout_ms = timeout;
            }
            if let Some(strategy) = synthesis.prosody_strategy {
                self.prosody_strategy = strategy;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.voice_lookup_timeout_ms == 0 {
            return Err("voice_lookup_timeout_ms must be greater than zero".to_string());
        }
        if self.enabled_providers.is_empty() {
            return Err("At least one provider must be enabled".to_string());
        }
        if self.enabled_providers.contains(&Provider::Unspecified) {
            return Err("'unspecified' is not a valid provider".to_string());
        }
        if self.aws_access_key_id.is_some() != self.aws_secret_access_key.is_some() {
            return Err(
                "AWS access key id and secret access key must be provided together".to_string(),
            );
        }
        if let Some(bucket) = self.temp_buckets.get(&Provider::Unspecified) {
            return Err(format!(
                "Temp bucket '{bucket}' is not bound to a concrete provider"
            ));
        }
        if self.temp_buckets.values().any(|b| b.trim().is_empty()) {
            return Err("Temp bucket names must not be empty".to_string());
        }
        Ok(())
    }

    /// Check if explicit AWS credentials are provided.
    pub fn has_explicit_aws_credentials(&self) -> bool {
        self.aws_access_key_id.is_some() && self.aws_secret_access_key.is_some()
    }

    /// Region for AWS clients, falling back to `us-east-1`.
    pub fn effective_aws_region(&self) -> &str {
        self.aws_region.as_deref().unwrap_or(DEFAULT_AWS_REGION)
    }

    pub fn voice_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.voice_lookup_timeout_ms)
    }

    pub fn temp_bucket(&self, provider: Provider) -> Option<&str> {
        self.temp_buckets.get(&provider).map(String::as_str)
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn override_with(target: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *target = value;
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_provider_list(list: &str) -> Result<Vec<Provider>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| match Provider::from_str_or_default(name) {
            Provider::Unspecified => Err(format!("Unknown provider in T2S_PROVIDERS: {name}")),
            provider => Ok(provider),
        })
        .collect()
}

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::options::Provider;
use crate::core::ssml::ProsodyStrategy;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present in
/// the file override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// aws:
///   region: "us-west-2"
///   access_key_id: "AKIA..."
///   secret_access_key: "secret"
///   temp_bucket: "t2s-staging"
///
/// google:
///   credentials: "/etc/t2s/service-account.json"
///   temp_bucket: "t2s-staging-gcs"
///
/// synthesis:
///   providers: ["aws", "gcp"]
///   delete_temp_file: true
///   voice_lookup_timeout_ms: 5000
///   prosody_strategy: "nested"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct YamlConfig {
    #[serde(default)]
    pub aws: Option<AwsYaml>,
    #[serde(default)]
    pub google: Option<GoogleYaml>,
    #[serde(default)]
    pub synthesis: Option<SynthesisYaml>,
}

/// Amazon Polly and S3 settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AwsYaml {
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// Bucket used to stage audio bound for non-S3 destinations
    pub temp_bucket: Option<String>,
}

/// Google Cloud Text-to-Speech and GCS settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GoogleYaml {
    /// Path to a service-account JSON file
    pub credentials: Option<String>,
    pub api_key: Option<String>,
    /// Base URL override for the Text-to-Speech REST API
    pub endpoint: Option<String>,
    pub temp_bucket: Option<String>,
}

/// Orchestration settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SynthesisYaml {
    pub providers: Option<Vec<Provider>>,
    pub delete_temp_file: Option<bool>,
    pub voice_lookup_timeout_ms: Option<u64>,
    pub prosody_strategy: Option<ProsodyStrategy>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config_full() {
        let yaml = r#"
aws:
  region: "eu-west-1"
  access_key_id: "AKIA123"
  secret_access_key: "secret"
  session_token: "token"
  temp_bucket: "aws-staging"

google:
  credentials: "/tmp/sa.json"
  api_key: "g-key"
  endpoint: "http://localhost:9000"
  temp_bucket: "gcs-staging"

synthesis:
  providers: ["gcp"]
  delete_temp_file: false
  voice_lookup_timeout_ms: 2500
  prosody_strategy: "fused"
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        let aws = config.aws.unwrap();
        assert_eq!(aws.region.as_deref(), Some("eu-west-1"));
        assert_eq!(aws.access_key_id.as_deref(), Some("AKIA123"));
        assert_eq!(aws.temp_bucket.as_deref(), Some("aws-staging"));

        let google = config.google.unwrap();
        assert_eq!(google.credentials.as_deref(), Some("/tmp/sa.json"));
        assert_eq!(google.endpoint.as_deref(), Some("http://localhost:9000"));

        let synthesis = config.synthesis.unwrap();
        assert_eq!(synthesis.providers, Some(vec![Provider::Google]));
        assert_eq!(synthesis.delete_temp_file, Some(false));
        assert_eq!(synthesis.voice_lookup_timeout_ms, Some(2500));
        assert_eq!(synthesis.prosody_strategy, Some(ProsodyStrategy::Fused));
    }

    #[test]
    fn test_yaml_config_partial() {
        let yaml = r#"
synthesis:
  delete_temp_file: true
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.aws.is_none());
        assert!(config.google.is_none());
        assert_eq!(config.synthesis.unwrap().providers, None);
    }

    #[test]
    fn test_yaml_config_empty() {
        let config: YamlConfig = serde_yaml::from_str("").unwrap_or_default();
        assert!(config.aws.is_none());
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t2s.yaml");
        fs::write(&path, "aws:\n  region: \"us-west-2\"\n").unwrap();

        let config = YamlConfig::from_file(&path).unwrap();
        assert_eq!(config.aws.unwrap().region.as_deref(), Some("us-west-2"));
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.yaml");
        fs::write(&path, "aws: [unclosed").unwrap();

        let err = YamlConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse YAML config"));
    }
}

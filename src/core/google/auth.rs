//! Request authorization for the Google REST API.

use google_cloud_auth::credentials::service_account::{
    AccessSpecifier, Builder as ServiceAccountBuilder,
};
use google_cloud_auth::credentials::{
    Builder as CredentialsBuilder, CacheableResource, Credentials,
};
use reqwest::RequestBuilder;

use super::config::GoogleConfig;
use crate::core::error::{T2SError, T2SResult};

/// OAuth scope for Cloud Text-to-Speech.
pub const GOOGLE_CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// How outgoing requests are authorized.
pub enum GoogleAuth {
    /// `?key=` query parameter
    ApiKey(String),
    /// OAuth headers from service-account or application default credentials
    Credentials(Credentials),
}

impl std::fmt::Debug for GoogleAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => write!(f, "GoogleAuth::ApiKey(***)"),
            Self::Credentials(_) => write!(f, "GoogleAuth::Credentials"),
        }
    }
}

impl GoogleAuth {
    pub async fn from_config(config: &GoogleConfig) -> T2SResult<Self> {
        if let Some(key) = &config.api_key {
            return Ok(Self::ApiKey(key.clone()));
        }

        let credentials = match &config.credentials_path {
            Some(path) => {
                let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
                    T2SError::Configuration(format!(
                        "Failed to read Google credentials file {path}: {e}"
                    ))
                })?;
                let key: serde_json::Value = serde_json::from_str(&contents).map_err(|e| {
                    T2SError::Configuration(format!(
                        "Google credentials file {path} is not valid JSON: {e}"
                    ))
                })?;
                ServiceAccountBuilder::new(key)
                    .with_access_specifier(AccessSpecifier::from_scopes([
                        GOOGLE_CLOUD_PLATFORM_SCOPE,
                    ]))
                    .build()
            }
            None => CredentialsBuilder::default()
                .with_scopes([GOOGLE_CLOUD_PLATFORM_SCOPE])
                .build(),
        }
        .map_err(|e| T2SError::Configuration(format!("Failed to load Google credentials: {e}")))?;

        Ok(Self::Credentials(credentials))
    }

    /// Attach authorization to a request.
    pub async fn authorize(&self, builder: RequestBuilder) -> T2SResult<RequestBuilder> {
        match self {
            Self::ApiKey(key) => Ok(builder.query(&[("key", key.as_str())])),
            Self::Credentials(credentials) => {
                let headers = credentials
                    .headers(http::Extensions::new())
                    .await
                    .map_err(|e| {
                        T2SError::Configuration(format!("Failed to obtain Google access token: {e}"))
                    })?;
                match headers {
                    CacheableResource::New { data, .. } => Ok(builder.headers(data)),
                    CacheableResource::NotModified => Err(T2SError::Configuration(
                        "Google credentials returned no authorization headers".to_string(),
                    )),
                }
            }
        }
    }
}

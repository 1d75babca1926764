/// Name Resolver - resolves player handles to numeric IDs over HTTP
use crate::{
    config::ResolverConfig,
    error::{CheckError, CheckResult},
    identity::NameResolver,
    metrics,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

/// HTTP lookup client for the name resolution service
#[derive(Clone)]
pub struct HttpNameResolver {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpNameResolver {
    /// Create a new resolver
    pub fn new(config: &ResolverConfig) -> CheckResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()
            .map_err(|e| CheckError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Lookup URL for a handle: `{base_url}/n/{percent-encoded handle}`
    pub fn lookup_url(&self, handle: &str) -> String {
        format!("{}/n/{}", self.base_url, urlencoding::encode(handle))
    }

    /// Single GET against the lookup service, no retries
    async fn fetch_id(&self, handle: &str) -> Result<Option<String>, String> {
        let response = self
            .http_client
            .get(self.lookup_url(handle))
            .send()
            .await
            .map_err(|e| format!("Failed to reach lookup service: {}", e))?;

        if response.status() != StatusCode::OK {
            return Err(format!("Lookup service returned {}", response.status()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("Invalid lookup response: {}", e))?;

        Ok(extract_id(&body))
    }
}

#[async_trait]
impl NameResolver for HttpNameResolver {
    async fn resolve(&self, handle: &str) -> CheckResult<String> {
        match self.fetch_id(handle).await {
            Ok(Some(id)) => {
                debug!("Resolved handle {} to {}", handle, id);
                metrics::record_name_resolution(true);
                Ok(id)
            }
            Ok(None) => {
                debug!("Lookup response for {} has no id field", handle);
                metrics::record_name_resolution(false);
                Err(CheckError::NotFound(handle.to_string()))
            }
            Err(e) => {
                warn!("Failed to resolve handle {}: {}", handle, e);
                metrics::record_name_resolution(false);
                Err(CheckError::NotFound(handle.to_string()))
            }
        }
    }
}

/// Pull the `id` field out of a lookup response
///
/// Numbers are rendered as decimal text; strings are returned as-is and
/// validated by the caller.
pub fn extract_id(body: &Value) -> Option<String> {
    match body.as_object()?.get("id")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

//! # Upstream Client
//!
//! HTTP client for the inventory API.
//!
//! ```text
//! GET {base}/v1/produtos?page=2&limit=100[&fields=CODPRD]
//!     X-API-Key: <key>
//!     Accept: application/json
//!          │
//!          ▼
//!   RetryPolicy (3 attempts, 5s apart)
//!          │
//!          ▼
//!   RawPage { records, total }
//! ```
//!
//! Credentials are read when each page is fetched, so a client can be
//! built at startup even while they are still missing.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use tracing::debug;
use url::Url;

use crate::config::{Credentials, SyncConfig};
use crate::error::{SyncError, SyncResult};
use crate::payload::RawPage;
use crate::retry::RetryPolicy;

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Upstream collections the reconciler reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Products,
    Groups,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Products => "produtos",
            Resource::Groups => "grupos",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client for the upstream inventory API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: SyncConfig,
    retry: RetryPolicy,
}

impl UpstreamClient {
    /// Builds the HTTP client from the sync config.
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.upstream.timeout())
            .build()?;

        Ok(UpstreamClient {
            http,
            config: config.clone(),
            retry: RetryPolicy::from_settings(&config.retry),
        })
    }

    /// Checks that base URL and key are both set, without any network call.
    pub fn credentials(&self) -> SyncResult<Credentials> {
        self.config.credentials()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Full URL of a collection.
    ///
    /// The collection path is appended to whatever path the base URL has.
    pub fn endpoint(&self, resource: Resource) -> SyncResult<Url> {
        let credentials = self.credentials()?;
        let path = match resource {
            Resource::Products => &self.config.upstream.products_path,
            Resource::Groups => &self.config.upstream.groups_path,
        };

        let base = credentials.base_url.as_str().trim_end_matches('/');
        let url = Url::parse(&format!("{}/{}", base, path.trim_start_matches('/')))?;
        Ok(url)
    }

    /// Fetches one page under the retry policy.
    ///
    /// `fields` restricts the record fields the upstream returns.
    pub async fn fetch_page(
        &self,
        resource: Resource,
        page: u32,
        page_size: u32,
        fields: Option<&str>,
    ) -> SyncResult<RawPage> {
        let credentials = self.credentials()?;
        let url = self.endpoint(resource)?;

        let mut params = vec![("page", page.to_string()), ("limit", page_size.to_string())];
        if let Some(fields) = fields {
            params.push(("fields", fields.to_string()));
        }

        let label = format!("{resource} page {page}");
        let raw = self
            .retry
            .run(&label, || {
                self.get_once(url.clone(), &credentials.api_key, &params)
            })
            .await?;

        debug!(
            resource = %resource,
            page,
            records = raw.records.len(),
            total = ?raw.total,
            "Fetched upstream page"
        );
        Ok(raw)
    }

    /// A single attempt: any transport error or non-2xx status is an error.
    async fn get_once(
        &self,
        url: Url,
        api_key: &str,
        params: &[(&str, String)],
    ) -> SyncResult<RawPage> {
        let response = self
            .http
            .get(url.clone())
            .header(API_KEY_HEADER, api_key)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        RawPage::parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(base_url: &str) -> SyncConfig {
        let mut config = SyncConfig::default();
        config.upstream.base_url = Some(base_url.to_string());
        config.upstream.api_key = Some("secret".to_string());
        config
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let client = UpstreamClient::new(&configured("https://tga.example.com/api/")).unwrap();

        assert_eq!(
            client.endpoint(Resource::Products).unwrap().as_str(),
            "https://tga.example.com/api/v1/produtos"
        );
        assert_eq!(
            client.endpoint(Resource::Groups).unwrap().as_str(),
            "https://tga.example.com/api/v1/grupos"
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_any_request() {
        let client = UpstreamClient::new(&SyncConfig::default()).unwrap();

        let err = client
            .fetch_page(Resource::Products, 1, 100, None)
            .await
            .unwrap_err();

        assert!(err.is_config_error());
    }

    #[test]
    fn test_resource_names() {
        assert_eq!(Resource::Products.to_string(), "produtos");
        assert_eq!(Resource::Groups.as_str(), "grupos");
    }
}

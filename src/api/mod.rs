//! Typed wrappers over the backend REST endpoints.

/// Admin console endpoints.
pub mod admin;
/// Payment checkout sessions.
pub mod checkout;
/// Credits and code redemption.
pub mod codes;
/// Error type shared by all wrappers.
pub mod error;
/// Upload, job creation and lookup.
pub mod jobs;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub use error::ApiError;

/// HTTP client bound to one backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/api/jobs`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.http.get(self.url(path)).bearer_auth(token)
    }

    pub(crate) fn post(&self, path: &str, token: &str) -> RequestBuilder {
        self.http.post(self.url(path)).bearer_auth(token)
    }

    pub(crate) fn patch(&self, path: &str, token: &str) -> RequestBuilder {
        self.http.patch(self.url(path)).bearer_auth(token)
    }

    /// Send a request and decode a 2xx JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<T, ApiError> {
        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::from_response(resp).await);
        }
        Ok(resp.json::<T>().await?)
    }
}

/// Percent-encode one path segment.
pub(crate) fn segment(s: &str) -> String {
    urlencoding::encode(s.trim()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let api = ApiClient::new(" http://localhost:8000/ ", Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.url("/api/jobs"), "http://localhost:8000/api/jobs");
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("a b/c"), "a%20b%2Fc");
    }
}

//! HTTP gateway for the FileHub API.
//!
//! Every request goes through [`ApiClient`]: it attaches the bearer token
//! whenever one is stored, turns non-2xx responses into [`ClientError`]s using the
//! server's `detail`/`message`, reports each failure to a [`FailureNotifier`],
//! and on a `401` for an authenticated call discards the stored token and
//! invokes the injected [`SessionExpiryHandler`].

pub mod api;
pub mod content_disposition;
pub mod download;
pub mod expiry;
pub mod gateway;
pub mod notify;
pub mod token_store;
pub mod upload;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use filehub_core::constants::{GENERIC_ERROR_MESSAGE, NETWORK_ERROR_MESSAGE};
use filehub_core::{ClientConfig, ClientError, ClientResult};
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use download::{DownloadedFile, TransientBlob};
pub use expiry::{LoginRedirect, SessionExpiryHandler};
pub use gateway::Gateway;
pub use notify::{FailureNotifier, TracingNotifier};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use upload::{FileRef, ProgressFn, UploadProgress};

/// How a `401` on a request is interpreted. The bearer token is attached in
/// both cases when one is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Credential exchange (login, register, password reset); a 401 is an
    /// ordinary failure.
    Anonymous,
    /// Session-bound call; a 401 ends the session.
    Authenticated,
}

/// HTTP client for the FileHub API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    expiry: Arc<dyn SessionExpiryHandler>,
    notifier: Arc<dyn FailureNotifier>,
    upload_timeout: Duration,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("upload_timeout", &self.upload_timeout)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Client with the default expiry policy ([`LoginRedirect`]) and notifier.
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> ClientResult<Self> {
        Self::with_policies(
            config,
            tokens,
            Arc::new(LoginRedirect::new()),
            Arc::new(TracingNotifier),
        )
    }

    pub fn with_policies(
        config: &ClientConfig,
        tokens: Arc<dyn TokenStore>,
        expiry: Arc<dyn SessionExpiryHandler>,
        notifier: Arc<dyn FailureNotifier>,
    ) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            tokens,
            expiry,
            notifier,
            upload_timeout: config.upload_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn upload_timeout(&self) -> Duration {
        self.upload_timeout
    }

    fn apply_auth(&self, request: RequestBuilder) -> ClientResult<RequestBuilder> {
        Ok(match self.tokens.load()? {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        })
    }

    /// Send `request` and return the successful response.
    ///
    /// `fallback` is the message used when a failed response has no readable
    /// `detail` or `message`.
    pub(crate) async fn execute(
        &self,
        operation: &str,
        request: RequestBuilder,
        access: Access,
        fallback: &str,
    ) -> ClientResult<Response> {
        let result = self.execute_inner(request, access, fallback).await;
        if let Err(err) = &result {
            self.notifier.notify(operation, err);
        }
        result
    }

    async fn execute_inner(
        &self,
        request: RequestBuilder,
        access: Access,
        fallback: &str,
    ) -> ClientResult<Response> {
        let request = self.apply_auth(request)?;

        let response = request.send().await.map_err(|e| {
            tracing::debug!(error = %e, "Transport failure");
            ClientError::Network(NETWORK_ERROR_MESSAGE.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = error_message(&body, fallback);

        if status == StatusCode::UNAUTHORIZED {
            return Err(match access {
                Access::Anonymous => ClientError::Unauthorized(message),
                Access::Authenticated => {
                    if let Err(e) = self.tokens.clear() {
                        tracing::warn!(error = %e, "Failed to discard expired token");
                    }
                    self.expiry.on_session_expired(&message);
                    ClientError::SessionExpired(message)
                }
            });
        }

        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }

    /// Decode a JSON body; `None` for 204 or an empty body.
    pub(crate) async fn read_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        response: Response,
    ) -> ClientResult<Option<T>> {
        let status = response.status();
        let result: ClientResult<Option<T>> = async {
            let body = response.bytes().await.map_err(|e| {
                tracing::debug!(error = %e, "Failed to read response body");
                ClientError::Network(NETWORK_ERROR_MESSAGE.to_string())
            })?;
            if status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace) {
                return Ok(None);
            }
            serde_json::from_slice(&body).map(Some).map_err(ClientError::from)
        }
        .await;

        if let Err(err) = &result {
            self.notifier.notify(operation, err);
        }
        result
    }

    async fn require_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        response: Response,
    ) -> ClientResult<T> {
        match self.read_json(operation, response).await? {
            Some(body) => Ok(body),
            None => {
                let err = ClientError::InvalidResponse("empty response body".to_string());
                self.notifier.notify(operation, &err);
                Err(err)
            }
        }
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        access: Access,
    ) -> ClientResult<T> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = self
            .execute(path, request, access, GENERIC_ERROR_MESSAGE)
            .await?;
        self.require_json(path, response).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        access: Access,
    ) -> ClientResult<T> {
        let request = self.client.post(self.build_url(path)).json(body);
        let response = self
            .execute(path, request, access, GENERIC_ERROR_MESSAGE)
            .await?;
        self.require_json(path, response).await
    }

    /// POST JSON body, ignoring whatever the server answers with.
    pub async fn post_json_discard<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        access: Access,
    ) -> ClientResult<()> {
        let request = self.client.post(self.build_url(path)).json(body);
        self.execute(path, request, access, GENERIC_ERROR_MESSAGE)
            .await?;
        Ok(())
    }

    /// PUT JSON body; `None` when the server answers without a body.
    pub async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        access: Access,
    ) -> ClientResult<Option<T>> {
        let request = self.client.put(self.build_url(path)).json(body);
        let response = self
            .execute(path, request, access, GENERIC_ERROR_MESSAGE)
            .await?;
        self.read_json(path, response).await
    }

    /// POST multipart form; `None` when the server answers without a body.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
        timeout: Option<Duration>,
        fallback: &str,
    ) -> ClientResult<Option<T>> {
        let mut request = self.client.post(self.build_url(path)).multipart(form);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = self
            .execute(path, request, Access::Authenticated, fallback)
            .await?;
        self.read_json(path, response).await
    }

    /// DELETE request. Returns Ok(()) on success.
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let request = self.client.delete(self.build_url(path));
        self.execute(path, request, Access::Authenticated, GENERIC_ERROR_MESSAGE)
            .await?;
        Ok(())
    }

    /// Authenticated GET returning raw bytes and response headers.
    pub async fn get_bytes(&self, path: &str) -> ClientResult<(HeaderMap, Bytes)> {
        let request = self.client.get(self.build_url(path));
        let response = self
            .execute(path, request, Access::Authenticated, GENERIC_ERROR_MESSAGE)
            .await?;
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            tracing::debug!(error = %e, "Failed to read response body");
            let err = ClientError::Network(NETWORK_ERROR_MESSAGE.to_string());
            self.notifier.notify(path, &err);
            err
        })?;
        Ok((headers, body))
    }
}

/// `detail`, then `message`, from a JSON error body; `fallback` otherwise.
pub fn error_message(body: &[u8], fallback: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_slice(body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            ["detail", "message"].iter().find_map(|key| {
                value.get(key).and_then(|field| match field {
                    serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                    _ => None,
                })
            })
        })
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_detail() {
        assert_eq!(
            error_message(br#"{"detail":"Invalid credentials","message":"x"}"#, "f"),
            "Invalid credentials"
        );
        assert_eq!(error_message(br#"{"message":"quota exceeded"}"#, "f"), "quota exceeded");
    }

    #[test]
    fn error_message_falls_back() {
        assert_eq!(error_message(b"<html>oops</html>", GENERIC_ERROR_MESSAGE), GENERIC_ERROR_MESSAGE);
        assert_eq!(error_message(br#"{"detail":""}"#, "Upload failed"), "Upload failed");
        assert_eq!(error_message(br#"{"detail":{"code":1}}"#, "f"), "f");
        assert_eq!(error_message(b"", "f"), "f");
    }

    #[test]
    fn urls_join_without_double_slash() {
        let config = ClientConfig::new("http://localhost:8000/api/");
        let client = ApiClient::new(&config, Arc::new(MemoryTokenStore::new())).unwrap();
        assert_eq!(client.build_url("/files/"), "http://localhost:8000/api/files/");
    }
}

//! Configuration module
//!
//! Client settings come from the environment (`FILEHUB_*`, with `API_URL` as a
//! fallback for the base URL). Front ends load a `.env` file before calling
//! [`ClientConfig::from_env`].

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_UPLOAD_TIMEOUT_SECS};
use crate::error::{ClientError, ClientResult};

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    /// Base URL every route is appended to, without a trailing slash.
    pub api_url: String,
    /// Where the bearer token is persisted between runs.
    pub token_path: PathBuf,
    /// Timeout for ordinary requests.
    pub timeout: Duration,
    /// Timeout for a single file upload.
    pub upload_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: normalize_url(api_url.into()),
            token_path: default_token_path(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            upload_timeout: Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = get("FILEHUB_API_URL")
            .or_else(|| get("API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let token_path = get("FILEHUB_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_token_path);

        let timeout = parse_secs(get("FILEHUB_TIMEOUT_SECS"), "FILEHUB_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let upload_timeout = parse_secs(
            get("FILEHUB_UPLOAD_TIMEOUT_SECS"),
            "FILEHUB_UPLOAD_TIMEOUT_SECS",
            DEFAULT_UPLOAD_TIMEOUT_SECS,
        )?;

        let config = Self {
            api_url: normalize_url(api_url),
            token_path,
            timeout,
            upload_timeout,
        };
        tracing::debug!(
            api_url = %config.api_url,
            token_path = %config.token_path.display(),
            "Loaded client configuration"
        );
        Ok(config)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = normalize_url(api_url.into());
        self
    }

    pub fn with_token_path(mut self, token_path: impl Into<PathBuf>) -> Self {
        self.token_path = token_path.into();
        self
    }
}

/// `<config dir>/filehub/session.json`, or `./.filehub/session.json` when the
/// platform has no config directory.
pub fn default_token_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("filehub").join("session.json"),
        None => PathBuf::from(".filehub").join("session.json"),
    }
}

fn parse_secs(value: Option<String>, key: &str, default: u64) -> ClientResult<Duration> {
    let secs = match value {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                ClientError::validation(format!("{} must be a positive number of seconds", key))
            })?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}

fn normalize_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(
            config.upload_timeout,
            Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS)
        );
        assert!(config.token_path.ends_with("filehub/session.json")
            || config.token_path.ends_with(".filehub/session.json"));
    }

    #[test]
    fn prefixed_url_wins_and_loses_trailing_slash() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("API_URL", "http://fallback/api"),
            ("FILEHUB_API_URL", "https://files.example.com/api/"),
            ("FILEHUB_TOKEN_PATH", "/tmp/fh/token.json"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://files.example.com/api");
        assert_eq!(config.token_path, PathBuf::from("/tmp/fh/token.json"));

        let config = ClientConfig::from_lookup(lookup(&[("API_URL", "http://fallback/api")])).unwrap();
        assert_eq!(config.api_url, "http://fallback/api");
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[("FILEHUB_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("FILEHUB_TIMEOUT_SECS"));
        assert!(ClientConfig::from_lookup(lookup(&[("FILEHUB_UPLOAD_TIMEOUT_SECS", "0")])).is_err());
    }
}

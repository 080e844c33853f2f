//! FileHub client library.
//!
//! [`SessionManager`] owns authentication state and [`UploadQueue`] drives
//! sequential uploads; both talk to the API through a
//! [`Gateway`](filehub_api_client::Gateway). [`connect`] wires them to the
//! HTTP gateway so that a `401` on any authenticated call ends the session.

pub mod session;
pub mod upload_queue;

#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

use filehub_api_client::{ApiClient, FileTokenStore, LoginRedirect, TokenStore, TracingNotifier};
use filehub_core::{ClientConfig, ClientResult};

pub use session::{LoadingState, SessionExpiry, SessionHandle, SessionManager};
pub use upload_queue::{
    BatchOutcome, JobId, JobStatus, QueueError, QueueEvent, UploadJob, UploadQueue,
};

/// A connected client: session state plus the gateway it uses.
pub struct FileHub {
    pub session: SessionManager<ApiClient>,
    gateway: Arc<ApiClient>,
    redirect: Arc<LoginRedirect>,
}

impl FileHub {
    pub fn gateway(&self) -> &Arc<ApiClient> {
        &self.gateway
    }

    /// Fresh, empty upload queue over the shared gateway.
    pub fn upload_queue(&self) -> UploadQueue<ApiClient> {
        UploadQueue::new(self.gateway.clone())
    }

    /// Whether the session expired since the last check; resets the flag.
    pub fn take_login_redirect(&self) -> bool {
        self.redirect.take_redirect()
    }
}

/// Build the gateway and session manager for `config`, persisting the token
/// at `config.token_path`.
pub fn connect(config: &ClientConfig) -> ClientResult<FileHub> {
    let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&config.token_path));
    connect_with_store(config, tokens)
}

pub fn connect_with_store(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> ClientResult<FileHub> {
    let handle = SessionHandle::new();
    let redirect = Arc::new(LoginRedirect::new());
    let expiry = Arc::new(SessionExpiry::new(handle.clone(), redirect.clone()));

    let gateway = Arc::new(ApiClient::with_policies(
        config,
        tokens.clone(),
        expiry,
        Arc::new(TracingNotifier),
    )?);
    tracing::debug!(api_url = %gateway.base_url(), "FileHub client configured");

    Ok(FileHub {
        session: SessionManager::with_handle(gateway.clone(), tokens, handle),
        gateway,
        redirect,
    })
}

//! Session manager: bearer token, current user, and authentication status.
//!
//! The token store is written only from here and from the [`SessionExpiry`]
//! policy this module installs into the gateway. Everything else reads the
//! session through [`SessionManager`] accessors.

use std::path::Path;
use std::sync::Arc;

use filehub_api_client::{
    FileRef, Gateway, LoginRedirect, SessionExpiryHandler, TokenStore, TransientBlob,
};
use filehub_core::models::{ProfileUpdate, User, UserPatch};
use filehub_core::validation::{
    validate_email_present, validate_login, validate_password_change, validate_password_reset,
    validate_profile_picture, validate_profile_update, validate_registration,
};
use filehub_core::{ClientError, ClientResult};
use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingState {
    /// A profile fetch for a stored token is in flight.
    Checking,
    Authenticated,
    Unauthenticated,
}

#[derive(Debug, Clone)]
struct SessionState {
    user: Option<User>,
    loading: LoadingState,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            loading: LoadingState::Unauthenticated,
        }
    }
}

/// Shared view of the in-memory session.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<SessionState>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.read().user.clone()
    }

    pub fn loading_state(&self) -> LoadingState {
        self.inner.read().loading
    }

    /// The user, only while the session is authenticated. Both fields are
    /// read under one guard.
    pub fn authenticated_user(&self) -> Option<User> {
        let state = self.inner.read();
        match state.loading {
            LoadingState::Authenticated => state.user.clone(),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        let state = self.inner.read();
        state.loading == LoadingState::Authenticated && state.user.is_some()
    }

    fn set_checking(&self) {
        self.inner.write().loading = LoadingState::Checking;
    }

    fn set_authenticated(&self, user: User) {
        let mut state = self.inner.write();
        state.user = Some(user);
        state.loading = LoadingState::Authenticated;
    }

    fn reset(&self) {
        *self.inner.write() = SessionState::default();
    }

    fn apply(&self, patch: UserPatch) -> Option<User> {
        let mut state = self.inner.write();
        let user = state.user.as_mut()?;
        user.apply(patch);
        Some(user.clone())
    }
}

/// Expiry policy installed into the gateway: forget the in-memory session,
/// then ask for a fresh login.
///
/// The gateway has already discarded the stored token when this runs.
#[derive(Debug, Clone)]
pub struct SessionExpiry {
    session: SessionHandle,
    redirect: Arc<LoginRedirect>,
}

impl SessionExpiry {
    pub fn new(session: SessionHandle, redirect: Arc<LoginRedirect>) -> Self {
        Self { session, redirect }
    }
}

impl SessionExpiryHandler for SessionExpiry {
    fn on_session_expired(&self, message: &str) {
        self.session.reset();
        self.redirect.on_session_expired(message);
    }
}

pub struct SessionManager<G: Gateway> {
    gateway: Arc<G>,
    tokens: Arc<dyn TokenStore>,
    state: SessionHandle,
}

impl<G: Gateway> SessionManager<G> {
    pub fn new(gateway: Arc<G>, tokens: Arc<dyn TokenStore>) -> Self {
        Self::with_handle(gateway, tokens, SessionHandle::new())
    }

    /// Manager over an existing handle, typically one shared with a
    /// [`SessionExpiry`] policy.
    pub fn with_handle(gateway: Arc<G>, tokens: Arc<dyn TokenStore>, state: SessionHandle) -> Self {
        Self {
            gateway,
            tokens,
            state,
        }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.state
    }

    /// Restore the session from the stored token, if any.
    ///
    /// Never fails: an unreadable store or a rejected token both end in
    /// [`LoadingState::Unauthenticated`].
    #[tracing::instrument(skip(self))]
    pub async fn initialize(&self) -> LoadingState {
        let token = match self.tokens.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored token");
                None
            }
        };

        if token.is_none() {
            self.state.reset();
            return LoadingState::Unauthenticated;
        }

        match self.resolve_profile().await {
            Ok(user) => {
                tracing::debug!(user_id = user.id, "Session restored");
            }
            Err(e) => {
                tracing::info!(error = %e, "Stored session is no longer valid");
            }
        }
        self.state.loading_state()
    }

    /// Exchange credentials for a token, then load the profile.
    ///
    /// When the credentials are rejected any existing session is left as it was.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<User> {
        validate_login(username, password)?;

        let response = self.gateway.login(username.trim(), password).await?;
        let token = response
            .access
            .filter(|token| !token.is_empty())
            .ok_or(ClientError::MissingToken)?;

        self.tokens.store(&token)?;
        let user = self.resolve_profile().await?;
        tracing::info!(user_id = user.id, username = %user.username, "Logged in");
        Ok(user)
    }

    /// Create an account. Does not log in.
    #[tracing::instrument(skip(self, password, confirm_password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> ClientResult<()> {
        validate_registration(username, email, password, confirm_password)?;
        self.gateway
            .register(username.trim(), email.trim(), password, confirm_password)
            .await
    }

    /// Drop the token and the user. Local only; always succeeds.
    pub fn logout(&self) {
        if let Err(e) = self.tokens.clear() {
            tracing::warn!(error = %e, "Failed to remove stored token");
        }
        self.state.reset();
        tracing::info!("Logged out");
    }

    /// Merge `patch` into the current user. No-op without a session.
    pub fn update_user(&self, patch: UserPatch) -> Option<User> {
        self.state.apply(patch)
    }

    #[tracing::instrument(skip(self))]
    pub async fn refresh_profile(&self) -> ClientResult<User> {
        if self.token().is_none() {
            return Err(ClientError::NotAuthenticated);
        }
        self.resolve_profile().await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_profile(&self, username: &str, email: &str) -> ClientResult<User> {
        validate_profile_update(username, email)?;
        self.require_session()?;

        let update = ProfileUpdate {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
        };
        let patch = self.gateway.update_profile(&update).await?;
        self.update_user(patch).ok_or(ClientError::NotAuthenticated)
    }

    /// Read an image from disk and make it the profile picture.
    #[tracing::instrument(skip_all)]
    pub async fn upload_profile_picture(&self, path: impl AsRef<Path>) -> ClientResult<User> {
        let picture = FileRef::from_path(path).await?;
        validate_profile_picture(&picture.mime, picture.size)?;
        self.require_session()?;

        let patch = self.gateway.upload_profile_picture(&picture).await?;
        self.update_user(patch).ok_or(ClientError::NotAuthenticated)
    }

    /// Local copy of the profile picture, deleted when the blob is dropped.
    /// `None` when the user has no picture.
    #[tracing::instrument(skip(self))]
    pub async fn profile_picture(&self) -> ClientResult<Option<TransientBlob>> {
        let user = self.require_session()?;
        if user.profile_picture.is_none() {
            return Ok(None);
        }
        let picture = self.gateway.fetch_profile_picture().await?;
        picture.into_transient().map(Some)
    }

    #[tracing::instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> ClientResult<()> {
        validate_email_present(email)?;
        self.gateway.forgot_password(email.trim()).await
    }

    #[tracing::instrument(skip(self, reset_token, new_password))]
    pub async fn reset_password(
        &self,
        user_id: &str,
        reset_token: &str,
        new_password: &str,
    ) -> ClientResult<()> {
        validate_password_reset(new_password)?;
        self.gateway
            .reset_password(user_id, reset_token, new_password)
            .await
    }

    #[tracing::instrument(skip_all)]
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> ClientResult<()> {
        validate_password_change(current_password, new_password, confirm_password)?;
        self.require_session()?;
        self.gateway
            .change_password(current_password, new_password)
            .await
    }

    /// Forget the in-memory session; the stored token stays for the next run.
    pub fn teardown(&self) {
        self.state.reset();
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.current_user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn loading_state(&self) -> LoadingState {
        self.state.loading_state()
    }

    pub fn token(&self) -> Option<String> {
        self.tokens.load().ok().flatten()
    }

    fn require_session(&self) -> ClientResult<User> {
        self.state
            .authenticated_user()
            .ok_or(ClientError::NotAuthenticated)
    }

    async fn resolve_profile(&self) -> ClientResult<User> {
        self.state.set_checking();
        match self.gateway.fetch_profile().await {
            Ok(user) => {
                self.state.set_authenticated(user.clone());
                Ok(user)
            }
            Err(e) => {
                if let Err(clear_err) = self.tokens.clear() {
                    tracing::warn!(error = %clear_err, "Failed to remove stored token");
                }
                self.state.reset();
                Err(e)
            }
        }
    }
}

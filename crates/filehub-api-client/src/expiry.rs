//! Session-expiry policy.
//!
//! When an authenticated request comes back `401`, [`ApiClient`](crate::ApiClient)
//! discards the stored token and then hands control to a
//! [`SessionExpiryHandler`]. Front ends decide what "send the user back to the
//! login screen" means for them.

use std::sync::atomic::{AtomicBool, Ordering};

pub trait SessionExpiryHandler: Send + Sync {
    /// Called once per rejected request, after the token has been cleared.
    fn on_session_expired(&self, message: &str);
}

/// Records that the user must log in again.
///
/// The CLI checks [`take_redirect`](LoginRedirect::take_redirect) after each
/// command and prints a notice instead of navigating.
#[derive(Debug, Default)]
pub struct LoginRedirect {
    pending: AtomicBool,
}

impl LoginRedirect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a redirect is pending, resetting the flag.
    pub fn take_redirect(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

impl SessionExpiryHandler for LoginRedirect {
    fn on_session_expired(&self, message: &str) {
        tracing::warn!(reason = %message, "Session expired; login required");
        self.pending.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_flag_is_consumed_once() {
        let redirect = LoginRedirect::new();
        assert!(!redirect.take_redirect());

        redirect.on_session_expired("Token expired");
        assert!(redirect.is_pending());
        assert!(redirect.take_redirect());
        assert!(!redirect.take_redirect());
    }
}

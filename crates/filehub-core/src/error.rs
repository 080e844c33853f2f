//! Error types module
//!
//! Every failure the client can observe is a [`ClientError`]. Variants fall into
//! four kinds (see [`ErrorKind`]): authentication, validation, transport, and
//! server failures. Display output is the user-facing message, so a server
//! `detail` such as `"Invalid credentials"` is shown verbatim.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for failures the user can act on
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Coarse failure taxonomy used for notification and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad credentials or an expired session.
    Authentication,
    /// Rejected locally before any network call.
    Validation,
    /// The request never produced a response, or local I/O failed.
    Transport,
    /// The server answered with a non-2xx status or an unreadable body.
    Server,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// 401 on a call that carried no session (login, register, password reset).
    #[error("{0}")]
    Unauthorized(String),

    /// 401 on an authenticated call; the stored token has been discarded.
    #[error("{0}")]
    SessionExpired(String),

    /// Operation needs a session and none is established.
    #[error("You are not logged in")]
    NotAuthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Network(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Login answered 2xx without an `access` token.
    #[error("Login response did not include a token")]
    MissingToken,

    #[error("Token storage error: {0}")]
    TokenStore(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Unauthorized(_)
            | ClientError::SessionExpired(_)
            | ClientError::NotAuthenticated => ErrorKind::Authentication,
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Network(_) | ClientError::TokenStore(_) | ClientError::Io(_) => {
                ErrorKind::Transport
            }
            ClientError::Server { .. }
            | ClientError::InvalidResponse(_)
            | ClientError::MissingToken => ErrorKind::Server,
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self.kind() {
            ErrorKind::Validation => LogLevel::Debug,
            ErrorKind::Authentication | ErrorKind::Server => LogLevel::Warn,
            ErrorKind::Transport => LogLevel::Error,
        }
    }

    /// HTTP status behind this error, when the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            ClientError::Unauthorized(_) | ClientError::SessionExpired(_) => Some(401),
            _ => None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ClientError::SessionExpired(_))
    }

    /// Whether the gateway produced (and therefore already reported) this error.
    pub fn is_gateway_failure(&self) -> bool {
        matches!(
            self,
            ClientError::Unauthorized(_)
                | ClientError::SessionExpired(_)
                | ClientError::Network(_)
                | ClientError::Server { .. }
                | ClientError::InvalidResponse(_)
        )
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::InvalidResponse(format!("JSON parsing error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_displayed_verbatim() {
        let err = ClientError::Server {
            status: 413,
            message: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "quota exceeded");
        assert_eq!(err.status(), Some(413));
        assert_eq!(err.kind(), ErrorKind::Server);
    }

    #[test]
    fn authentication_errors_share_a_kind() {
        assert_eq!(
            ClientError::Unauthorized("Invalid credentials".into()).kind(),
            ErrorKind::Authentication
        );
        let expired = ClientError::SessionExpired("Token expired".into());
        assert_eq!(expired.kind(), ErrorKind::Authentication);
        assert!(expired.is_session_expired());
        assert!(!ClientError::NotAuthenticated.is_gateway_failure());
        assert_eq!(ClientError::NotAuthenticated.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn validation_is_not_a_gateway_failure() {
        let err = ClientError::validation("Please fill in all fields");
        assert!(!err.is_gateway_failure());
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert!(ClientError::Network("down".into()).is_gateway_failure());
    }

    #[test]
    fn missing_token_is_raised_by_the_session_layer() {
        let err = ClientError::MissingToken;
        assert!(!err.is_gateway_failure());
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.to_string(), "Login response did not include a token");
    }
}

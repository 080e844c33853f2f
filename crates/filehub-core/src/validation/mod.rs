//! Validation modules
//!
//! Checks performed before any network call. Each failure is a
//! [`ClientError::Validation`](crate::ClientError::Validation) carrying the
//! message shown to the user.

pub mod credentials;
pub mod profile;

pub use credentials::{
    validate_email_present, validate_login, validate_password_change, validate_password_reset,
    validate_registration,
};
pub use profile::{validate_profile_picture, validate_profile_update};

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

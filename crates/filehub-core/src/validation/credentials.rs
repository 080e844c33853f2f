use super::is_blank;
use crate::constants::MIN_PASSWORD_LENGTH;
use crate::error::{ClientError, ClientResult};

pub fn validate_login(username: &str, password: &str) -> ClientResult<()> {
    if is_blank(username) || password.is_empty() {
        return Err(ClientError::validation("Please fill in all fields"));
    }
    Ok(())
}

pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> ClientResult<()> {
    if is_blank(username) || is_blank(email) || password.is_empty() || confirm_password.is_empty()
    {
        return Err(ClientError::validation("Please fill in all fields"));
    }
    if password != confirm_password {
        return Err(ClientError::validation("Passwords do not match"));
    }
    Ok(())
}

pub fn validate_password_change(
    current_password: &str,
    new_password: &str,
    confirm_password: &str,
) -> ClientResult<()> {
    if current_password.is_empty() || new_password.is_empty() || confirm_password.is_empty() {
        return Err(ClientError::validation("All fields are required"));
    }
    if new_password != confirm_password {
        return Err(ClientError::validation("New passwords do not match"));
    }
    check_length(new_password)
}

pub fn validate_password_reset(new_password: &str) -> ClientResult<()> {
    if new_password.is_empty() {
        return Err(ClientError::validation("Please enter a new password"));
    }
    check_length(new_password)
}

pub fn validate_email_present(email: &str) -> ClientResult<()> {
    if is_blank(email) {
        return Err(ClientError::validation("Please enter your email"));
    }
    Ok(())
}

fn check_length(password: &str) -> ClientResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ClientError::validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

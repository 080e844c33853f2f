use super::is_blank;
use crate::constants::PROFILE_PICTURE_MAX_BYTES;
use crate::error::{ClientError, ClientResult};

pub fn validate_profile_update(username: &str, email: &str) -> ClientResult<()> {
    if is_blank(username) || is_blank(email) {
        return Err(ClientError::validation("Username and email are required"));
    }
    Ok(())
}

/// Profile pictures must be images no larger than 5 MiB.
pub fn validate_profile_picture(mime: &str, size: u64) -> ClientResult<()> {
    if !mime.trim().to_ascii_lowercase().starts_with("image/") {
        return Err(ClientError::validation("Please upload an image file"));
    }
    if size > PROFILE_PICTURE_MAX_BYTES {
        return Err(ClientError::validation("Image size should be less than 5MB"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_update_requires_both_fields() {
        assert!(validate_profile_update("alice", "").is_err());
        assert!(validate_profile_update("alice", "a@x.io").is_ok());
    }

    #[test]
    fn picture_must_be_small_image() {
        let err = validate_profile_picture("application/pdf", 10).unwrap_err();
        assert_eq!(err.to_string(), "Please upload an image file");

        let err = validate_profile_picture("image/png", PROFILE_PICTURE_MAX_BYTES + 1).unwrap_err();
        assert_eq!(err.to_string(), "Image size should be less than 5MB");

        assert!(validate_profile_picture("image/jpeg", PROFILE_PICTURE_MAX_BYTES).is_ok());
    }
}

//! Shared constants: API routes, storage keys, and client-side limits.

/// Default base URL of the FileHub API. Every route below is relative to it.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Key under which the bearer token is persisted in the token store.
pub const TOKEN_KEY: &str = "token";

/// Name used for downloads whose response carries no usable filename.
pub const DEFAULT_DOWNLOAD_FILENAME: &str = "downloaded_file";

/// Largest profile picture accepted before any request is made (5 MiB).
pub const PROFILE_PICTURE_MAX_BYTES: u64 = 5 * 1024 * 1024;

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 600;

// Fallback messages used when the server gives no readable reason.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error occurred";

/// API routes. Trailing slashes are significant for the server.
pub mod paths {
    pub const LOGIN: &str = "/auth/login/";
    pub const REGISTER: &str = "/auth/register/";
    pub const PROFILE: &str = "/auth/profile/";
    pub const PROFILE_PICTURE: &str = "/auth/profile/picture/";
    pub const PROFILE_PICTURE_PROXY: &str = "/auth/profile/picture/proxy/";
    pub const FORGOT_PASSWORD: &str = "/auth/forgot-password/";
    pub const CHANGE_PASSWORD: &str = "/auth/change-password/";
    pub const FILES: &str = "/files/";
    pub const DASHBOARD: &str = "/files/dashboard/";

    pub fn reset_password(user_id: &str, reset_token: &str) -> String {
        format!(
            "/auth/reset-password/{}/{}/",
            urlencode_segment(user_id),
            urlencode_segment(reset_token)
        )
    }

    pub fn file(file_id: i64) -> String {
        format!("/files/{}/", file_id)
    }

    pub fn file_download(file_id: i64) -> String {
        format!("/files/{}/download/", file_id)
    }

    // Reset links carry base64-ish ids and tokens; only `/` and `%` need escaping.
    fn urlencode_segment(segment: &str) -> String {
        segment.replace('%', "%25").replace('/', "%2F")
    }

}

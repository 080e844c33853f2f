use serde::{Deserialize, Serialize};

use crate::format::storage_usage_percent;

/// Authenticated user as returned by `GET /auth/profile/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Reference to the stored picture; fetch the bytes through the proxy route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_limit: Option<u64>,
}

impl User {
    /// Merge the fields present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: UserPatch) {
        let UserPatch {
            username,
            email,
            profile_picture,
            storage_used,
            storage_limit,
        } = patch;

        if let Some(username) = username {
            self.username = username;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(picture) = profile_picture {
            self.profile_picture = Some(picture);
        }
        if let Some(used) = storage_used {
            self.storage_used = Some(used);
        }
        if let Some(limit) = storage_limit {
            self.storage_limit = Some(limit);
        }
    }

    pub fn storage_usage_percent(&self) -> Option<f64> {
        storage_usage_percent(self.storage_used?, self.storage_limit?)
    }
}

/// Partial user record. Profile-edit and picture-upload responses are merged
/// through this instead of re-fetching the profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_limit: Option<u64>,
}

impl UserPatch {
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }
}

impl From<User> for UserPatch {
    fn from(user: User) -> Self {
        Self {
            username: Some(user.username),
            email: Some(user.email),
            profile_picture: user.profile_picture,
            storage_used: user.storage_used,
            storage_limit: user.storage_limit,
        }
    }
}

/// Body of `PUT /auth/profile/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            profile_picture: None,
            storage_used: Some(10),
            storage_limit: Some(100),
        }
    }

    #[test]
    fn apply_merges_only_present_fields() {
        let mut user = alice();
        user.apply(UserPatch::email("x"));
        assert_eq!(user.email, "x");
        assert_eq!(user.username, "alice");
        assert_eq!(user.storage_used, Some(10));
    }

    #[test]
    fn apply_full_patch_replaces_everything_but_id() {
        let mut user = alice();
        let mut replacement = alice();
        replacement.id = 99;
        replacement.username = "alice2".into();
        replacement.profile_picture = Some("pics/a.png".into());
        user.apply(replacement.into());
        assert_eq!(user.id, 1);
        assert_eq!(user.username, "alice2");
        assert_eq!(user.profile_picture.as_deref(), Some("pics/a.png"));
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let user: User =
            serde_json::from_str(r#"{"id":3,"username":"bob","email":"b@example.com"}"#)
                .expect("user json");
        assert_eq!(user.storage_limit, None);
        assert_eq!(user.storage_usage_percent(), None);
        assert_eq!(alice().storage_usage_percent(), Some(10.0));
    }
}

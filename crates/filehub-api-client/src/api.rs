//! Domain methods for the FileHub API client.
//!
//! Response types come from `filehub_core::models`. Credential-bearing calls
//! (login, register, password reset) use [`Access::Anonymous`] so a `401`
//! there never ends an existing session.

use crate::content_disposition::filename_from_header;
use crate::download::DownloadedFile;
use crate::upload::{progress_stream, FileRef, ProgressFn};
use crate::{Access, ApiClient};
use filehub_core::constants::{paths, GENERIC_ERROR_MESSAGE, UPLOAD_FAILED_MESSAGE};
use filehub_core::models::{
    ChangePasswordRequest, DashboardStats, FileRecord, ForgotPasswordRequest, LoginRequest,
    LoginResponse, ProfileUpdate, RegisterRequest, ResetPasswordRequest, User, UserPatch,
};
use filehub_core::{ClientError, ClientResult};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Body;

/// Multipart field carrying the uploaded file.
const FILE_FIELD: &str = "file";
const PROFILE_PICTURE_FIELD: &str = "profile_picture";

impl ApiClient {
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        self.post_json(
            paths::LOGIN,
            &LoginRequest { username, password },
            Access::Anonymous,
        )
        .await
    }

    #[tracing::instrument(skip(self, password, confirm_password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> ClientResult<()> {
        let request = RegisterRequest {
            username,
            email,
            password,
            confirm_password,
        };
        self.post_json_discard(paths::REGISTER, &request, Access::Anonymous)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch_profile(&self) -> ClientResult<User> {
        self.get(paths::PROFILE, &[], Access::Authenticated).await
    }

    /// PUT the profile; the server answers with the updated fields.
    #[tracing::instrument(skip(self))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<UserPatch> {
        let patch: Option<UserPatch> = self
            .put_json(paths::PROFILE, update, Access::Authenticated)
            .await?;
        Ok(patch.unwrap_or_else(|| UserPatch {
            username: Some(update.username.clone()),
            email: Some(update.email.clone()),
            ..UserPatch::default()
        }))
    }

    #[tracing::instrument(skip(self, picture), fields(name = %picture.name, size = picture.size))]
    pub async fn upload_profile_picture(&self, picture: &FileRef) -> ClientResult<UserPatch> {
        let form = Form::new().part(PROFILE_PICTURE_FIELD, buffered_part(picture)?);
        let patch: Option<UserPatch> = self
            .post_multipart(paths::PROFILE_PICTURE, form, None, GENERIC_ERROR_MESSAGE)
            .await?;
        Ok(patch.unwrap_or_default())
    }

    /// Fetch the profile picture through the authenticated proxy route.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_profile_picture(&self) -> ClientResult<DownloadedFile> {
        self.download(paths::PROFILE_PICTURE_PROXY).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> ClientResult<()> {
        self.post_json_discard(
            paths::FORGOT_PASSWORD,
            &ForgotPasswordRequest { email },
            Access::Anonymous,
        )
        .await
    }

    #[tracing::instrument(skip(self, reset_token, new_password))]
    pub async fn reset_password(
        &self,
        user_id: &str,
        reset_token: &str,
        new_password: &str,
    ) -> ClientResult<()> {
        self.post_json_discard(
            &paths::reset_password(user_id, reset_token),
            &ResetPasswordRequest { new_password },
            Access::Anonymous,
        )
        .await
    }

    #[tracing::instrument(skip_all)]
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> ClientResult<()> {
        self.post_json_discard(
            paths::CHANGE_PASSWORD,
            &ChangePasswordRequest {
                current_password,
                new_password,
            },
            Access::Authenticated,
        )
        .await
    }

    /// Upload one file, reporting progress as its bytes are handed to the
    /// transport. Returns the created record when the server sends one back.
    #[tracing::instrument(skip(self, file, on_progress), fields(name = %file.name, size = file.size))]
    pub async fn upload_file(
        &self,
        file: &FileRef,
        on_progress: ProgressFn,
    ) -> ClientResult<Option<FileRecord>> {
        let length = file.data.len() as u64;
        let body = Body::wrap_stream(progress_stream(file.data.clone(), on_progress));
        let part = Part::stream_with_length(body, length).file_name(file.name.clone());
        let part = with_mime(part, &file.mime)?;
        let form = Form::new().part(FILE_FIELD, part);

        let created: Option<serde_json::Value> = self
            .post_multipart(
                paths::FILES,
                form,
                Some(self.upload_timeout()),
                UPLOAD_FAILED_MESSAGE,
            )
            .await?;

        // The upload succeeded; an unexpected body shape only loses the record.
        Ok(created.and_then(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(error = %e, "Upload response is not a file record");
                None
            }
        }))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_files(&self) -> ClientResult<Vec<FileRecord>> {
        self.get(paths::FILES, &[], Access::Authenticated).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_file(&self, file_id: i64) -> ClientResult<FileRecord> {
        self.get(&paths::file(file_id), &[], Access::Authenticated)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_file(&self, file_id: i64) -> ClientResult<()> {
        self.delete(&paths::file(file_id)).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn download_file(&self, file_id: i64) -> ClientResult<DownloadedFile> {
        self.download(&paths::file_download(file_id)).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> ClientResult<DashboardStats> {
        self.get(paths::DASHBOARD, &[], Access::Authenticated).await
    }

    async fn download(&self, path: &str) -> ClientResult<DownloadedFile> {
        let (headers, data) = self.get_bytes(path).await?;
        let disposition = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok());
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(DownloadedFile {
            filename: filename_from_header(disposition),
            content_type,
            data,
        })
    }
}

fn buffered_part(file: &FileRef) -> ClientResult<Part> {
    let part = Part::stream_with_length(Body::from(file.data.clone()), file.data.len() as u64)
        .file_name(file.name.clone());
    with_mime(part, &file.mime)
}

fn with_mime(part: Part, mime: &str) -> ClientResult<Part> {
    part.mime_str(mime)
        .map_err(|_| ClientError::validation(format!("Invalid content type: {}", mime)))
}

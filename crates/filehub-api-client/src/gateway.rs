//! The seam between session/queue logic and HTTP.

use async_trait::async_trait;
use filehub_core::models::{DashboardStats, FileRecord, LoginResponse, ProfileUpdate, User, UserPatch};
use filehub_core::ClientResult;

use crate::download::DownloadedFile;
use crate::upload::{FileRef, ProgressFn};
use crate::ApiClient;

/// Every remote operation the client performs.
///
/// [`ApiClient`] is the production implementation; tests substitute their own.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse>;

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> ClientResult<()>;

    async fn fetch_profile(&self) -> ClientResult<User>;

    async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<UserPatch>;

    async fn upload_profile_picture(&self, picture: &FileRef) -> ClientResult<UserPatch>;

    async fn fetch_profile_picture(&self) -> ClientResult<DownloadedFile>;

    async fn forgot_password(&self, email: &str) -> ClientResult<()>;

    async fn reset_password(
        &self,
        user_id: &str,
        reset_token: &str,
        new_password: &str,
    ) -> ClientResult<()>;

    async fn change_password(&self, current_password: &str, new_password: &str)
        -> ClientResult<()>;

    async fn upload_file(
        &self,
        file: &FileRef,
        on_progress: ProgressFn,
    ) -> ClientResult<Option<FileRecord>>;

    async fn list_files(&self) -> ClientResult<Vec<FileRecord>>;

    async fn get_file(&self, file_id: i64) -> ClientResult<FileRecord>;

    async fn delete_file(&self, file_id: i64) -> ClientResult<()>;

    async fn download_file(&self, file_id: i64) -> ClientResult<DownloadedFile>;

    async fn dashboard_stats(&self) -> ClientResult<DashboardStats>;
}

#[async_trait]
impl Gateway for ApiClient {
    async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        ApiClient::login(self, username, password).await
    }

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> ClientResult<()> {
        ApiClient::register(self, username, email, password, confirm_password).await
    }

    async fn fetch_profile(&self) -> ClientResult<User> {
        ApiClient::fetch_profile(self).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<UserPatch> {
        ApiClient::update_profile(self, update).await
    }

    async fn upload_profile_picture(&self, picture: &FileRef) -> ClientResult<UserPatch> {
        ApiClient::upload_profile_picture(self, picture).await
    }

    async fn fetch_profile_picture(&self) -> ClientResult<DownloadedFile> {
        ApiClient::fetch_profile_picture(self).await
    }

    async fn forgot_password(&self, email: &str) -> ClientResult<()> {
        ApiClient::forgot_password(self, email).await
    }

    async fn reset_password(
        &self,
        user_id: &str,
        reset_token: &str,
        new_password: &str,
    ) -> ClientResult<()> {
        ApiClient::reset_password(self, user_id, reset_token, new_password).await
    }

    async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> ClientResult<()> {
        ApiClient::change_password(self, current_password, new_password).await
    }

    async fn upload_file(
        &self,
        file: &FileRef,
        on_progress: ProgressFn,
    ) -> ClientResult<Option<FileRecord>> {
        ApiClient::upload_file(self, file, on_progress).await
    }

    async fn list_files(&self) -> ClientResult<Vec<FileRecord>> {
        ApiClient::list_files(self).await
    }

    async fn get_file(&self, file_id: i64) -> ClientResult<FileRecord> {
        ApiClient::get_file(self, file_id).await
    }

    async fn delete_file(&self, file_id: i64) -> ClientResult<()> {
        ApiClient::delete_file(self, file_id).await
    }

    async fn download_file(&self, file_id: i64) -> ClientResult<DownloadedFile> {
        ApiClient::download_file(self, file_id).await
    }

    async fn dashboard_stats(&self) -> ClientResult<DashboardStats> {
        ApiClient::dashboard_stats(self).await
    }
}

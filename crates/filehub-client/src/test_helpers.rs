//! In-memory [`Gateway`] for session and queue tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use filehub_api_client::upload::UploadProgress;
use filehub_api_client::{DownloadedFile, FileRef, Gateway, ProgressFn};
use filehub_core::models::{DashboardStats, FileRecord, LoginResponse, ProfileUpdate, User, UserPatch};
use filehub_core::{ClientError, ClientResult};
use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub enum UploadBehavior {
    Reject(String),
    RejectOnce(String),
    Expire,
    Network,
}

pub fn alice() -> User {
    User {
        id: 1,
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        profile_picture: None,
        storage_used: Some(1024),
        storage_limit: Some(1024 * 1024),
    }
}

fn epoch_record(name: &str, size: u64) -> FileRecord {
    FileRecord {
        id: 1,
        file_name: format!("uploads/{}", name),
        file: String::new(),
        file_size: size,
        uploaded_at: Utc.timestamp_opt(0, 0).unwrap(),
    }
}

pub fn file(name: &str, size: usize) -> FileRef {
    FileRef::from_bytes(name.to_string(), vec![0u8; size])
}

#[derive(Default)]
pub struct MockGateway {
    profile: Mutex<Option<User>>,
    credentials: Option<(String, String, String)>,
    uploads: Mutex<HashMap<String, UploadBehavior>>,
    delay: Duration,
    uploaded: Mutex<Vec<String>>,
    registered: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    login_calls: AtomicUsize,
    profile_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, user: User) -> Self {
        *self.profile.lock() = Some(user);
        self
    }

    pub fn with_credentials(mut self, username: &str, password: &str, token: &str) -> Self {
        self.credentials = Some((username.into(), password.into(), token.into()));
        self
    }

    pub fn with_upload(self, name: &str, behavior: UploadBehavior) -> Self {
        self.uploads.lock().insert(name.to_string(), behavior);
        self
    }

    pub fn with_delay_ms(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().clone()
    }

    pub fn registered(&self) -> Vec<String> {
        self.registered.lock().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    fn upload_result(&self, name: &str) -> ClientResult<()> {
        let mut uploads = self.uploads.lock();
        match uploads.get(name).cloned() {
            None => Ok(()),
            Some(UploadBehavior::Reject(message)) => Err(ClientError::Server {
                status: 400,
                message,
            }),
            Some(UploadBehavior::RejectOnce(message)) => {
                uploads.remove(name);
                Err(ClientError::Server {
                    status: 503,
                    message,
                })
            }
            Some(UploadBehavior::Expire) => {
                Err(ClientError::SessionExpired("Token expired".to_string()))
            }
            Some(UploadBehavior::Network) => {
                Err(ClientError::Network("Network error occurred".to_string()))
            }
        }
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        match &self.credentials {
            Some((u, p, token)) if u == username && p == password => Ok(LoginResponse {
                access: Some(token.clone()),
                refresh: None,
            }),
            _ => Err(ClientError::Unauthorized("Invalid credentials".to_string())),
        }
    }

    async fn register(
        &self,
        username: &str,
        _email: &str,
        _password: &str,
        _confirm_password: &str,
    ) -> ClientResult<()> {
        self.registered.lock().push(username.to_string());
        Ok(())
    }

    async fn fetch_profile(&self) -> ClientResult<User> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profile
            .lock()
            .clone()
            .ok_or_else(|| ClientError::SessionExpired("Given token not valid".to_string()))
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<UserPatch> {
        Ok(UserPatch {
            username: Some(update.username.clone()),
            email: Some(update.email.clone()),
            ..UserPatch::default()
        })
    }

    async fn upload_profile_picture(&self, picture: &FileRef) -> ClientResult<UserPatch> {
        let reference = format!("profile_pictures/{}", picture.name);
        if let Some(user) = self.profile.lock().as_mut() {
            user.profile_picture = Some(reference.clone());
        }
        Ok(UserPatch {
            profile_picture: Some(reference),
            ..UserPatch::default()
        })
    }

    async fn fetch_profile_picture(&self) -> ClientResult<DownloadedFile> {
        Ok(DownloadedFile {
            filename: "me.png".to_string(),
            content_type: Some("image/png".to_string()),
            data: Bytes::from_static(&[0x89, b'P', b'N', b'G']),
        })
    }

    async fn forgot_password(&self, _email: &str) -> ClientResult<()> {
        Ok(())
    }

    async fn reset_password(
        &self,
        _user_id: &str,
        _reset_token: &str,
        _new_password: &str,
    ) -> ClientResult<()> {
        Ok(())
    }

    async fn change_password(
        &self,
        _current_password: &str,
        _new_password: &str,
    ) -> ClientResult<()> {
        Ok(())
    }

    async fn upload_file(
        &self,
        file: &FileRef,
        on_progress: ProgressFn,
    ) -> ClientResult<Option<FileRecord>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.uploaded.lock().push(file.name.clone());

        // Deliberately out of order: the queue must not let progress go backwards.
        let total = file.size;
        for sent in [total / 4, total / 2, total / 4, total * 3 / 4, total] {
            on_progress(UploadProgress {
                sent,
                total: Some(total),
            });
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = self.upload_result(&file.name);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result.map(|()| Some(epoch_record(&file.name, file.size)))
    }

    async fn list_files(&self) -> ClientResult<Vec<FileRecord>> {
        Ok(self
            .uploaded()
            .iter()
            .map(|name| epoch_record(name, 0))
            .collect())
    }

    async fn get_file(&self, file_id: i64) -> ClientResult<FileRecord> {
        Err(ClientError::Server {
            status: 404,
            message: format!("File {} not found", file_id),
        })
    }

    async fn delete_file(&self, _file_id: i64) -> ClientResult<()> {
        Ok(())
    }

    async fn download_file(&self, _file_id: i64) -> ClientResult<DownloadedFile> {
        Ok(DownloadedFile {
            filename: "downloaded_file".to_string(),
            content_type: None,
            data: Bytes::new(),
        })
    }

    async fn dashboard_stats(&self) -> ClientResult<DashboardStats> {
        Ok(DashboardStats {
            total_files: 0,
            total_storage_used: 0,
            recent_uploads: Vec::new(),
            file_type_distribution: Vec::new(),
        })
    }
}

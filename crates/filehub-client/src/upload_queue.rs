//! Client-side upload queue.
//!
//! Jobs move `Pending -> Uploading -> Success | Error`, and `Error -> Pending`
//! on [`UploadQueue::retry`]. Submission is strictly sequential: every
//! mutating method takes `&mut self`, so at most one job is ever uploading.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use filehub_api_client::upload::UploadProgress;
use filehub_api_client::{FileRef, Gateway, ProgressFn};
use filehub_core::models::FileRecord;
use filehub_core::ClientError;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(Uuid);

impl JobId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Uploading,
    Success,
    Error,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobStatus::Pending => "pending",
            JobStatus::Uploading => "uploading",
            JobStatus::Success => "success",
            JobStatus::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
pub struct UploadJob {
    id: JobId,
    file: FileRef,
    status: JobStatus,
    progress: Arc<AtomicU8>,
    error_detail: Option<String>,
    record: Option<FileRecord>,
}

impl UploadJob {
    fn new(file: FileRef) -> Self {
        Self {
            id: JobId::new(),
            file,
            status: JobStatus::Pending,
            progress: Arc::new(AtomicU8::new(0)),
            error_detail: None,
            record: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn file(&self) -> &FileRef {
        &self.file
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Percentage 0-100. Only meaningful while uploading or after success.
    pub fn progress(&self) -> u8 {
        self.progress.load(Ordering::Acquire)
    }

    /// Failure reason; set only when the status is [`JobStatus::Error`].
    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    /// Record the server created for this upload, when it returned one.
    pub fn record(&self) -> Option<&FileRecord> {
        self.record.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    JobStarted { id: JobId },
    Progress { id: JobId, percent: u8 },
    JobSucceeded { id: JobId },
    JobFailed { id: JobId, message: String },
    /// Every job in the queue has been uploaded.
    BatchComplete,
}

/// Summary of one [`UploadQueue::submit_all_pending`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// The session expired mid-batch; later jobs were left pending.
    pub aborted: bool,
    /// Something was uploaded and every job in the queue is now a success.
    pub complete: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("No upload job with id {0}")]
    UnknownJob(JobId),

    #[error("Job {0} is uploading and cannot be changed")]
    JobUploading(JobId),

    #[error("Job {0} is not pending")]
    NotPending(JobId),

    #[error("Cannot clear the queue while an upload is in progress")]
    UploadInProgress,

    #[error("Job {0} has not failed")]
    NotFailed(JobId),
}

pub struct UploadQueue<G: Gateway> {
    gateway: Arc<G>,
    jobs: Vec<UploadJob>,
    events: Option<mpsc::UnboundedSender<QueueEvent>>,
}

impl<G: Gateway> UploadQueue<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            jobs: Vec::new(),
            events: None,
        }
    }

    /// Receive queue events from now on. Replaces any earlier subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<QueueEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn jobs(&self) -> &[UploadJob] {
        &self.jobs
    }

    pub fn get(&self, id: JobId) -> Option<&UploadJob> {
        self.jobs.iter().find(|job| job.id == id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.count(JobStatus::Pending)
    }

    pub fn is_uploading(&self) -> bool {
        self.count(JobStatus::Uploading) > 0
    }

    /// Append one pending job per file, in order. Duplicate names are kept.
    pub fn enqueue(&mut self, files: impl IntoIterator<Item = FileRef>) -> Vec<JobId> {
        let start = self.jobs.len();
        self.jobs.extend(files.into_iter().map(UploadJob::new));
        let ids: Vec<JobId> = self.jobs[start..].iter().map(|job| job.id).collect();
        tracing::debug!(added = ids.len(), total = self.jobs.len(), "Files queued");
        ids
    }

    pub fn remove(&mut self, id: JobId) -> Result<UploadJob, QueueError> {
        let index = self.index_of(id)?;
        if self.jobs[index].status == JobStatus::Uploading {
            return Err(QueueError::JobUploading(id));
        }
        Ok(self.jobs.remove(index))
    }

    pub fn clear(&mut self) -> Result<(), QueueError> {
        if self.is_uploading() {
            return Err(QueueError::UploadInProgress);
        }
        self.jobs.clear();
        Ok(())
    }

    /// Put a failed job back to pending so the next batch picks it up.
    pub fn retry(&mut self, id: JobId) -> Result<(), QueueError> {
        let index = self.index_of(id)?;
        let job = &mut self.jobs[index];
        if job.status != JobStatus::Error {
            return Err(QueueError::NotFailed(id));
        }
        job.status = JobStatus::Pending;
        job.error_detail = None;
        job.progress.store(0, Ordering::Release);
        Ok(())
    }

    /// Upload a single pending job. Upload failures are recorded on the job,
    /// not returned; the final status is.
    pub async fn submit_one(&mut self, id: JobId) -> Result<JobStatus, QueueError> {
        let index = self.index_of(id)?;
        if self.jobs[index].status != JobStatus::Pending {
            return Err(QueueError::NotPending(id));
        }
        let _ = self.run_job(index).await;
        Ok(self.jobs[index].status)
    }

    /// Upload every pending job, one after another, in queue order.
    ///
    /// A failed job does not stop the batch, except when the session has
    /// expired: the remaining jobs then stay pending.
    #[tracing::instrument(skip(self), fields(queued = self.jobs.len()))]
    pub async fn submit_all_pending(&mut self) -> BatchOutcome {
        let pending: Vec<JobId> = self
            .jobs
            .iter()
            .filter(|job| job.status == JobStatus::Pending)
            .map(|job| job.id)
            .collect();

        let mut outcome = BatchOutcome::default();
        if pending.is_empty() {
            tracing::info!("No files to upload");
            return outcome;
        }

        for id in pending {
            let Ok(index) = self.index_of(id) else {
                continue;
            };
            if self.jobs[index].status != JobStatus::Pending {
                continue;
            }

            outcome.attempted += 1;
            match self.run_job(index).await {
                Ok(()) => outcome.succeeded += 1,
                Err(err) => {
                    outcome.failed += 1;
                    if err.is_session_expired() {
                        tracing::warn!("Session expired; stopping upload batch");
                        outcome.aborted = true;
                        break;
                    }
                }
            }
        }

        outcome.complete = !outcome.aborted
            && self.jobs.iter().all(|job| job.status == JobStatus::Success);
        if outcome.complete {
            self.emit(QueueEvent::BatchComplete);
        }

        tracing::info!(
            attempted = outcome.attempted,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            aborted = outcome.aborted,
            "Upload batch finished"
        );
        outcome
    }

    async fn run_job(&mut self, index: usize) -> Result<(), ClientError> {
        let (id, file, progress) = {
            let job = &mut self.jobs[index];
            job.status = JobStatus::Uploading;
            job.error_detail = None;
            job.progress.store(0, Ordering::Release);
            (job.id, job.file.clone(), job.progress.clone())
        };
        self.emit(QueueEvent::JobStarted { id });

        let on_progress = progress_callback(id, progress, self.events.clone());
        let result = self.gateway.upload_file(&file, on_progress).await;

        let job = &mut self.jobs[index];
        match result {
            Ok(record) => {
                job.progress.store(100, Ordering::Release);
                job.status = JobStatus::Success;
                job.record = record;
                tracing::info!(job = %id, name = %job.file.name, "Upload succeeded");
                self.emit(QueueEvent::JobSucceeded { id });
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                job.status = JobStatus::Error;
                job.error_detail = Some(message.clone());
                tracing::warn!(job = %id, name = %job.file.name, error = %message, "Upload failed");
                self.emit(QueueEvent::JobFailed { id, message });
                Err(err)
            }
        }
    }

    fn emit(&self, event: QueueEvent) {
        if let Some(tx) = &self.events {
            // Receiver gone just means nobody is watching.
            let _ = tx.send(event);
        }
    }

    fn index_of(&self, id: JobId) -> Result<usize, QueueError> {
        self.jobs
            .iter()
            .position(|job| job.id == id)
            .ok_or(QueueError::UnknownJob(id))
    }

    fn count(&self, status: JobStatus) -> usize {
        self.jobs.iter().filter(|job| job.status == status).count()
    }
}

fn progress_callback(
    id: JobId,
    progress: Arc<AtomicU8>,
    events: Option<mpsc::UnboundedSender<QueueEvent>>,
) -> ProgressFn {
    Arc::new(move |update: UploadProgress| {
        let Some(percent) = update.percent() else {
            return;
        };
        let previous = progress.fetch_max(percent, Ordering::AcqRel);
        if percent > previous {
            if let Some(tx) = &events {
                let _ = tx.send(QueueEvent::Progress { id, percent });
            }
        }
    })
}

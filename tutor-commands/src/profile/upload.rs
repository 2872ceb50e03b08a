use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;
use tracing::debug;

use tutor_api::ImageFile;

static NEXT_PREVIEW: AtomicU64 = AtomicU64::new(1);

/// Local, revocable reference to a picked image, shown until the backend
/// holds the authoritative copy.
#[derive(Clone, Debug)]
pub struct Preview {
    uri: String,
}

impl Preview {
    pub fn create(file: &ImageFile) -> Self {
        let seq = NEXT_PREVIEW.fetch_add(1, Ordering::Relaxed);
        Self {
            uri: format!("preview://{}/{}", seq, file.file_name),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn revoke(self) {
        debug!(uri = %self.uri, "preview revoked");
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum UploadStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed(String),
}

impl UploadStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Transient upload state owned by one mounted view.
#[derive(Debug, Default)]
pub struct UploadState {
    pub(crate) preview: Option<Preview>,
    pub(crate) status: UploadStatus,
    /// Bumped per selection so a late result never touches a newer pick.
    pub(crate) action: u64,
}

impl UploadState {
    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn status(&self) -> &UploadStatus {
        &self.status
    }
}

/// One-shot user-visible message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

impl Notification {
    pub fn message(&self) -> &str {
        match self {
            Self::Success(message) | Self::Error(message) => message,
        }
    }
}

pub const UPLOAD_SUCCEEDED: &str = "Profile picture updated!";
pub const UPLOAD_FAILED: &str = "Failed to update profile picture.";

/// Handle on a submitted upload mutation.
#[derive(Debug)]
pub struct UploadHandle {
    task: JoinHandle<UploadStatus>,
}

impl UploadHandle {
    pub(crate) fn new(task: JoinHandle<UploadStatus>) -> Self {
        Self { task }
    }

    /// Wait for the mutation (and the follow-up profile re-fetch) to finish.
    pub async fn finished(self) -> UploadStatus {
        match self.task.await {
            Ok(status) => status,
            Err(e) => UploadStatus::Failed(format!("upload task aborted: {e}")),
        }
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The failure categories an operator can see. Every operation reports at
/// most one of these per invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    FetchFailed,
    UploadFailed,
    Validation,
    SaveFailed,
    DeleteFailed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to fetch overlays")]
    Fetch(#[source] anyhow::Error),
    #[error("failed to upload logo")]
    Upload(#[source] anyhow::Error),
    #[error("{0}")]
    Validation(String),
    #[error("failed to save overlay")]
    Save(#[source] anyhow::Error),
    #[error("failed to delete overlay")]
    Delete(#[source] anyhow::Error),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Fetch(_) => ErrorKind::FetchFailed,
            SessionError::Upload(_) => ErrorKind::UploadFailed,
            SessionError::Validation(_) => ErrorKind::Validation,
            SessionError::Save(_) => ErrorKind::SaveFailed,
            SessionError::Delete(_) => ErrorKind::DeleteFailed,
        }
    }
}

/// The single user-visible error slot. Failures overwrite it (last one
/// wins); successful operations never clear it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LastError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&SessionError> for LastError {
    fn from(err: &SessionError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

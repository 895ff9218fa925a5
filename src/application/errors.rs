use uuid::Uuid;

use crate::domain::documents::document::Revision;

/// Both sides of a lost optimistic-concurrency race, for the caller to
/// present side by side.
#[derive(Debug, Clone)]
pub struct SaveConflict {
    pub attempted_body: String,
    pub attempted_message: String,
    pub base_revision_id: Uuid,
    pub current: Revision,
}

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("document changed since revision {}", .0.base_revision_id)]
    Conflict(Box<SaveConflict>),
    #[error("document or revision not found")]
    NotFound,
    #[error("path already in use: {0}")]
    PathTaken(String),
    #[error("invalid document path: {0:?}")]
    InvalidPath(String),
    #[error("document store failure")]
    Store(#[source] anyhow::Error),
}

impl DocumentError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, DocumentError::Conflict(_))
    }

    pub fn conflict(&self) -> Option<&SaveConflict> {
        match self {
            DocumentError::Conflict(c) => Some(c),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for DocumentError {
    fn from(err: anyhow::Error) -> Self {
        DocumentError::Store(err)
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub path: String,
    pub title: String,
    pub doc_type: String,
    pub sensitivity: String,
    pub owner: Uuid,
    pub client_id: Option<Uuid>,
    pub current_revision_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable body snapshot. Rows are only ever inserted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Revision {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub document_id: Uuid,
    pub body: String,
    pub message: String,
    /// What the author believed was current when the edit started.
    pub base_revision_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevisionSummary {
    pub id: Uuid,
    pub message: String,
    pub base_revision_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<&Revision> for RevisionSummary {
    fn from(rev: &Revision) -> Self {
        Self {
            id: rev.id,
            message: rev.message.clone(),
            base_revision_id: rev.base_revision_id,
            created_by: rev.created_by,
            created_at: rev.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub path: String,
    pub title: String,
    pub doc_type: String,
    pub sensitivity: String,
    pub owner: Uuid,
    pub client_id: Option<Uuid>,
}

/// Revision payload handed to the store; ids and timestamps are assigned there.
#[derive(Debug, Clone)]
pub struct NewRevision {
    pub body: String,
    pub message: String,
    pub created_by: Uuid,
}

/// Derived edge, rebuilt wholesale whenever the source document changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkEdge {
    pub tenant_id: Uuid,
    pub from_document_id: Uuid,
    pub to_document_id: Option<Uuid>,
    pub link_path: String,
    pub broken: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacklinkInfo {
    pub document_id: Uuid,
    pub title: String,
    pub path: String,
    pub link_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokenLink {
    pub from_document_id: Uuid,
    pub from_title: String,
    pub from_path: String,
    pub link_path: String,
}

//! In-process adapters for every application port.
//!
//! They keep the same guarantees as the Postgres adapters: the
//! compare-and-repoint append runs under a single write lock, revisions are
//! never mutated, and every lookup is tenant-scoped.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::application::ports::audit_sink::AuditSink;
use crate::application::ports::document_repository::{
    AppendOutcome, CreateOutcome, DocumentRepository, RenameOutcome,
};
use crate::application::ports::entity_lookup::{EntityKind, EntityLookup, EntitySummary};
use crate::application::ports::linkgraph_repository::LinkGraphRepository;
use crate::domain::documents::document::{
    BacklinkInfo, BrokenLink, Document, LinkEdge, NewDocument, NewRevision, Revision,
    RevisionSummary,
};

#[derive(Default)]
struct State {
    documents: HashMap<Uuid, Document>,
    revisions: Vec<Revision>,
    edges: Vec<LinkEdge>,
}

impl State {
    fn document(&self, tenant_id: Uuid, id: Uuid) -> Option<&Document> {
        self.documents
            .get(&id)
            .filter(|d| d.tenant_id == tenant_id)
    }

    fn revision(&self, tenant_id: Uuid, document_id: Uuid, id: Uuid) -> Option<&Revision> {
        self.revisions
            .iter()
            .find(|r| r.id == id && r.tenant_id == tenant_id && r.document_id == document_id)
    }

    fn path_taken(&self, tenant_id: Uuid, path: &str) -> bool {
        self.documents
            .values()
            .any(|d| d.tenant_id == tenant_id && d.path == path)
    }

    fn push_revision(
        &mut self,
        tenant_id: Uuid,
        document_id: Uuid,
        base_revision_id: Option<Uuid>,
        rev: &NewRevision,
    ) -> Revision {
        let revision = Revision {
            id: Uuid::new_v4(),
            tenant_id,
            document_id,
            body: rev.body.clone(),
            message: rev.message.clone(),
            base_revision_id,
            created_by: rev.created_by,
            created_at: Utc::now(),
        };
        self.revisions.push(revision.clone());
        if let Some(doc) = self.documents.get_mut(&document_id) {
            doc.current_revision_id = revision.id;
            doc.updated_at = revision.created_at;
        }
        revision
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn revision_count(&self, tenant_id: Uuid, document_id: Uuid) -> usize {
        let state = self.state.read().await;
        state
            .revisions
            .iter()
            .filter(|r| r.tenant_id == tenant_id && r.document_id == document_id)
            .count()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryStore {
    async fn create_with_revision(
        &self,
        tenant_id: Uuid,
        doc: &NewDocument,
        first: &NewRevision,
    ) -> anyhow::Result<CreateOutcome> {
        let mut state = self.state.write().await;
        if state.path_taken(tenant_id, &doc.path) {
            return Ok(CreateOutcome::PathTaken);
        }
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            tenant_id,
            path: doc.path.clone(),
            title: doc.title.clone(),
            doc_type: doc.doc_type.clone(),
            sensitivity: doc.sensitivity.clone(),
            owner: doc.owner,
            client_id: doc.client_id,
            current_revision_id: Uuid::nil(),
            created_at: now,
            updated_at: now,
        };
        let id = document.id;
        state.documents.insert(id, document);
        let revision = state.push_revision(tenant_id, id, None, first);
        let document = state
            .documents
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("document vanished during create"))?;
        Ok(CreateOutcome::Created(document, revision))
    }

    async fn get(&self, tenant_id: Uuid, id: Uuid) -> anyhow::Result<Option<Document>> {
        Ok(self.state.read().await.document(tenant_id, id).cloned())
    }

    async fn find_by_path(&self, tenant_id: Uuid, path: &str) -> anyhow::Result<Option<Document>> {
        let state = self.state.read().await;
        Ok(state
            .documents
            .values()
            .find(|d| d.tenant_id == tenant_id && d.path == path)
            .cloned())
    }

    async fn get_revision(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        revision_id: Uuid,
    ) -> anyhow::Result<Option<Revision>> {
        let state = self.state.read().await;
        Ok(state.revision(tenant_id, document_id, revision_id).cloned())
    }

    async fn list_revisions(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
    ) -> anyhow::Result<Vec<RevisionSummary>> {
        let state = self.state.read().await;
        Ok(state
            .revisions
            .iter()
            .rev()
            .filter(|r| r.tenant_id == tenant_id && r.document_id == document_id)
            .map(RevisionSummary::from)
            .collect())
    }

    async fn append_if_current(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        expected_current: Uuid,
        rev: &NewRevision,
    ) -> anyhow::Result<AppendOutcome> {
        let mut state = self.state.write().await;
        let Some(current_id) = state
            .document(tenant_id, document_id)
            .map(|d| d.current_revision_id)
        else {
            return Ok(AppendOutcome::Missing);
        };
        if current_id != expected_current {
            let current = state
                .revision(tenant_id, document_id, current_id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("current revision {current_id} missing"))?;
            return Ok(AppendOutcome::Stale(current));
        }
        let revision = state.push_revision(tenant_id, document_id, Some(expected_current), rev);
        Ok(AppendOutcome::Committed(revision))
    }

    async fn append_at_head(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        rev: &NewRevision,
    ) -> anyhow::Result<Option<Revision>> {
        let mut state = self.state.write().await;
        let Some(current_id) = state
            .document(tenant_id, document_id)
            .map(|d| d.current_revision_id)
        else {
            return Ok(None);
        };
        Ok(Some(state.push_revision(
            tenant_id,
            document_id,
            Some(current_id),
            rev,
        )))
    }

    async fn rename(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        new_path: &str,
    ) -> anyhow::Result<RenameOutcome> {
        let mut state = self.state.write().await;
        let Some(old_path) = state
            .document(tenant_id, document_id)
            .map(|d| d.path.clone())
        else {
            return Ok(RenameOutcome::Missing);
        };
        if old_path != new_path && state.path_taken(tenant_id, new_path) {
            return Ok(RenameOutcome::PathTaken);
        }
        let Some(doc) = state.documents.get_mut(&document_id) else {
            return Ok(RenameOutcome::Missing);
        };
        doc.path = new_path.to_string();
        doc.updated_at = Utc::now();
        Ok(RenameOutcome::Renamed {
            document: doc.clone(),
            old_path,
        })
    }
}

#[async_trait]
impl LinkGraphRepository for InMemoryStore {
    async fn find_document_id_by_path(
        &self,
        tenant_id: Uuid,
        path: &str,
    ) -> anyhow::Result<Option<Uuid>> {
        Ok(self
            .find_by_path(tenant_id, path)
            .await?
            .map(|d| d.id))
    }

    async fn replace_outbound(
        &self,
        tenant_id: Uuid,
        from_document_id: Uuid,
        revision_id: Uuid,
        edges: &[LinkEdge],
    ) -> anyhow::Result<bool> {
        let mut state = self.state.write().await;
        let current = state
            .document(tenant_id, from_document_id)
            .map(|d| d.current_revision_id);
        if current != Some(revision_id) {
            return Ok(false);
        }
        state
            .edges
            .retain(|e| !(e.tenant_id == tenant_id && e.from_document_id == from_document_id));
        state.edges.extend(edges.iter().cloned());
        Ok(true)
    }

    async fn mark_path_broken(&self, tenant_id: Uuid, path: &str) -> anyhow::Result<u64> {
        let mut state = self.state.write().await;
        let mut touched = 0;
        for edge in state
            .edges
            .iter_mut()
            .filter(|e| e.tenant_id == tenant_id && e.link_path == path)
        {
            edge.broken = true;
            edge.to_document_id = None;
            touched += 1;
        }
        Ok(touched)
    }

    async fn outgoing(
        &self,
        tenant_id: Uuid,
        from_document_id: Uuid,
    ) -> anyhow::Result<Vec<LinkEdge>> {
        let state = self.state.read().await;
        Ok(state
            .edges
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.from_document_id == from_document_id)
            .cloned()
            .collect())
    }

    async fn backlinks(
        &self,
        tenant_id: Uuid,
        target_id: Uuid,
    ) -> anyhow::Result<Vec<BacklinkInfo>> {
        let state = self.state.read().await;
        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for edge in state
            .edges
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.to_document_id == Some(target_id))
        {
            *counts.entry(edge.from_document_id).or_default() += 1;
        }
        let mut out: Vec<BacklinkInfo> = counts
            .into_iter()
            .filter_map(|(id, link_count)| {
                state.document(tenant_id, id).map(|d| BacklinkInfo {
                    document_id: d.id,
                    title: d.title.clone(),
                    path: d.path.clone(),
                    link_count,
                })
            })
            .collect();
        out.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.path.cmp(&b.path)));
        Ok(out)
    }

    async fn broken_links(&self, tenant_id: Uuid) -> anyhow::Result<Vec<BrokenLink>> {
        let state = self.state.read().await;
        let mut out: Vec<BrokenLink> = state
            .edges
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.broken)
            .filter_map(|e| {
                state.document(tenant_id, e.from_document_id).map(|d| BrokenLink {
                    from_document_id: d.id,
                    from_title: d.title.clone(),
                    from_path: d.path.clone(),
                    link_path: e.link_path.clone(),
                })
            })
            .collect();
        out.sort_by(|a, b| {
            a.from_title
                .cmp(&b.from_title)
                .then_with(|| a.link_path.cmp(&b.link_path))
        });
        Ok(out)
    }
}

/// Entity lookup over a fixed set of entities. Kinds listed in `failing`
/// return an error, which lets callers exercise degraded rendering.
#[derive(Default)]
pub struct InMemoryEntityLookup {
    entities: HashMap<(Uuid, EntityKind), HashMap<Uuid, EntitySummary>>,
    failing: HashSet<EntityKind>,
    calls: Mutex<Vec<(EntityKind, usize)>>,
}

impl InMemoryEntityLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, tenant_id: Uuid, kind: EntityKind, entity: EntitySummary) -> Self {
        self.entities
            .entry((tenant_id, kind))
            .or_default()
            .insert(entity.id, entity);
        self
    }

    pub fn failing(mut self, kind: EntityKind) -> Self {
        self.failing.insert(kind);
        self
    }

    /// (kind, number of ids) per batch call, in call order.
    pub async fn calls(&self) -> Vec<(EntityKind, usize)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl EntityLookup for InMemoryEntityLookup {
    async fn batch_load(
        &self,
        tenant_id: Uuid,
        kind: EntityKind,
        ids: &[Uuid],
    ) -> anyhow::Result<HashMap<Uuid, EntitySummary>> {
        self.calls.lock().await.push((kind, ids.len()));
        if self.failing.contains(&kind) {
            anyhow::bail!("{} lookup unavailable", kind.as_str());
        }
        let Some(known) = self.entities.get(&(tenant_id, kind)) else {
            return Ok(HashMap::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| known.get(id).map(|e| (*id, e.clone())))
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub tenant_id: Uuid,
    pub actor: Uuid,
    pub action: String,
    pub target_type: String,
    pub target_id: Uuid,
    pub metadata: serde_json::Value,
}

/// Keeps audit entries in memory so callers can assert on them.
#[derive(Default)]
pub struct InMemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn log(
        &self,
        tenant_id: Uuid,
        actor: Uuid,
        action: &str,
        target_type: &str,
        target_id: Uuid,
        metadata: serde_json::Value,
    ) -> anyhow::Result<()> {
        self.records.lock().await.push(AuditRecord {
            tenant_id,
            actor,
            action: action.to_string(),
            target_type: target_type.to_string(),
            target_id,
            metadata,
        });
        Ok(())
    }
}

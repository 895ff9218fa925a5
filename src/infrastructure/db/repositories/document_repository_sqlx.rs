use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::document_repository::{
    AppendOutcome, CreateOutcome, DocumentRepository, RenameOutcome,
};
use crate::domain::documents::document::{
    Document, NewDocument, NewRevision, Revision, RevisionSummary,
};
use crate::infrastructure::db::PgPool;

const DOCUMENT_COLUMNS: &str = "id, tenant_id, path, title, doc_type, sensitivity, owner_id, \
                                client_id, current_revision_id, created_at, updated_at";
const REVISION_COLUMNS: &str =
    "id, tenant_id, document_id, body, message, base_revision_id, created_by, created_at";

pub struct SqlxDocumentRepository {
    pub pool: PgPool,
}

impl SqlxDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_document(r: &PgRow) -> Document {
    Document {
        id: r.get("id"),
        tenant_id: r.get("tenant_id"),
        path: r.get("path"),
        title: r.get("title"),
        doc_type: r.get("doc_type"),
        sensitivity: r.get("sensitivity"),
        owner: r.get("owner_id"),
        client_id: r.try_get("client_id").ok().flatten(),
        current_revision_id: r.get("current_revision_id"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

fn map_revision(r: &PgRow) -> Revision {
    Revision {
        id: r.get("id"),
        tenant_id: r.get("tenant_id"),
        document_id: r.get("document_id"),
        body: r.get("body"),
        message: r.get("message"),
        base_revision_id: r.try_get("base_revision_id").ok().flatten(),
        created_by: r.get("created_by"),
        created_at: r.get("created_at"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

async fn insert_revision(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    tenant_id: Uuid,
    document_id: Uuid,
    base_revision_id: Option<Uuid>,
    rev: &NewRevision,
) -> anyhow::Result<Revision> {
    let row = sqlx::query(&format!(
        "INSERT INTO revisions
           (id, tenant_id, document_id, body, message, base_revision_id, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {REVISION_COLUMNS}"
    ))
    .bind(id)
    .bind(tenant_id)
    .bind(document_id)
    .bind(&rev.body)
    .bind(&rev.message)
    .bind(base_revision_id)
    .bind(rev.created_by)
    .fetch_one(&mut **tx)
    .await?;
    Ok(map_revision(&row))
}

#[async_trait]
impl DocumentRepository for SqlxDocumentRepository {
    async fn create_with_revision(
        &self,
        tenant_id: Uuid,
        doc: &NewDocument,
        first: &NewRevision,
    ) -> anyhow::Result<CreateOutcome> {
        let document_id = Uuid::new_v4();
        let revision_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;
        // The current-revision foreign key is deferred, so the document row can
        // point at the revision inserted right after it.
        let row = sqlx::query(&format!(
            "INSERT INTO documents (id, tenant_id, path, title, doc_type, sensitivity, owner_id,
                                    client_id, current_revision_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (tenant_id, path) DO NOTHING
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(document_id)
        .bind(tenant_id)
        .bind(&doc.path)
        .bind(&doc.title)
        .bind(&doc.doc_type)
        .bind(&doc.sensitivity)
        .bind(doc.owner)
        .bind(doc.client_id)
        .bind(revision_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(CreateOutcome::PathTaken);
        };
        let document = map_document(&row);
        let revision =
            insert_revision(&mut tx, revision_id, tenant_id, document_id, None, first).await?;
        tx.commit().await?;
        Ok(CreateOutcome::Created(document, revision))
    }

    async fn get(&self, tenant_id: Uuid, id: Uuid) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_document))
    }

    async fn find_by_path(&self, tenant_id: Uuid, path: &str) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE tenant_id = $1 AND path = $2"
        ))
        .bind(tenant_id)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_document))
    }

    async fn get_revision(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        revision_id: Uuid,
    ) -> anyhow::Result<Option<Revision>> {
        let row = sqlx::query(&format!(
            "SELECT {REVISION_COLUMNS} FROM revisions
             WHERE id = $1 AND document_id = $2 AND tenant_id = $3"
        ))
        .bind(revision_id)
        .bind(document_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_revision))
    }

    async fn list_revisions(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
    ) -> anyhow::Result<Vec<RevisionSummary>> {
        let rows = sqlx::query(
            r#"SELECT id, message, base_revision_id, created_by, created_at
               FROM revisions
               WHERE tenant_id = $1 AND document_id = $2
               ORDER BY seq DESC"#,
        )
        .bind(tenant_id)
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| RevisionSummary {
                id: r.get("id"),
                message: r.get("message"),
                base_revision_id: r.try_get("base_revision_id").ok().flatten(),
                created_by: r.get("created_by"),
                created_at: r.get("created_at"),
            })
            .collect())
    }

    async fn append_if_current(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        expected_current: Uuid,
        rev: &NewRevision,
    ) -> anyhow::Result<AppendOutcome> {
        let revision_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;
        // Compare-and-swap on the pointer. A concurrent writer holding the row
        // lock makes this wait, then re-check the predicate against its commit.
        let swapped = sqlx::query(
            r#"UPDATE documents SET current_revision_id = $1, updated_at = now()
               WHERE id = $2 AND tenant_id = $3 AND current_revision_id = $4"#,
        )
        .bind(revision_id)
        .bind(document_id)
        .bind(tenant_id)
        .bind(expected_current)
        .execute(&mut *tx)
        .await?;

        if swapped.rows_affected() == 0 {
            tx.rollback().await?;
            let current = sqlx::query(
                r#"SELECT r.id, r.tenant_id, r.document_id, r.body, r.message,
                          r.base_revision_id, r.created_by, r.created_at
                   FROM documents d
                   JOIN revisions r ON r.id = d.current_revision_id
                   WHERE d.id = $1 AND d.tenant_id = $2"#,
            )
            .bind(document_id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;
            return Ok(match current {
                Some(row) => AppendOutcome::Stale(map_revision(&row)),
                None => AppendOutcome::Missing,
            });
        }

        let revision = insert_revision(
            &mut tx,
            revision_id,
            tenant_id,
            document_id,
            Some(expected_current),
            rev,
        )
        .await?;
        tx.commit().await?;
        Ok(AppendOutcome::Committed(revision))
    }

    async fn append_at_head(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        rev: &NewRevision,
    ) -> anyhow::Result<Option<Revision>> {
        let mut tx = self.pool.begin().await?;
        let current: Option<Uuid> = sqlx::query_scalar(
            "SELECT current_revision_id FROM documents WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(document_id)
        .bind(tenant_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(current) = current else {
            tx.rollback().await?;
            return Ok(None);
        };
        let revision_id = Uuid::new_v4();
        let revision = insert_revision(
            &mut tx,
            revision_id,
            tenant_id,
            document_id,
            Some(current),
            rev,
        )
        .await?;
        sqlx::query(
            r#"UPDATE documents SET current_revision_id = $1, updated_at = now()
               WHERE id = $2 AND tenant_id = $3"#,
        )
        .bind(revision_id)
        .bind(document_id)
        .bind(tenant_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(revision))
    }

    async fn rename(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        new_path: &str,
    ) -> anyhow::Result<RenameOutcome> {
        let mut tx = self.pool.begin().await?;
        let old_path: Option<String> = sqlx::query_scalar(
            "SELECT path FROM documents WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(document_id)
        .bind(tenant_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(old_path) = old_path else {
            tx.rollback().await?;
            return Ok(RenameOutcome::Missing);
        };
        let updated = sqlx::query(&format!(
            "UPDATE documents SET path = $1, updated_at = now()
             WHERE id = $2 AND tenant_id = $3
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(new_path)
        .bind(document_id)
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await;
        match updated {
            Ok(row) => {
                tx.commit().await?;
                Ok(RenameOutcome::Renamed {
                    document: map_document(&row),
                    old_path,
                })
            }
            Err(err) if is_unique_violation(&err) => {
                tx.rollback().await?;
                Ok(RenameOutcome::PathTaken)
            }
            Err(err) => Err(err.into()),
        }
    }
}

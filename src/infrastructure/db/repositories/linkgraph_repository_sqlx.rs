use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::application::ports::linkgraph_repository::LinkGraphRepository;
use crate::domain::documents::document::{BacklinkInfo, BrokenLink, LinkEdge};
use crate::infrastructure::db::PgPool;

pub struct SqlxLinkGraphRepository {
    pub pool: PgPool,
}

impl SqlxLinkGraphRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkGraphRepository for SqlxLinkGraphRepository {
    async fn find_document_id_by_path(
        &self,
        tenant_id: Uuid,
        path: &str,
    ) -> anyhow::Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM documents WHERE tenant_id = $1 AND path = $2",
        )
        .bind(tenant_id)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn replace_outbound(
        &self,
        tenant_id: Uuid,
        from_document_id: Uuid,
        revision_id: Uuid,
        edges: &[LinkEdge],
    ) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;
        // Same row lock a save takes, so a rebuild never interleaves with a
        // commit of its own source document.
        let current: Option<Uuid> = sqlx::query_scalar(
            "SELECT current_revision_id FROM documents WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(from_document_id)
        .bind(tenant_id)
        .fetch_optional(&mut *tx)
        .await?;
        if current != Some(revision_id) {
            tx.rollback().await?;
            return Ok(false);
        }
        sqlx::query("DELETE FROM link_edges WHERE tenant_id = $1 AND from_document_id = $2")
            .bind(tenant_id)
            .bind(from_document_id)
            .execute(&mut *tx)
            .await?;
        for (position, edge) in edges.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO link_edges (
                        tenant_id, from_document_id, to_document_id, link_path, broken, position
                    ) VALUES ($1, $2, $3, $4, $5, $6)"#,
            )
            .bind(tenant_id)
            .bind(from_document_id)
            .bind(edge.to_document_id)
            .bind(&edge.link_path)
            .bind(edge.broken)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn mark_path_broken(&self, tenant_id: Uuid, path: &str) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"UPDATE link_edges SET broken = true, to_document_id = NULL
               WHERE tenant_id = $1 AND link_path = $2"#,
        )
        .bind(tenant_id)
        .bind(path)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    async fn outgoing(
        &self,
        tenant_id: Uuid,
        from_document_id: Uuid,
    ) -> anyhow::Result<Vec<LinkEdge>> {
        let rows = sqlx::query(
            r#"SELECT to_document_id, link_path, broken
               FROM link_edges
               WHERE tenant_id = $1 AND from_document_id = $2
               ORDER BY position"#,
        )
        .bind(tenant_id)
        .bind(from_document_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| LinkEdge {
                tenant_id,
                from_document_id,
                to_document_id: r.try_get("to_document_id").ok().flatten(),
                link_path: r.get("link_path"),
                broken: r.get("broken"),
            })
            .collect())
    }

    async fn backlinks(
        &self,
        tenant_id: Uuid,
        target_id: Uuid,
    ) -> anyhow::Result<Vec<BacklinkInfo>> {
        let rows = sqlx::query(
            r#"SELECT d.id AS document_id, d.title, d.path, COUNT(*)::BIGINT AS link_count
               FROM link_edges e
               JOIN documents d ON d.id = e.from_document_id AND d.tenant_id = e.tenant_id
               WHERE e.tenant_id = $1 AND e.to_document_id = $2
               GROUP BY d.id, d.title, d.path
               ORDER BY d.title, d.path"#,
        )
        .bind(tenant_id)
        .bind(target_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| BacklinkInfo {
                document_id: r.get("document_id"),
                title: r.get("title"),
                path: r.get("path"),
                link_count: r.try_get("link_count").unwrap_or(1_i64),
            })
            .collect())
    }

    async fn broken_links(&self, tenant_id: Uuid) -> anyhow::Result<Vec<BrokenLink>> {
        let rows = sqlx::query(
            r#"SELECT d.id AS from_document_id, d.title AS from_title, d.path AS from_path,
                      e.link_path
               FROM link_edges e
               JOIN documents d ON d.id = e.from_document_id AND d.tenant_id = e.tenant_id
               WHERE e.tenant_id = $1 AND e.broken
               ORDER BY d.title, e.link_path"#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| BrokenLink {
                from_document_id: r.get("from_document_id"),
                from_title: r.get("from_title"),
                from_path: r.get("from_path"),
                link_path: r.get("link_path"),
            })
            .collect())
    }
}

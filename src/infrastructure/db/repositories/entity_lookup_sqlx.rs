use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::application::ports::entity_lookup::{EntityKind, EntityLookup, EntitySummary};
use crate::infrastructure::db::PgPool;

/// Batch reads against the CMDB, incident and checklist tables. Those tables
/// belong to other subsystems; only the columns selected here are relied on.
pub struct SqlxEntityLookup {
    pub pool: PgPool,
}

impl SqlxEntityLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn lookup_sql(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::System => {
            r#"SELECT id, name, status, description AS detail
               FROM cmdb_systems WHERE tenant_id = $1 AND id = ANY($2)"#
        }
        EntityKind::Incident => {
            r#"SELECT id, title AS name, status, severity AS detail
               FROM incidents WHERE tenant_id = $1 AND id = ANY($2)"#
        }
        EntityKind::Checklist => {
            r#"SELECT id, name, status, NULL::TEXT AS detail
               FROM checklists WHERE tenant_id = $1 AND id = ANY($2)"#
        }
    }
}

#[async_trait]
impl EntityLookup for SqlxEntityLookup {
    async fn batch_load(
        &self,
        tenant_id: Uuid,
        kind: EntityKind,
        ids: &[Uuid],
    ) -> anyhow::Result<HashMap<Uuid, EntitySummary>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query(lookup_sql(kind))
            .bind(tenant_id)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        // Columns are decoded fallibly; a bad row fails this kind's batch
        // rather than the whole render.
        rows.into_iter()
            .map(|r| -> anyhow::Result<(Uuid, EntitySummary)> {
                let id: Uuid = r.try_get("id")?;
                let summary = EntitySummary {
                    id,
                    name: r.try_get("name")?,
                    status: r.try_get("status")?,
                    detail: r.try_get("detail")?,
                };
                Ok((id, summary))
            })
            .collect()
    }
}

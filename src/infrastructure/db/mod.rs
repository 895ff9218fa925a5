use sqlx::{Pool, Postgres};

pub type PgPool = Pool<Postgres>;

pub async fn connect_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    // Uses compile-time embedded migrations under ./migrations
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub mod repositories;

#[cfg(test)]
mod tests {
    const VERSIONING: &str = include_str!("../../../migrations/20240601000000_versioning.sql");

    #[test]
    fn link_edge_target_is_tenant_scoped_and_tied_to_broken() {
        assert!(VERSIONING.contains(
            "FOREIGN KEY (to_document_id, tenant_id)\n        REFERENCES documents (id, tenant_id)"
        ));
        assert!(VERSIONING.contains("CHECK ((to_document_id IS NULL) = broken)"));
        assert!(!VERSIONING.contains("ON DELETE SET NULL"));
    }

    #[test]
    fn deleting_a_target_breaks_inbound_edges() {
        assert!(VERSIONING.contains("BEFORE DELETE ON documents"));
        assert!(VERSIONING.contains("SET broken = true, to_document_id = NULL"));
    }
}

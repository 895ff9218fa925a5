use dotenvy::dotenv;
use tracing::info;

use docledger::bootstrap::app_context::{AppContext, AppServices};
use docledger::bootstrap::config::Config;
use docledger::bootstrap::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    telemetry::init();

    let cfg = Config::from_env()?;
    info!(
        db_max_connections = cfg.db_max_connections,
        render_max_source_bytes = cfg.render_max_source_bytes,
        is_production = cfg.is_production,
        "starting docledger"
    );

    let pool =
        docledger::infrastructure::db::connect_pool(&cfg.database_url, cfg.db_max_connections)
            .await?;
    docledger::infrastructure::db::migrate(&pool).await?;

    let services = AppServices::postgres(&cfg, pool);
    let _ctx = AppContext::new(cfg, services);
    info!("docledger_ready");
    Ok(())
}

use std::sync::Arc;

use crate::application::ports::audit_sink::AuditSink;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::entity_lookup::EntityLookup;
use crate::application::ports::linkgraph_repository::LinkGraphRepository;
use crate::application::services::markdown::MarkdownRenderer;
use crate::application::services::shortcodes::ShortcodeResolver;
use crate::bootstrap::config::Config;
use crate::infrastructure::audit::TracingAuditSink;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::repositories::document_repository_sqlx::SqlxDocumentRepository;
use crate::infrastructure::db::repositories::entity_lookup_sqlx::SqlxEntityLookup;
use crate::infrastructure::db::repositories::linkgraph_repository_sqlx::SqlxLinkGraphRepository;
use crate::infrastructure::memory::{InMemoryAuditSink, InMemoryEntityLookup, InMemoryStore};

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

#[derive(Clone)]
pub struct AppServices {
    document_repo: Arc<dyn DocumentRepository>,
    link_repo: Arc<dyn LinkGraphRepository>,
    entity_lookup: Arc<dyn EntityLookup>,
    audit: Arc<dyn AuditSink>,
    renderer: MarkdownRenderer,
    shortcodes: ShortcodeResolver,
}

impl AppServices {
    pub fn new(
        cfg: &Config,
        document_repo: Arc<dyn DocumentRepository>,
        link_repo: Arc<dyn LinkGraphRepository>,
        entity_lookup: Arc<dyn EntityLookup>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            document_repo,
            link_repo,
            shortcodes: ShortcodeResolver::new(entity_lookup.clone()),
            entity_lookup,
            audit,
            renderer: MarkdownRenderer::new(cfg.render_options()),
        }
    }

    pub fn postgres(cfg: &Config, pool: PgPool) -> Self {
        Self::new(
            cfg,
            Arc::new(SqlxDocumentRepository::new(pool.clone())),
            Arc::new(SqlxLinkGraphRepository::new(pool.clone())),
            Arc::new(SqlxEntityLookup::new(pool)),
            Arc::new(TracingAuditSink),
        )
    }

    /// Everything held in process; nothing survives a restart.
    pub fn in_memory(cfg: &Config, entities: InMemoryEntityLookup) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(
            cfg,
            store.clone(),
            store,
            Arc::new(entities),
            Arc::new(InMemoryAuditSink::new()),
        )
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn document_repo(&self) -> Arc<dyn DocumentRepository> {
        self.services.document_repo.clone()
    }

    pub fn link_repo(&self) -> Arc<dyn LinkGraphRepository> {
        self.services.link_repo.clone()
    }

    pub fn entity_lookup(&self) -> Arc<dyn EntityLookup> {
        self.services.entity_lookup.clone()
    }

    pub fn audit(&self) -> Arc<dyn AuditSink> {
        self.services.audit.clone()
    }

    pub fn renderer(&self) -> &MarkdownRenderer {
        &self.services.renderer
    }

    pub fn shortcodes(&self) -> &ShortcodeResolver {
        &self.services.shortcodes
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::application::use_cases::documents::create_document::CreateDocument;
    use crate::application::use_cases::documents::edit_document::EditDocument;
    use crate::application::use_cases::documents::get_backlinks::GetBacklinks;
    use crate::application::use_cases::documents::render_document::RenderDocument;
    use crate::application::use_cases::documents::test_support::new_doc;

    #[tokio::test]
    async fn in_memory_context_wires_use_cases() {
        let cfg = Config::from_lookup(|_| None).unwrap();
        let ctx = AppContext::new(
            cfg.clone(),
            AppServices::in_memory(&cfg, InMemoryEntityLookup::new()),
        );
        let tenant = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let repo = ctx.document_repo();
        let links = ctx.link_repo();
        let audit = ctx.audit();

        let (target, _) = CreateDocument { repo: &*repo }
            .execute(tenant, new_doc("guide"), "", "create", actor)
            .await
            .unwrap();
        let (doc, first) = CreateDocument { repo: &*repo }
            .execute(tenant, new_doc("index"), "", "create", actor)
            .await
            .unwrap();
        EditDocument { repo: &*repo, links: &*links, audit: &*audit }
            .execute(tenant, doc.id, "read the [[guide]]", "link", first.id, actor)
            .await
            .unwrap();

        let back = GetBacklinks { links: &*links }
            .execute(tenant, target.id)
            .await
            .unwrap();
        assert_eq!(back.len(), 1);

        let rendered = RenderDocument {
            repo: &*repo,
            renderer: ctx.renderer(),
            shortcodes: ctx.shortcodes(),
        }
        .execute(tenant, doc.id)
        .await
        .unwrap();
        assert!(rendered.html.contains("href=\"/docs/guide\""));
    }
}

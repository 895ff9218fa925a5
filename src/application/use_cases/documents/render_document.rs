use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::application::errors::DocumentError;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::services::markdown::MarkdownRenderer;
use crate::application::services::shortcodes::ShortcodeResolver;
use crate::application::use_cases::documents::get_document::GetDocument;

#[derive(Debug, Clone, Serialize)]
pub struct RenderedDocument {
    pub document_id: Uuid,
    pub revision_id: Uuid,
    pub html: String,
    pub hash: String,
    /// Markdown could not be rendered; `html` is the escaped source.
    pub degraded: bool,
    pub shortcodes_resolved: usize,
    pub shortcodes_missing: usize,
}

pub struct RenderDocument<'a, R: DocumentRepository + ?Sized> {
    pub repo: &'a R,
    pub renderer: &'a MarkdownRenderer,
    pub shortcodes: &'a ShortcodeResolver,
}

impl<'a, R: DocumentRepository + ?Sized> RenderDocument<'a, R> {
    pub async fn execute(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
    ) -> Result<RenderedDocument, DocumentError> {
        let (doc, rev) = GetDocument { repo: self.repo }
            .with_current(tenant_id, document_id)
            .await?;
        let (html, hash, degraded) = match self.renderer.render_document(&rev.body, &doc.path) {
            Ok(out) => (out.html, out.hash, false),
            Err(e) => {
                warn!(%tenant_id, %document_id, error = %e, "render_failed");
                let html = format!(
                    "<pre class=\"render-error\">{}</pre>",
                    htmlescape::encode_minimal(&rev.body)
                );
                (html, String::new(), true)
            }
        };
        let resolved = self.shortcodes.resolve(tenant_id, &html).await;
        Ok(RenderedDocument {
            document_id,
            revision_id: rev.id,
            html: resolved.html,
            hash,
            degraded,
            shortcodes_resolved: resolved.resolved,
            shortcodes_missing: resolved.missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::ports::entity_lookup::{EntityKind, EntitySummary};
    use crate::application::services::markdown::RenderOptions;
    use crate::application::use_cases::documents::test_support::seed;
    use crate::infrastructure::memory::{InMemoryEntityLookup, InMemoryStore};

    #[tokio::test]
    async fn renders_body_with_shortcodes() {
        let store = InMemoryStore::new();
        let tenant = Uuid::new_v4();
        let system = EntitySummary {
            id: Uuid::new_v4(),
            name: "Billing API".into(),
            status: Some("degraded".into()),
            detail: None,
        };
        let lookup =
            InMemoryEntityLookup::new().with_entity(tenant, EntityKind::System, system.clone());
        let shortcodes = ShortcodeResolver::new(Arc::new(lookup));
        let renderer = MarkdownRenderer::default();
        let body = format!("# Status\n\nDepends on {{{{system:{}}}}} and [[runbook]].", system.id);
        let (doc, rev) = seed(&store, tenant, "ops/status", &body).await;

        let out = RenderDocument { repo: &store, renderer: &renderer, shortcodes: &shortcodes }
            .execute(tenant, doc.id)
            .await
            .unwrap();
        assert!(!out.degraded);
        assert_eq!(out.revision_id, rev.id);
        assert_eq!(out.shortcodes_resolved, 1);
        assert!(out.html.contains("Billing API"));
        assert!(out.html.contains("href=\"/docs/ops/runbook\""));
        assert_eq!(out.hash.len(), 64);
    }

    #[tokio::test]
    async fn oversized_body_degrades_to_escaped_source() {
        let store = InMemoryStore::new();
        let tenant = Uuid::new_v4();
        let shortcodes = ShortcodeResolver::new(Arc::new(InMemoryEntityLookup::new()));
        let renderer = MarkdownRenderer::new(RenderOptions {
            max_source_bytes: 4,
            ..RenderOptions::default()
        });
        let (doc, _) = seed(&store, tenant, "big", "<b>too long</b>").await;

        let out = RenderDocument { repo: &store, renderer: &renderer, shortcodes: &shortcodes }
            .execute(tenant, doc.id)
            .await
            .unwrap();
        assert!(out.degraded);
        assert!(out.html.starts_with("<pre class=\"render-error\">"));
        assert!(out.html.contains("&lt;b&gt;too long"));
        assert!(!out.html.contains("<b>"));
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let store = InMemoryStore::new();
        let shortcodes = ShortcodeResolver::new(Arc::new(InMemoryEntityLookup::new()));
        let renderer = MarkdownRenderer::default();
        let err = RenderDocument { repo: &store, renderer: &renderer, shortcodes: &shortcodes }
            .execute(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::NotFound));
    }
}

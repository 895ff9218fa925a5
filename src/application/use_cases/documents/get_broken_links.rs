use uuid::Uuid;

use crate::application::ports::linkgraph_repository::LinkGraphRepository;
use crate::domain::documents::document::BrokenLink;

pub struct GetBrokenLinks<'a, L: LinkGraphRepository + ?Sized> {
    pub links: &'a L,
}

impl<'a, L: LinkGraphRepository + ?Sized> GetBrokenLinks<'a, L> {
    // Ordered by source title, then link path
    pub async fn execute(&self, tenant_id: Uuid) -> anyhow::Result<Vec<BrokenLink>> {
        self.links.broken_links(tenant_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::linkgraph::rebuild_links;
    use crate::application::use_cases::documents::test_support::seed;
    use crate::infrastructure::memory::InMemoryStore;

    #[tokio::test]
    async fn lists_broken_links_in_order() {
        let store = InMemoryStore::new();
        let tenant = Uuid::new_v4();
        let (b, b_rev) = seed(&store, tenant, "b", "").await;
        let (a, a_rev) = seed(&store, tenant, "a", "").await;
        rebuild_links(&store, tenant, b.id, "b", b_rev.id, "[z](zz) [y](yy) [ok](a)")
            .await
            .unwrap();
        rebuild_links(&store, tenant, a.id, "a", a_rev.id, "[m](missing)")
            .await
            .unwrap();

        let broken = GetBrokenLinks { links: &store }.execute(tenant).await.unwrap();
        let pairs: Vec<(&str, &str)> = broken
            .iter()
            .map(|l| (l.from_title.as_str(), l.link_path.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "missing"), ("b", "yy"), ("b", "zz")]);
    }

    #[tokio::test]
    async fn other_tenants_broken_links_are_hidden() {
        let store = InMemoryStore::new();
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        let (doc, rev) = seed(&store, t2, "p", "").await;
        rebuild_links(&store, t2, doc.id, "p", rev.id, "[x](nope)")
            .await
            .unwrap();
        assert!(GetBrokenLinks { links: &store }.execute(t1).await.unwrap().is_empty());
        assert_eq!(GetBrokenLinks { links: &store }.execute(t2).await.unwrap().len(), 1);
    }
}

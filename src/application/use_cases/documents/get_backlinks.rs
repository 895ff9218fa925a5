use uuid::Uuid;

use crate::application::ports::linkgraph_repository::LinkGraphRepository;
use crate::domain::documents::document::BacklinkInfo;

pub struct GetBacklinks<'a, L: LinkGraphRepository + ?Sized> {
    pub links: &'a L,
}

impl<'a, L: LinkGraphRepository + ?Sized> GetBacklinks<'a, L> {
    // Ordered by linking document title
    pub async fn execute(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
    ) -> anyhow::Result<Vec<BacklinkInfo>> {
        self.links.backlinks(tenant_id, document_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::linkgraph::rebuild_links;
    use crate::application::ports::document_repository::{CreateOutcome, DocumentRepository};
    use crate::application::use_cases::documents::test_support::{new_doc, seed};
    use crate::domain::documents::document::NewRevision;
    use crate::infrastructure::memory::InMemoryStore;

    async fn seed_titled(
        store: &InMemoryStore,
        tenant: Uuid,
        path: &str,
        title: &str,
    ) -> (Uuid, Uuid) {
        let mut doc = new_doc(path);
        doc.title = title.to_string();
        let rev = NewRevision {
            body: String::new(),
            message: String::new(),
            created_by: doc.owner,
        };
        match store.create_with_revision(tenant, &doc, &rev).await.unwrap() {
            CreateOutcome::Created(d, r) => (d.id, r.id),
            CreateOutcome::PathTaken => panic!("path taken"),
        }
    }

    #[tokio::test]
    async fn backlinks_sorted_by_title() {
        let store = InMemoryStore::new();
        let tenant = Uuid::new_v4();
        let (target, _) = seed(&store, tenant, "hub", "").await;
        let (zed, zed_rev) = seed_titled(&store, tenant, "z", "Zed").await;
        let (alpha, alpha_rev) = seed_titled(&store, tenant, "a", "Alpha").await;
        rebuild_links(&store, tenant, zed, "z", zed_rev, "[h](hub)")
            .await
            .unwrap();
        rebuild_links(&store, tenant, alpha, "a", alpha_rev, "[h](hub) [[hub]]")
            .await
            .unwrap();

        let back = GetBacklinks { links: &store }
            .execute(tenant, target.id)
            .await
            .unwrap();
        let titles: Vec<&str> = back.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Zed"]);
        // Duplicate references collapse to one edge
        assert_eq!(back[0].link_count, 1);
    }

    #[tokio::test]
    async fn backlinks_are_tenant_scoped() {
        let store = InMemoryStore::new();
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        let (target_t1, _) = seed(&store, t1, "same/path", "").await;
        let (src_t2, src_rev) = seed(&store, t2, "same/other", "").await;
        seed(&store, t2, "same/path", "").await;
        rebuild_links(&store, t2, src_t2.id, "same/other", src_rev.id, "[p](path)")
            .await
            .unwrap();
        let back = GetBacklinks { links: &store }
            .execute(t1, target_t1.id)
            .await
            .unwrap();
        assert!(back.is_empty());
    }
}

use uuid::Uuid;

use crate::application::ports::linkgraph_repository::LinkGraphRepository;
use crate::domain::documents::document::LinkEdge;

pub struct GetOutgoingLinks<'a, L: LinkGraphRepository + ?Sized> {
    pub links: &'a L,
}

impl<'a, L: LinkGraphRepository + ?Sized> GetOutgoingLinks<'a, L> {
    // In the order the links first appear in the body
    pub async fn execute(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
    ) -> anyhow::Result<Vec<LinkEdge>> {
        self.links.outgoing(tenant_id, document_id).await
    }
}

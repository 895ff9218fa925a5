pub mod document_repository_sqlx;
pub mod entity_lookup_sqlx;
pub mod linkgraph_repository_sqlx;

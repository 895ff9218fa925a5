pub mod audit_sink;
pub mod document_repository;
pub mod entity_lookup;
pub mod linkgraph_repository;

// Module layout (Clean Architecture style)
// - bootstrap: configuration, telemetry and dependency wiring
// - infrastructure: Postgres, in-memory and audit adapters
// - application: ports, use cases and the render/diff/link services
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;

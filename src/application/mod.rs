pub mod errors;
pub mod linkgraph;
pub mod ports;
pub mod services;
pub mod use_cases;

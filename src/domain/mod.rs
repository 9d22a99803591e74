//! Domain aggregates exposed by the orchestration layer.

pub mod filter;
pub mod order;
pub mod types;

//! Cross-module integration tests.

pub mod flows;
pub mod json_rpc;
pub mod provenance;

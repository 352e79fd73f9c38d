//! # Ports Module
//!
//! Hexagonal architecture ports: the HerbTraceability API offered to callers
//! and the wallet/node provider it depends on.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;

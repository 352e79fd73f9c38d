//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implementations of the `LedgerProvider` port.

mod in_memory;
mod json_rpc;
mod rpc_types;

pub use in_memory::InMemoryLedger;
pub use json_rpc::JsonRpcProvider;

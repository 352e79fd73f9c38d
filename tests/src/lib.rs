//! # Herb-Trace Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── integration/      # Cross-module flows
//! │   ├── flows.rs      # Batch lifecycle through the service
//! │   ├── provenance.rs # Trail assembly and classification
//! │   └── json_rpc.rs   # JsonRpcProvider against a local HTTP bridge
//! │
//! └── properties.rs     # Property-based tests (proptest)
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p herb-tests
//!
//! # By category
//! cargo test -p herb-tests integration::
//! cargo test -p herb-tests properties::
//! ```

#![allow(unused_variables)]
#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
pub mod properties;

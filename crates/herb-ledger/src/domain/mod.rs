//! # Domain Module
//!
//! Core types for the HerbTraceability client: value objects, entities,
//! fixed-point scaling and errors.

pub mod entities;
pub mod errors;
pub mod scaling;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use scaling::*;
pub use value_objects::*;

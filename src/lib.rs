//! Parts Registry - spare parts lookup and registration
//!
//! A small internal web application: exact-code part lookup, registration
//! with optional image upload, hard deletion, and a CSV master export
//! mirroring the full store. Access is gated by one shared service
//! password.

pub mod database;
pub mod error;
pub mod export;
pub mod images;
pub mod parts;
pub mod session;
pub mod web;

pub use database::{init_schema, part_count, Part};
pub use error::{RegistryError, Result};
pub use parts::StoragePaths;
pub use session::SessionGate;

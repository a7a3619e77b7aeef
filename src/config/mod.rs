//! Configuration module
//!
//! Provides types and loading for `celpack.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;

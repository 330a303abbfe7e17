//! Repository Module
//!
//! Data access layer for the server.
//! Each repository handles database operations for a specific domain entity.

pub mod execution;
pub mod pipeline;
pub mod template;

// Re-export for convenience
pub use execution as execution_repository;
pub use pipeline as pipeline_repository;
pub use template as template_repository;

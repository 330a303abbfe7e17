//! Service Module
//!
//! Business logic layer for the server.
//! Services orchestrate between repositories, the engine and domain logic.

pub mod execution;
pub mod pipeline;
pub mod template;

// Re-export for convenience
pub use execution as execution_service;
pub use pipeline as pipeline_service;
pub use template as template_service;

//! Core domain types
//!
//! This module contains the core domain structures used across PromptLab services.
//! These types represent the fundamental business entities and are shared between
//! the server (for persistence), the engine (for execution) and the client.

pub mod execution;
pub mod pipeline;
pub mod provider;
pub mod template;

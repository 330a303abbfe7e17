//! PromptLab Core
//!
//! Core types and abstractions for the PromptLab prompt pipeline system.
//!
//! This crate contains:
//! - Domain types: Core business entities (Template, Pipeline, executions)
//! - DTOs: Data transfer objects exchanged between server, client and CLI
//! - Placeholder handling: extraction and strict rendering of `{{name}}` tokens

pub mod domain;
pub mod dto;
pub mod placeholder;

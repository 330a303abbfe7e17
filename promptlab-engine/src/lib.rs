//! PromptLab Engine
//!
//! Executes prompt templates and multi-step pipelines against LLM providers.
//!
//! Architecture:
//! - Store traits: narrow interfaces to template content and execution history
//! - Provider gateway: routes `(provider, model, prompt)` to a backend adapter
//! - Engine: renders each step against the binding environment, invokes the
//!   gateway in step order and assembles the execution record
//!
//! The engine keeps no state between calls. Every run owns its bindings and
//! step records, so any number of runs may be in flight on one engine.

pub mod config;
pub mod engine;
pub mod error;
pub mod observer;
pub mod provider;
pub mod store;

pub use config::EngineConfig;
pub use engine::PipelineEngine;
pub use error::EngineError;
pub use observer::{ExecutionObserver, NoopObserver};
pub use provider::{LlmProvider, ProviderError, ProviderGateway, ProviderRegistry};
pub use store::{ExecutionStore, StoreError, TemplateSnapshot, TemplateStore};

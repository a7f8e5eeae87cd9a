//! LLM provider abstraction for refine.
//!
//! Wraps rig-core's provider clients behind a [`Provider`] struct with enum
//! dispatch, keeping provider-specific details out of the engine. Supports
//! Anthropic, OpenAI, OpenRouter, and Ollama (local) via [`ProviderKind`].
//! [`RigCompletionClient`] plugs a provider into the interaction loop.

mod client;
mod completion;
mod kind;
mod resolve;

pub use client::Provider;
pub use completion::RigCompletionClient;
#[allow(unused_imports)]
pub use kind::{default_model_for, ProviderKind};
pub use resolve::{resolve_model, ModelSelection};

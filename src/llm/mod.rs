//! LLM Provider Clients
//!
//! Answer generation goes through the [`LLMClient`] trait so the rest of the
//! pipeline works with either local backend, and tests can substitute a mock.
//!
//! # Example
//!
//! ```ignore
//! use ragline::llm::Provider;
//! use std::time::Duration;
//!
//! let provider = Provider::from_config(&config.generation);
//! let client = provider.create_client(Duration::from_secs(120))?;
//!
//! let answer = client.generate("What is a kernel?", 100).await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;

pub mod llamacpp;
pub mod ollama;

pub use client::{LLMClient, Provider};

//! Bella - conversational thinking engine library
//!
//! This library turns user utterances into replies by orchestrating cloud
//! chat-completion providers and a locally hosted model, with graceful
//! degradation to canned replies when every backend fails.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `agent`: Conversation context, the thinking orchestrator, fallback chain, and performance monitoring
//! - `providers`: Cloud provider client and local model client (Ollama)
//! - `prompts`: Persona system prompts and mode-aware prompt construction
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use bella::{Config, ThinkOptions, ThinkingOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let bella = ThinkingOrchestrator::new(&config)?;
//!     bella.init().await;
//!     println!("{}", bella.think("Hello!", ThinkOptions::default()).await);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod chat_mode;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod prompts;
pub mod providers;

// Re-export commonly used types
pub use agent::{ThinkOptions, ThinkingOrchestrator};
pub use chat_mode::ChatMode;
pub use config::Config;
pub use error::{BellaError, Result};

#[cfg(test)]
pub mod test_utils;

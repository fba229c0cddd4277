//! Agent module for Bella
//!
//! This module contains the thinking engine: conversation context, the
//! orchestrator and its fallback chain, response handling, and
//! performance monitoring.

pub mod conversation;
pub mod core;
pub mod fallback;
pub mod metrics;
pub mod monitor;
pub mod responses;
pub mod sanitize;

pub use conversation::{ConversationContext, ConversationExport, Role};
pub use core::{CurrentConfig, ThinkOptions, ThinkingOrchestrator};
pub use monitor::PerformanceMonitor;

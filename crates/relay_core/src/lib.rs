//! relay_core - Core types for the chat relay
//!
//! This crate provides the foundational types used across all relay crates:
//! - `message` - Conversation messages and roles
//! - `frame` - Wire-level frames sent from the relay to the browser
//! - `api` - Request/response bodies of the relay endpoint
//! - `config` - Runtime configuration

pub mod api;
pub mod config;
pub mod frame;
pub mod message;

// Re-export commonly used types
pub use api::{ChatRequest, ChatResponse};
pub use config::{RelayConfig, UpstreamMode};
pub use frame::RelayFrame;
pub use message::{ConversationMessage, Role};

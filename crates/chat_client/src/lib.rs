//! chat_client - Consumer side of the chat relay
//!
//! `RelayClient` talks to the relay endpoint (streaming frames or a
//! buffered body); `ChatSession` drives a transcript through one
//! submission, with optimistic append and rollback on failure.

pub mod client;
pub mod session;

pub use client::{ClientError, FrameStream, RelayClient};
pub use session::{ChatSession, SubmitError};

pub mod chat_compat;
pub mod sse;

pub mod controllers;
pub mod error;
pub mod middleware;
pub mod server;
pub mod session;

pub use server::{AppState, WebService};

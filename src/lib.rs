//! Green Guardian client core
//!
//! Session handling, pond monitoring data and the hydroponics chat assistant,
//! exposed to the UI over a local HTTP API.

pub mod api;
pub mod auth;
pub mod backend;
pub mod chat;
pub mod config;
pub mod llm;
pub mod notify;
pub mod ponds;
pub mod session;

#[cfg(test)]
mod testing;

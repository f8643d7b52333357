// Public API for integration tests and potential library usage

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod protocol;
pub mod scoring;
pub mod session;
pub mod state;
pub mod stats_store;
pub mod store;
pub mod tags;
pub mod types;

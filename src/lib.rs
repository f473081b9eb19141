//! UGC profile service
//!
//! Stores what users do with movies and publishes every change to the
//! event bus. Reads join a user's activity with movie metadata.
//!
//! ## Services
//!
//! - **UGC**: bookmarks, likes, reviews, watch progress and profile edits,
//!   persisted in MongoDB and published over NATS
//! - **Search**: per-user collections built with aggregation pipelines,
//!   enriched through a cache-aside movie metadata cache (Redis or in-process)
//! - **Admission**: a process-wide token bucket in front of every route

pub mod aggregation;
pub mod auth;
pub mod broker;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod nats;
pub mod rate_limit;
pub mod retry;
pub mod routes;
pub mod search;
pub mod server;
pub mod services;
pub mod types;
pub mod ugc;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{ProfileError, Result};

//! # Wolkenlager Backend Library
//!
//! Core library for Wolkenlager, a personal cloud drive: users upload files,
//! organize them in folders, move them to a trash they can restore from and
//! delete them for good, all within a per-user storage quota.
//!
//! ## Architecture
//!
//! - **Axum**: HTTP server and routing
//! - **SQLx**: asynchronous SQLite access for users, folders and file records
//! - **Tokio**: async runtime, file content is streamed in and out
//! - **Serde**: JSON request and response bodies
//!
//! ## Core Components
//!
//! - [`drive`]: the storage core (trash lifecycle, cascades, quota, uploads, recency)
//! - [`content`]: physical storage for uploaded bytes behind a trait
//! - [`auth`]: accounts, password hashing and bearer tokens
//! - [`config`]: layered configuration
//! - [`db`]: connection setup and schema initialization
//! - [`error`]: HTTP error responses
//! - [`metrics`]: operation counters
//! - [`middleware`]: authentication, security headers, rate limiting and request validation
//! - [`routes`]: HTTP API endpoint handlers and the router
//! - [`state`]: shared application state
//! - [`types`]: request and response DTOs

pub mod auth;
pub mod config;
pub mod content;
pub mod db;
pub mod drive;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;

//! Integration and unit tests for the Wolkenlager application.
//!
//! ## Test Modules
//!
//! - **harness**: scratch databases, upload directories and test users
//! - **lifecycle_tests**: trash, restore and permanent deletion of files and folders
//! - **walker_tests**: cascades through folder trees, including partial failures
//! - **upload_tests**: upload batches against the storage quota
//! - **access_tests**: access tracking and the recent files list
//! - **api_tests**: the HTTP API through the full router
//! - **error_tests**: error mapping and JSON error bodies
//! - **config_tests**: configuration loading and validation
//! - **db_tests**: schema initialization and constraints
//! - **health_api_tests**: health, readiness and metrics endpoints
//!
//! Individual modules can be run with e.g. `cargo test lifecycle_tests`.


pub mod access_tests;
pub mod config_tests;
pub mod error_tests;
pub mod walker_tests;

//! # Time Server Core
//!
//! Timezone resolution and formatting behind the `/time` endpoint.
//!
//! ## Features
//! - Current time for any IANA timezone
//! - Several zones per request, deduplicated
//! - Automatic DST handling through the compiled-in tz database
//!
//! ## Modules
//! - `error`: Request and process error types
//! - `models`: Request parsing and the JSON report
//! - `provider`: Core timezone operations
//! - `utils`: Timestamp layouts and formatting helpers

pub mod error;
pub mod models;
pub mod provider;
pub mod utils;

//! # webcache core
//!
//! Core types, errors, and traits shared by the `webcache` crates.
//!
//! - **Errors**: the two transaction error kinds and their classification
//! - **Constants**: defaults and the HTTP-date pattern
//! - **Traits**: the [`Clock`] seam used to stamp commits
//! - **Types**: cache configuration and usage statistics
//!
//! ## Example
//!
//! ```rust
//! use webcache_core::{http_date, CacheConfig};
//!
//! let config: CacheConfig = serde_json::from_str(r#"{"max_age_seconds": 30}"#).unwrap();
//! assert_eq!(config.max_age().as_secs(), 30);
//! assert_eq!(http_date::format(http_date::UNIX_EPOCH), "Thu, 01 Jan 1970 00:00:00 GMT");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod http_date;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{CacheError, Result};
pub use traits::*;
pub use types::*;

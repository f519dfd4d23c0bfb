//! Single-slot, time-bounded memory cache for expensive request handlers.
//!
//! A [`CachedPage`] holds one byte payload with a fixed time-to-live. Readers
//! always get the last committed payload without waiting on a rebuild; at most
//! one writer at a time may stage a replacement inside an update transaction.
//!
//! ```rust
//! use std::time::Duration;
//! use webcache::CachedPage;
//!
//! let page = CachedPage::new(Duration::from_secs(90));
//! if !page.is_valid() && page.start_update().is_ok() {
//!     page.write(b"expensive result").unwrap();
//!     page.end_update().unwrap();
//! }
//! assert_eq!(&page.get()[..], b"expensive result");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

mod page;
mod refresh;
mod writer;

pub use page::CachedPage;
pub use refresh::{Refresh, RefreshError};

pub use webcache_core::{
    http_date, CacheConfig, CacheError, CacheStats, Clock, ManualClock, Result, SystemClock,
    LAST_MODIFIED_HEADER,
};

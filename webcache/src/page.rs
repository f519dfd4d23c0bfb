//! The single-slot page cache and its update transaction.

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use webcache_core::constants::MAX_AGE_CEILING_SECONDS;
use webcache_core::error::{CacheError, Result};
use webcache_core::http_date;
use webcache_core::traits::{Clock, SystemClock};
use webcache_core::types::{CacheConfig, CacheStats};

/// Everything guarded by the structural lock.
struct PageState {
    /// True exactly while a writer holds the update transaction.
    updating: bool,
    /// Last committed payload.
    content: Bytes,
    /// Staging buffer; only meaningful while `updating`.
    rebuild: BytesMut,
    /// Stamp of the last commit. `None` until the first commit or clear.
    last_modified: Option<DateTime<Utc>>,
}

/// A single cached payload with a fixed time-to-live.
///
/// Reads (`get`, `is_valid`, `last_modified`) share the lock and never see a
/// half-written payload. A refresh runs as a transaction: `start_update`
/// admits exactly one writer, `write` appends to a private staging buffer,
/// and `end_update` publishes it in one step.
///
/// The lock is only held inside these calls, never across the caller's
/// rebuild. A writer that never calls `end_update` leaves the page in the
/// updating state: readers keep getting the last committed payload and no
/// later `start_update` succeeds.
pub struct CachedPage {
    state: RwLock<PageState>,
    stats: Mutex<CacheStats>,
    max_age: Duration,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl CachedPage {
    /// Creates an empty, already stale page whose content stays valid for
    /// `max_age` after each commit.
    pub fn new(max_age: Duration) -> Self {
        Self::with_clock(max_age, SystemClock)
    }

    /// Creates a page from a [`CacheConfig`].
    pub fn with_config(config: CacheConfig) -> Self {
        Self::new(config.max_age())
    }

    /// Creates a page that reads time from `clock`.
    pub fn with_clock(max_age: Duration, clock: impl Clock + 'static) -> Self {
        Self {
            state: RwLock::new(PageState {
                updating: false,
                content: Bytes::new(),
                rebuild: BytesMut::new(),
                last_modified: None,
            }),
            stats: Mutex::new(CacheStats::default()),
            max_age,
            ttl: ttl_from(max_age),
            clock: Arc::new(clock),
        }
    }

    /// Reports whether the content is still fresh.
    ///
    /// True while `now < last_modified + max_age`, and unconditionally true
    /// while an update is running so that concurrent callers do not pile up
    /// redundant rebuilds.
    pub fn is_valid(&self) -> bool {
        let now = self.clock.now();
        self.is_fresh(&self.state.read(), now)
    }

    fn is_fresh(&self, state: &PageState, now: DateTime<Utc>) -> bool {
        state.updating || self.within_ttl(state.last_modified, now)
    }

    fn within_ttl(&self, last_modified: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        last_modified.map_or(false, |at| now.signed_duration_since(at) < self.ttl)
    }

    /// Freshness of the committed content alone, ignoring a running update.
    pub(crate) fn committed_is_fresh(&self) -> bool {
        let now = self.clock.now();
        self.within_ttl(self.state.read().last_modified, now)
    }

    /// Marks the content stale without dropping it.
    ///
    /// The stored payload stays servable and a running transaction is left
    /// untouched. Returns whether the content was fresh before the call.
    pub fn clear(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.state.write();
        let was_valid = self.is_fresh(&state, now);
        let stale_since = now.checked_sub_signed(self.ttl).unwrap_or(DateTime::<Utc>::MIN_UTC);
        state.last_modified = Some(stale_since);
        debug!(was_valid, "Cache invalidated");
        was_valid
    }

    /// Claims the update transaction.
    ///
    /// Fails with [`CacheError::AlreadyUpdating`] if another caller holds it;
    /// that caller must then skip its own rebuild. On success the staging
    /// buffer starts out empty.
    pub fn start_update(&self) -> Result<()> {
        let mut state = self.state.write();
        if state.updating {
            debug!("Update already in progress");
            return Err(CacheError::AlreadyUpdating);
        }
        state.updating = true;
        state.rebuild.clear();
        debug!("Update started");
        Ok(())
    }

    /// Appends `buf` to the staging buffer and returns its length.
    ///
    /// Fails with [`CacheError::NoActiveTransaction`] outside an update.
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        let mut state = self.state.write();
        if !state.updating {
            warn!(bytes = buf.len(), "Write outside update transaction");
            return Err(CacheError::NoActiveTransaction);
        }
        state.rebuild.extend_from_slice(buf);
        trace!(bytes = buf.len(), staged = state.rebuild.len(), "Staged bytes");
        Ok(buf.len())
    }

    /// Commits the staging buffer as the new content and restarts the TTL.
    ///
    /// With no prior `write` the content becomes empty. Fails with
    /// [`CacheError::NoActiveTransaction`] if no update is running, in which
    /// case nothing is published.
    pub fn end_update(&self) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.state.write();
        if !state.updating {
            warn!("End of update without a running transaction");
            return Err(CacheError::NoActiveTransaction);
        }
        state.content = state.rebuild.split().freeze();
        // The commit stamp never moves backwards, even if the clock does.
        state.last_modified = Some(state.last_modified.map_or(now, |prev| prev.max(now)));
        state.updating = false;

        let mut stats = self.stats.lock();
        stats.updates += 1;
        debug!(bytes = state.content.len(), updates = stats.updates, "Update committed");
        Ok(())
    }

    /// Ends the update transaction without publishing anything.
    ///
    /// Content and freshness stay as they were before `start_update`.
    pub fn abort_update(&self) -> Result<()> {
        let mut state = self.state.write();
        if !state.updating {
            return Err(CacheError::NoActiveTransaction);
        }
        state.rebuild.clear();
        state.updating = false;
        debug!("Update aborted");
        Ok(())
    }

    /// Returns the last committed content and counts the request.
    ///
    /// The returned [`Bytes`] is an immutable view; staged bytes of a
    /// running update are never visible here.
    ///
    /// The content lock is shared, but the request count goes through the
    /// stats mutex so that `statistics` and `clear_statistics` always see
    /// both counters together. Concurrent readers serialize briefly there.
    pub fn get(&self) -> Bytes {
        let content = self.state.read().content.clone();
        self.stats.lock().requests += 1;
        trace!(bytes = content.len(), "Served cached content");
        content
    }

    /// Returns the last commit time as an HTTP date, ready for a
    /// `Last-Modified` header.
    ///
    /// A page that never committed reports the Unix epoch.
    pub fn last_modified(&self) -> String {
        http_date::format(self.last_modified_at().unwrap_or(http_date::UNIX_EPOCH))
    }

    /// Returns the last commit (or clear) time, `None` if neither has happened yet.
    pub fn last_modified_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().last_modified
    }

    /// Returns true while an update transaction is running.
    pub fn is_updating(&self) -> bool {
        self.state.read().updating
    }

    /// Returns the configured time-to-live.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Returns a consistent snapshot of the request and update counters.
    pub fn statistics(&self) -> CacheStats {
        *self.stats.lock()
    }

    /// Zeroes both counters and returns their previous values.
    pub fn clear_statistics(&self) -> CacheStats {
        mem::take(&mut *self.stats.lock())
    }
}

/// Converts `max_age` into the freshness window, capped so that
/// `now - ttl` stays representable.
fn ttl_from(max_age: Duration) -> TimeDelta {
    let ceiling = TimeDelta::seconds(MAX_AGE_CEILING_SECONDS);
    TimeDelta::from_std(max_age).map_or(ceiling, |ttl| ttl.min(ceiling))
}

impl Default for CachedPage {
    fn default() -> Self {
        Self::with_config(CacheConfig::default())
    }
}

impl fmt::Debug for CachedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("CachedPage")
            .field("max_age", &self.max_age)
            .field("updating", &state.updating)
            .field("content_len", &state.content.len())
            .field("last_modified", &state.last_modified)
            .finish_non_exhaustive()
    }
}

//! Check-then-rebuild helper around the update transaction.

use thiserror::Error;
use tracing::debug;

use webcache_core::error::CacheError;

use crate::page::CachedPage;

/// What [`CachedPage::refresh_with`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refresh {
    /// Content was still valid; nothing ran.
    Fresh,
    /// This caller rebuilt and committed the content.
    Rebuilt,
    /// Another caller holds the transaction; existing content stands.
    InProgress,
}

/// Failure of [`CachedPage::refresh_with`].
#[derive(Debug, Error)]
pub enum RefreshError<E> {
    /// The transaction could not be driven to completion.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The producer failed; the transaction was aborted and nothing was published.
    #[error("content producer failed: {0}")]
    Producer(E),
}

/// Aborts the transaction if the producer unwinds before commit.
struct AbortGuard<'a> {
    page: &'a CachedPage,
    armed: bool,
}

impl Drop for AbortGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.page.abort_update();
        }
    }
}

impl CachedPage {
    /// Rebuilds the content with `produce` if it is stale and no other
    /// caller is already doing so.
    ///
    /// Returns [`Refresh::InProgress`] when the committed content is stale
    /// and another caller holds the transaction.
    ///
    /// `produce` runs without any cache lock held. If it returns an error or
    /// panics, the transaction is aborted: the previous content and its
    /// timestamp stay in place and the page leaves the updating state.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use webcache::{CachedPage, Refresh};
    ///
    /// let page = CachedPage::new(Duration::from_secs(90));
    /// let outcome = page
    ///     .refresh_with(|| Ok::<_, std::io::Error>(b"report".to_vec()))
    ///     .unwrap();
    /// assert_eq!(outcome, Refresh::Rebuilt);
    /// assert_eq!(&page.get()[..], b"report");
    /// ```
    pub fn refresh_with<F, T, E>(&self, produce: F) -> Result<Refresh, RefreshError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        T: AsRef<[u8]>,
    {
        if self.committed_is_fresh() {
            return Ok(Refresh::Fresh);
        }
        match self.start_update() {
            Ok(()) => {}
            Err(CacheError::AlreadyUpdating) => {
                debug!("Refresh skipped, another update in progress");
                return Ok(Refresh::InProgress);
            }
            Err(err) => return Err(err.into()),
        }

        // Someone may have committed between the validity check and winning the transaction.
        if self.committed_is_fresh() {
            self.abort_update()?;
            return Ok(Refresh::Fresh);
        }

        let mut guard = AbortGuard { page: self, armed: true };
        let payload = produce().map_err(RefreshError::Producer)?;
        guard.armed = false;

        self.write(payload.as_ref())?;
        self.end_update()?;
        Ok(Refresh::Rebuilt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use webcache_core::traits::ManualClock;

    fn make_page() -> (CachedPage, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        (CachedPage::with_clock(Duration::from_secs(90), clock.clone()), clock)
    }

    fn ok(body: &'static str) -> impl FnOnce() -> Result<&'static str, String> {
        move || Ok(body)
    }

    #[test]
    fn test_refresh_rebuilds_stale_page() {
        let (page, _) = make_page();
        assert_eq!(page.refresh_with(ok("v1")).unwrap(), Refresh::Rebuilt);
        assert_eq!(&page.get()[..], b"v1");
        assert_eq!(page.statistics().updates, 1);
    }

    #[test]
    fn test_refresh_skips_fresh_page() {
        let (page, clock) = make_page();
        page.refresh_with(ok("v1")).unwrap();

        let calls = AtomicUsize::new(0);
        let outcome = page
            .refresh_with(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>("v2")
            })
            .unwrap();
        assert_eq!(outcome, Refresh::Fresh);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        clock.advance(Duration::from_secs(91));
        assert_eq!(page.refresh_with(ok("v2")).unwrap(), Refresh::Rebuilt);
        assert_eq!(&page.get()[..], b"v2");
    }

    #[test]
    fn test_refresh_reports_in_progress() {
        let (page, clock) = make_page();
        page.refresh_with(ok("v1")).unwrap();
        clock.advance(Duration::from_secs(91));

        page.start_update().unwrap();
        let calls = AtomicUsize::new(0);
        let outcome = page
            .refresh_with(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>("v2")
            })
            .unwrap();
        assert_eq!(outcome, Refresh::InProgress);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(page.is_updating());
        assert_eq!(&page.get()[..], b"v1");

        page.end_update().unwrap();
    }

    #[test]
    fn test_refresh_on_fresh_page_during_update() {
        let (page, _) = make_page();
        page.refresh_with(ok("v1")).unwrap();
        page.start_update().unwrap();
        assert_eq!(page.refresh_with(ok("v2")).unwrap(), Refresh::Fresh);
        page.abort_update().unwrap();
    }

    #[test]
    fn test_producer_error_aborts() {
        let (page, _) = make_page();
        page.refresh_with(ok("good")).unwrap();
        page.clear();

        let err = page
            .refresh_with(|| Err::<Vec<u8>, _>("backend down".to_string()))
            .unwrap_err();
        assert!(matches!(err, RefreshError::Producer(ref msg) if msg == "backend down"));
        assert!(err.to_string().contains("backend down"));

        assert!(!page.is_updating());
        assert!(!page.is_valid());
        assert_eq!(&page.get()[..], b"good");
        assert_eq!(page.statistics().updates, 1);
    }

    #[test]
    fn test_producer_panic_aborts() {
        let (page, _) = make_page();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = page.refresh_with(|| -> Result<Vec<u8>, String> { panic!("boom") });
        }));
        assert!(result.is_err());
        assert!(!page.is_updating());
        assert_eq!(page.refresh_with(ok("after")).unwrap(), Refresh::Rebuilt);
    }

    #[test]
    fn test_concurrent_refresh_runs_producer_once() {
        let (page, _) = make_page();
        let racers = 6;
        let barrier = Barrier::new(racers);
        let calls = AtomicUsize::new(0);

        let outcomes: Vec<Refresh> = thread::scope(|s| {
            let handles: Vec<_> = (0..racers)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        page.refresh_with(|| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(20));
                            Ok::<_, String>("shared")
                        })
                        .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcomes.iter().filter(|o| **o == Refresh::Rebuilt).count(), 1);
        assert_eq!(&page.get()[..], b"shared");
    }
}

//! A pool of request handlers sharing one cached report.
//!
//! Each handler checks freshness, and at most one of them rebuilds the
//! report while the others keep serving the previous copy.
//!
//! Run with `RUST_LOG=webcache=debug cargo run -p webcache --example refresh`.

use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use webcache::{CachedPage, LAST_MODIFIED_HEADER};

/// Stand-in for a slow backend query.
fn render_report(generation: u64) -> String {
    thread::sleep(Duration::from_millis(50));
    format!("{{\"generation\":{generation}}}")
}

fn handle_request(page: &CachedPage, worker: usize) {
    if !page.is_valid() && page.start_update().is_ok() {
        let generation = page.statistics().updates + 1;
        let mut sink = page;
        if let Err(err) = write!(sink, "{}", render_report(generation)) {
            warn!(worker, error = %err, "Report write failed");
        }
        if let Err(err) = page.end_update() {
            warn!(worker, error = %err, "Commit failed");
        }
    }

    let body = page.get();
    info!(
        worker,
        header = LAST_MODIFIED_HEADER,
        last_modified = %page.last_modified(),
        body = %String::from_utf8_lossy(&body),
        "Served request"
    );
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let page = Arc::new(CachedPage::new(Duration::from_millis(200)));

    for round in 0..3 {
        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let page = Arc::clone(&page);
                thread::spawn(move || handle_request(&page, worker))
            })
            .collect();
        for worker in workers {
            if worker.join().is_err() {
                warn!(round, "Worker panicked");
            }
        }
        thread::sleep(Duration::from_millis(150));
    }

    let stats = page.clear_statistics();
    info!(requests = stats.requests, updates = stats.updates, "Final statistics");
}

//! Progress UI (spinner) for the crawl phase.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

/// Shared crawl state polled by the spinner task.
///
/// The main loop calls [`CrawlProgress::begin_item`] before each work item;
/// the spinner reads the counters and renders `[n/total] Crawling host...`.
pub(crate) struct CrawlProgress {
    total: usize,
    started: AtomicUsize,
    root: Mutex<String>,
}

impl CrawlProgress {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            started: AtomicUsize::new(0),
            root: Mutex::new(String::new()),
        }
    }

    pub(crate) fn begin_item(&self, root_url: &str) {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut root) = self.root.lock() {
            *root = root_url.to_string();
        }
    }

    fn message(&self) -> String {
        let current = self.started.load(Ordering::SeqCst).min(self.total);
        let root = self
            .root
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default();
        let host = Url::parse(&root)
            .ok()
            .and_then(|url| url.host_str().map(std::string::ToString::to_string))
            .unwrap_or_else(|| "listing".to_string());
        format!("[{current}/{}] Crawling {host}...", self.total)
    }
}

/// Spawns the progress UI (spinner) when requested.
/// Returns (handle, stop) so the caller can signal stop and await the handle.
/// When `use_spinner` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    use_spinner: bool,
    progress: Arc<CrawlProgress>,
) -> (Option<tokio::task::JoinHandle<()>>, Arc<AtomicBool>) {
    if !use_spinner {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_spinner_inner(progress, Arc::clone(&stop));
    (Some(handle), stop)
}

fn spawn_spinner_inner(
    progress: Arc<CrawlProgress>,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        while !stop.load(Ordering::SeqCst) {
            spinner.set_message(progress.message());
            tokio::time::sleep(Duration::from_millis(120)).await;
        }

        spinner.finish_and_clear();
    })
}

//! CLI entry point for the h5mirror tool.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result, bail};
use clap::Parser;
use h5mirror_core::{
    BatchRunner, CrawlReport, Downloader, HttpClient, ResponseCache, WorkItem,
    work_items_from_file,
};
use tracing::{debug, info};

mod cli;
mod progress;

use cli::Args;
use progress::{CrawlProgress, spawn_progress_ui};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("h5mirror starting");

    // Resolve work items: a single root, or one per list-file line
    let items = match (&args.url, &args.file) {
        (Some(url), _) => vec![WorkItem::new(url.clone(), args.depth)],
        (None, Some(file)) => work_items_from_file(file, args.depth)
            .await
            .with_context(|| format!("cannot resolve work items from {}", file.display()))?,
        (None, None) => bail!("either --url or --file is required"),
    };

    if items.is_empty() {
        bail!("no URLs found in the work list");
    }
    if items.len() > 1 {
        info!(roots = items.len(), "processing multiple listing roots");
    }

    let client = HttpClient::new();
    let cache = ResponseCache::new(&args.cache_dir, Arc::new(client.clone()));
    let downloader = Downloader::new(usize::from(args.workers))?;
    let output = args.output_path();
    let runner = BatchRunner::new(
        cache,
        client,
        downloader,
        &args.ledger_dir,
        &output,
        args.flat,
    );

    // Crawl every root with a spinner, item by item so the UI can name the
    // host currently being walked.
    let use_spinner = !args.quiet && args.verbose == 0 && io::stderr().is_terminal();
    let crawl_progress = Arc::new(CrawlProgress::new(items.len()));
    let (ui_handle, stop) = spawn_progress_ui(use_spinner, Arc::clone(&crawl_progress));

    let mut report = CrawlReport::default();
    let mut crawl_error = None;
    for item in &items {
        crawl_progress.begin_item(&item.url);
        match runner.crawl(std::slice::from_ref(item)).await {
            Ok(partial) => report.items.extend(partial.items),
            Err(e) => {
                crawl_error = Some(e);
                break;
            }
        }
    }

    stop.store(true, Ordering::SeqCst);
    if let Some(handle) = ui_handle {
        let _ = handle.await;
    }
    if let Some(e) = crawl_error {
        return Err(e.into());
    }

    let total = report.total_files();
    if total == 0 {
        bail!("no downloadable files found");
    }
    info!(files = total, "total downloadable files");

    if args.export_only {
        let count = runner.export(&report, &output).await?;
        info!(urls = count, path = %output.display(), "export complete");
        return Ok(());
    }

    if !args.yes && !confirm_download(total)? {
        bail!("download aborted");
    }

    let stats = runner.download(&report).await?;

    info!(
        downloaded = stats.downloaded(),
        skipped = stats.skipped(),
        failed = stats.failed(),
        total = stats.total(),
        "Mirror complete"
    );

    Ok(())
}

/// Prompts on stdout and reads one line; only `y` confirms.
fn confirm_download(total: usize) -> Result<bool> {
    print!("{total} files to download. Press y to continue: ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim() == "y")
}

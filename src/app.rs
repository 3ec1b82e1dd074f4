//! Subcommand implementations behind the `wallstash` binary.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use anyhow::{bail, Context, Result};
use bytesize::ByteSize;
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::cli::{BrowseArgs, Cli, Commands, DownloadArgs, InfoArgs, ListArgs, RemoveArgs};
use crate::config::Config;
use crate::dispatch::MainLoop;
use crate::download::{DownloadCoordinator, DownloadError, DownloadFinished, DownloadOutcome};
use crate::error::ExitCode;
use crate::local::{DiskStorage, LocalPhotoEntry, LocalPhotoIndex, PhotoStorage};
use crate::logging::init_logging;
use crate::progress::DownloadProgress;
use crate::remote::{ListingService, RemotePhotoGateway};

/// Extra time granted on top of the per-request timeouts before giving up
/// on outstanding work.
const GRACE: Duration = Duration::from_secs(30);

/// JSON view of a local entry.
#[derive(Debug, Serialize)]
struct EntryView {
    id: String,
    path: PathBuf,
    width: Option<u32>,
    height: Option<u32>,
    size: Option<String>,
    modified: DateTime<Local>,
}

impl EntryView {
    fn new(entry: &LocalPhotoEntry) -> Self {
        let size = fs::metadata(entry.path())
            .ok()
            .map(|m| ByteSize::b(m.len()).to_string());
        Self {
            id: entry.photo_id().to_string(),
            path: entry.path().to_path_buf(),
            width: entry.resolution().map(|r| r.width),
            height: entry.resolution().map(|r| r.height),
            size,
            modified: DateTime::<Local>::from(entry.modified()),
        }
    }
}

/// Run the CLI after argument parsing.
///
/// # Errors
///
/// Returns any error that aborts the subcommand. Per-item download failures
/// are reported through the exit code instead.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    init_logging(cli.verbose, cli.quiet);

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.dir {
        config.download_dir = dir;
    }
    log::debug!("Download directory: {}", config.download_dir.display());

    match cli.command {
        Commands::List(args) => list(&config, &args),
        Commands::Info(args) => info(&config, &args),
        Commands::Remove(args) => remove(&config, &args),
        Commands::Download(args) => download(config, &args, cli.quiet),
        Commands::Browse(args) => browse(&config, &args),
        Commands::Config => {
            print!("{}", config.to_toml().context("Failed to render configuration")?);
            Ok(ExitCode::Success)
        }
    }
}

fn open_index(config: &Config, storage: Arc<dyn PhotoStorage>) -> Result<Arc<LocalPhotoIndex>> {
    let index = LocalPhotoIndex::open(&config.download_dir, storage)
        .context("Failed to index download directory")?;
    Ok(Arc::new(index))
}

#[cfg(feature = "http")]
fn gateway(config: &Config) -> Result<Arc<dyn RemotePhotoGateway>> {
    let gateway = crate::remote::WallhavenGateway::new(&config.api_base_url, config.request_timeout())
        .context("Failed to create HTTP client")?;
    Ok(Arc::new(gateway))
}

#[cfg(not(feature = "http"))]
fn gateway(_config: &Config) -> Result<Arc<dyn RemotePhotoGateway>> {
    bail!("wallstash was built without the `http` feature; remote access is unavailable")
}

fn format_modified(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

fn list(config: &Config, args: &ListArgs) -> Result<ExitCode> {
    let index = open_index(config, Arc::new(DiskStorage::new()))?;
    index.sort_by(args.sort.into());
    let entries = index.list();

    if args.json {
        let views: Vec<EntryView> = entries.iter().map(|e| EntryView::new(e)).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(ExitCode::Success);
    }

    if entries.is_empty() {
        println!("No wallpapers in {}", index.directory().display());
        return Ok(ExitCode::Success);
    }
    for entry in &entries {
        println!(
            "{:<10} {:>13}  {}  {}",
            entry.photo_id(),
            entry.resolution_label(),
            format_modified(entry.modified()),
            entry.path().display()
        );
    }
    println!("{} wallpapers", entries.len());
    Ok(ExitCode::Success)
}

fn info(config: &Config, args: &InfoArgs) -> Result<ExitCode> {
    let index = open_index(config, Arc::new(DiskStorage::new()))?;
    let Some(entry) = index.get(&args.id) else {
        bail!("{} is not in {}", args.id, index.directory().display());
    };
    let view = EntryView::new(&entry);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(ExitCode::Success);
    }
    println!("Id:         {}", view.id);
    println!("File:       {}", view.path.display());
    println!("Resolution: {}", entry.resolution_label());
    if let Some(size) = view.size {
        println!("Size:       {}", size);
    }
    println!("Saved:      {}", format_modified(entry.modified()));
    println!("Page:       {}", crate::model::PhotoRecord::thumb(&view.id, None).info_link());
    Ok(ExitCode::Success)
}

fn remove(config: &Config, args: &RemoveArgs) -> Result<ExitCode> {
    let storage: Arc<dyn PhotoStorage> = Arc::new(DiskStorage::new());
    let index = open_index(config, Arc::clone(&storage))?;
    let Some(entry) = index.get(&args.id) else {
        bail!("{} is not in {}", args.id, index.directory().display());
    };

    storage
        .delete(entry.path())
        .with_context(|| format!("Failed to delete {}", entry.path().display()))?;
    index.remove_entry(&entry);
    println!("Removed {}", entry.path().display());
    Ok(ExitCode::Success)
}

/// Time to wait for `started` downloads spread over `workers` threads. Each
/// download makes two requests.
fn download_deadline(started: usize, workers: usize, request_timeout: Duration) -> Duration {
    let waves = u32::try_from(started.div_ceil(workers.max(1))).unwrap_or(u32::MAX);
    request_timeout
        .saturating_mul(2)
        .saturating_mul(waves)
        .saturating_add(GRACE)
}

fn download(mut config: Config, args: &DownloadArgs, quiet: bool) -> Result<ExitCode> {
    if let Some(workers) = args.workers {
        config.download_workers = workers.max(1);
    }
    if let Some(quality) = args.quality {
        config.save_quality = quality;
    }

    let storage: Arc<dyn PhotoStorage> = Arc::new(DiskStorage::new());
    let index = open_index(&config, Arc::clone(&storage))?;
    let coordinator =
        DownloadCoordinator::new(config.download_config(), index, gateway(&config)?, storage)
            .context("Failed to start download workers")?;

    let main_loop = MainLoop::new();
    let handle = main_loop.handle();
    let progress = DownloadProgress::new(args.ids.len(), quiet);
    let finished: Arc<Mutex<Vec<DownloadFinished>>> = Arc::new(Mutex::new(Vec::new()));

    let mut started: usize = 0;
    let mut skipped: usize = 0;
    for (position, id) in args.ids.iter().enumerate() {
        let sink = Arc::clone(&finished);
        let bar = progress.clone();
        match coordinator.start_download(id, position, &handle, move |done| {
            bar.on_finished(&done);
            if let Ok(mut list) = sink.lock() {
                list.push(done);
            }
        }) {
            Ok(()) => started += 1,
            Err(DownloadError::AlreadyInProgress(id)) => {
                log::warn!("{} listed more than once, skipping duplicate", id);
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
    // Callbacks only run once the loop is pumped, so the bar is still at 0.
    progress.set_total(started);

    let deadline = download_deadline(started, config.download_workers, config.request_timeout());
    let all_done = main_loop.run_until(deadline, || {
        finished.lock().map(|l| l.len() >= started).unwrap_or(true)
    });
    progress.finish();

    let results = finished
        .lock()
        .map(|mut l| std::mem::take(&mut *l))
        .unwrap_or_default();
    let mut failed = 0;
    for done in &results {
        if matches!(done.outcome, DownloadOutcome::Failed(_)) {
            failed += 1;
        }
        progress.println(&format!("{}: {}", done.photo_id, done.outcome.message()));
    }
    if !all_done {
        let missing = started - results.len();
        log::error!("{} downloads did not finish in time", missing);
        failed += missing;
    }

    log::debug!(
        "{} started, {} skipped, {} failed",
        started,
        skipped,
        failed
    );
    Ok(ExitCode::for_batch(started, failed))
}

fn browse(config: &Config, args: &BrowseArgs) -> Result<ExitCode> {
    let service = ListingService::new(gateway(config)?).context("Failed to start listing queue")?;
    let main_loop = MainLoop::new();
    let slot = Arc::new(Mutex::new(None));

    let sink = Arc::clone(&slot);
    service.fetch_page(args.category(), args.page, &main_loop.handle(), move |result| {
        if let Ok(mut slot) = sink.lock() {
            *slot = Some(result);
        }
    });

    let deadline = config.request_timeout().saturating_add(GRACE);
    main_loop.run_until(deadline, || slot.lock().map(|s| s.is_some()).unwrap_or(true));

    let result = slot.lock().ok().and_then(|mut s| s.take());
    let Some(result) = result else {
        bail!("Listing request did not finish in time");
    };
    let records = result.context("Failed to fetch listing")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(ExitCode::Success);
    }
    for record in &records {
        let resolution = record
            .resolution()
            .map_or_else(|| "unknown".to_string(), |r| r.to_string());
        println!("{:<10} {:>13}  {}", record.id(), resolution, record.info_link());
    }
    Ok(ExitCode::Success)
}

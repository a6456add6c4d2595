use crate::core::{
    config::Config,
    download::Downloader,
    extract,
    registry::{DatasetRegistry, DownloadTask},
};
use crate::error::{FetchError, Result};
use crate::utils::fs;
use serde::Serialize;
use std::future::Future;
use tracing::{debug, info, warn};

/// Terminal state of a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Skipped,
    Succeeded,
    /// `city/kind: reason`
    Failed(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunTally {
    pub successful: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
}

impl RunTally {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Skipped => self.skipped += 1,
            TaskOutcome::Succeeded => self.successful += 1,
            TaskOutcome::Failed(reason) => {
                self.failed += 1;
                self.failures.push(reason);
            }
        }
    }

    /// True when nothing failed and every expected file is on disk.
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.successful + self.skipped == self.total
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_complete() {
            0
        } else {
            1
        }
    }

    pub fn print_summary(&self) {
        println!("downloaded: {}", self.successful);
        println!("skipped (already exist): {}", self.skipped);
        println!("failed: {}", self.failed);
        for reason in &self.failures {
            println!("  {reason}");
        }

        if self.is_complete() {
            println!("all files ready");
        } else {
            println!("some downloads failed");
        }
    }
}

/// Process exit status for a finished, failed or interrupted run.
pub fn exit_status<E>(result: &std::result::Result<RunTally, E>) -> u8 {
    match result {
        Ok(tally) => tally.exit_code(),
        Err(_) => 1,
    }
}

/// Fetches and unpacks one file unless its CSV is already present.
///
/// Network and extraction failures become [`TaskOutcome::Failed`]; any other
/// error is returned and aborts the run.
pub async fn run_task(task: &DownloadTask, downloader: &Downloader) -> Result<TaskOutcome> {
    if task.decompressed_path.exists() {
        let size = fs::file_size(&task.decompressed_path)?;
        info!(
            "{}/{} already exists ({:.1} MB), skipping",
            task.city,
            task.kind,
            fs::size_in_mb(size)
        );
        return Ok(TaskOutcome::Skipped);
    }

    if let Err(e) = downloader
        .download_file(&task.url, &task.compressed_path)
        .await
    {
        return task_failure(task, e);
    }

    match extract::extract_gz_blocking(
        task.compressed_path.clone(),
        task.decompressed_path.clone(),
    )
    .await
    {
        Ok(_) => Ok(TaskOutcome::Succeeded),
        Err(e) => task_failure(task, e),
    }
}

fn task_failure(task: &DownloadTask, error: FetchError) -> Result<TaskOutcome> {
    if !error.is_task_local() {
        return Err(error);
    }
    warn!("{}/{} failed: {error}", task.city, task.kind);
    Ok(TaskOutcome::Failed(format!(
        "{}/{}: {error}",
        task.city, task.kind
    )))
}

/// Walks the registry in order, one task at a time.
pub async fn fetch_datasets(
    config: &Config,
    registry: &DatasetRegistry,
    downloader: &Downloader,
) -> Result<RunTally> {
    let mut tally = RunTally::new(registry.task_count());

    for city in registry.cities() {
        let city_dir = config.get_city_dir(&city.city);
        fs::ensure_dir_exists(&city_dir)?;

        info!("{}", city.city.to_uppercase());

        for task in registry.tasks_for(city, config) {
            let outcome = run_task(&task, downloader).await?;
            debug!("{}/{} -> {:?}", task.city, task.kind, outcome);
            tally.record(outcome);
        }
    }

    Ok(tally)
}

/// Runs [`fetch_datasets`] until `shutdown` resolves.
///
/// Finished CSV files stay in place; a cut-off task leaves at most a `.gz` or
/// `.part` file, which the next run ignores.
pub async fn fetch_until<F>(
    config: &Config,
    registry: &DatasetRegistry,
    downloader: &Downloader,
    shutdown: F,
) -> Result<RunTally>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = shutdown => {
            warn!("Interrupted, stopping");
            Err(FetchError::Interrupted)
        }
        tally = fetch_datasets(config, registry, downloader) => tally,
    }
}

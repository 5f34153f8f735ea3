//! Concurrent per-file processing
//!
//! Runs a blocking task for every input file on the tokio blocking pool, at
//! most `workers` at a time, and returns successes in input order.

use super::shared::CommandStats;
use anyhow::Result;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Results of a batch, successes and failures kept apart
#[derive(Debug)]
pub struct BatchOutcome<T> {
    /// Successful results, in input order
    pub results: Vec<(PathBuf, T)>,
    /// Failed files with the formatted error chain
    pub failures: Vec<(PathBuf, String)>,
    pub elapsed: Duration,
}

/// Run `task` on every file with bounded concurrency
pub async fn process_files<T, F>(
    files: Vec<PathBuf>,
    workers: usize,
    progress: ProgressBar,
    task: F,
) -> BatchOutcome<T>
where
    T: Send + 'static,
    F: Fn(PathBuf) -> Result<T> + Send + Sync + 'static,
{
    info!(
        "Processing {} files with {} workers",
        files.len(),
        workers.max(1)
    );
    let start = Instant::now();
    let task = Arc::new(task);

    let (mut results, failures) = stream::iter(files.into_iter().enumerate().map(|(index, path)| {
        let task = Arc::clone(&task);
        async move {
            let label = path.clone();
            let result = tokio::task::spawn_blocking(move || (*task)(path)).await;
            (index, label, result)
        }
    }))
    .buffer_unordered(workers.max(1))
    .fold(
        (Vec::<(usize, PathBuf, T)>::new(), Vec::<(PathBuf, String)>::new()),
        |(mut results, mut failures), (index, path, result)| {
            let progress = progress.clone();
            async move {
                match result {
                    Ok(Ok(value)) => results.push((index, path, value)),
                    Ok(Err(e)) => {
                        error!("{}: {:#}", path.display(), e);
                        failures.push((path, format!("{:#}", e)));
                    }
                    Err(e) => {
                        error!("{}: worker failed: {}", path.display(), e);
                        failures.push((path, format!("worker failed: {}", e)));
                    }
                }
                progress.inc(1);
                (results, failures)
            }
        },
    )
    .await;

    results.sort_by_key(|(index, _, _)| *index);
    progress.finish_and_clear();
    BatchOutcome {
        results: results
            .into_iter()
            .map(|(_, path, value)| (path, value))
            .collect(),
        failures,
        elapsed: start.elapsed(),
    }
}

impl BatchOutcome<CommandStats> {
    /// Combined statistics of every file
    pub fn into_stats(self) -> CommandStats {
        let mut stats = CommandStats::default();
        for (_, file_stats) in self.results {
            stats.absorb(file_stats);
        }
        for (path, message) in self.failures {
            stats.record_failure(path, message);
        }
        stats.processing_time = self.elapsed;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let files: Vec<PathBuf> = (0..8).map(|i| PathBuf::from(format!("{}.csv", i))).collect();
        let outcome = process_files(files.clone(), 3, ProgressBar::hidden(), |path| {
            Ok(path.to_string_lossy().len())
        })
        .await;

        let paths: Vec<PathBuf> = outcome.results.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(paths, files);
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_collected() {
        let files = vec![PathBuf::from("good.csv"), PathBuf::from("bad.csv")];
        let outcome = process_files(files, 2, ProgressBar::hidden(), |path| {
            if path.to_string_lossy().starts_with("bad") {
                bail!("cannot read {}", path.display());
            }
            Ok(CommandStats {
                files_processed: 1,
                rows_processed: 4,
                ..CommandStats::default()
            })
        })
        .await;

        let stats = outcome.into_stats();
        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.rows_processed, 4);
        assert_eq!(stats.files_failed(), 1);
        assert!(stats.failures[0].1.contains("cannot read bad.csv"));
    }
}

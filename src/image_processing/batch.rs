use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ProcessError;

/// One unit of batch work: a file name plus the directory it comes from and
/// the directory its normalized output goes to.
///
/// Items are created when the batch is enumerated and consumed exactly once
/// by one worker.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub file_name: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl BatchItem {
    pub fn new(
        file_name: impl Into<String>,
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Full path of the input file.
    pub fn input_path(&self) -> PathBuf {
        self.input_dir.join(&self.file_name)
    }
}

/// Per-item outcome reported by the scheduler: the written output path on
/// success, or the captured failure reason.
#[derive(Debug)]
pub struct BatchResult {
    pub item: BatchItem,
    pub outcome: Result<PathBuf>,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Aggregate progress across concurrently completing items.
///
/// Completion order is unspecified, so the percentage advances by a fixed
/// per-item step instead of being derived from item indices. Once every item
/// is accounted for, the value snaps to exactly 100, swallowing accumulated
/// rounding error.
pub struct ProgressTracker {
    total: usize,
    completed: AtomicUsize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
        }
    }

    /// Record one completed item (success or failure) and return the updated
    /// overall percentage.
    pub fn complete_one(&self) -> f64 {
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if done >= self.total {
            100.0
        } else {
            (100.0 / self.total as f64) * done as f64
        }
    }

    #[allow(dead_code)]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[allow(dead_code)]
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.completed())
    }
}

/// Run the pipeline once per item across a bounded worker pool.
///
/// Up to `worker_limit` items execute concurrently; the rest queue until a
/// slot frees. A failure inside one item's processing is captured as that
/// item's result and never aborts sibling items. `on_item_done` fires once
/// per item (success or failure) with the updated overall percentage.
///
/// An empty item list is a precondition violation: [`ProcessError::EmptyBatch`]
/// is returned before any item is dispatched.
pub fn run<F, C>(
    items: Vec<BatchItem>,
    worker_limit: usize,
    process_fn: F,
    on_item_done: C,
) -> Result<Vec<BatchResult>>
where
    F: Fn(&BatchItem) -> Result<PathBuf> + Send + Sync,
    C: Fn(&BatchResult, f64) + Send + Sync,
{
    if items.is_empty() {
        return Err(ProcessError::EmptyBatch.into());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_limit.max(1))
        .build()
        .context("Failed to initialize worker pool")?;

    let tracker = ProgressTracker::new(items.len());

    let results: Vec<BatchResult> = pool.install(|| {
        items
            .into_par_iter()
            .map(|item| {
                let outcome = process_fn(&item);
                let result = BatchResult { item, outcome };
                let percent = tracker.complete_one();
                on_item_done(&result, percent);
                result
            })
            .collect()
    });

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn test_items(count: usize) -> Vec<BatchItem> {
        (0..count)
            .map(|i| BatchItem::new(format!("image_{i}.png"), "/in", "/out"))
            .collect()
    }

    #[test]
    fn test_empty_batch_fails_before_dispatch() {
        let dispatched = AtomicUsize::new(0);
        let err = run(
            Vec::new(),
            4,
            |_| {
                dispatched.fetch_add(1, Ordering::Relaxed);
                Ok(PathBuf::new())
            },
            |_, _| {},
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ProcessError>(),
            Some(ProcessError::EmptyBatch)
        ));
        assert_eq!(dispatched.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_all_items_reported_exactly_once() {
        let seen = Mutex::new(Vec::new());
        let results = run(
            test_items(10),
            4,
            |item| Ok(PathBuf::from(format!("/out/{}", item.file_name))),
            |result, percent| {
                seen.lock()
                    .unwrap()
                    .push((result.item.file_name.clone(), percent));
            },
        )
        .unwrap();

        assert_eq!(results.len(), 10);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 10);

        let unique: HashSet<_> = seen.iter().map(|(name, _)| name.clone()).collect();
        assert_eq!(unique.len(), 10);

        // The highest reported percentage is exactly 100 regardless of
        // accumulated floating point error.
        let final_percent = seen.iter().map(|(_, p)| *p).fold(0.0, f64::max);
        assert_eq!(final_percent, 100.0);
    }

    #[test]
    fn test_item_failures_are_isolated() {
        let results = run(
            test_items(10),
            4,
            |item| {
                if item.file_name == "image_2.png" || item.file_name == "image_7.png" {
                    anyhow::bail!("simulated decode failure")
                }
                Ok(PathBuf::from(format!("/out/{}", item.file_name)))
            },
            |_, _| {},
        )
        .unwrap();

        let successful = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - successful;
        assert_eq!(successful, 8);
        assert_eq!(failed, 2);
    }

    #[test]
    fn test_single_worker_still_drains_queue() {
        let results = run(test_items(5), 1, |_| Ok(PathBuf::new()), |_, _| {}).unwrap();
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn test_progress_step_is_fixed_per_item() {
        let tracker = ProgressTracker::new(3);
        let first = tracker.complete_one();
        let second = tracker.complete_one();
        let third = tracker.complete_one();

        assert!((first - 100.0 / 3.0).abs() < 1e-9);
        assert!((second - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(third, 100.0);
        assert_eq!(tracker.remaining(), 0);
    }

    #[test]
    fn test_input_path_joins_directory_and_name() {
        let item = BatchItem::new("photo.jpg", "/data/in", "/data/out");
        assert_eq!(item.input_path(), PathBuf::from("/data/in/photo.jpg"));
    }
}

//! Stress tests for SheetStore.
//!
//! These runners drive a datastore from several threads at once and report
//! how many operations succeeded.

use sheetstore_core::{
    CellKind, Datastore, HistoryLog, SaveMode, WorksheetIdent,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Saves performed by each thread.
    pub saves_per_thread: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Cells appended per save.
    pub cells_per_save: usize,
    /// Owner of the worksheets.
    pub owner: String,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            saves_per_thread: 50,
            threads: 4,
            cells_per_save: 1,
            owner: "stress".to_string(),
        }
    }
}

/// Each thread owns one worksheet and repeatedly appends cells and saves it.
///
/// Returns the identities used, in thread order, along with the counts.
/// Afterwards worksheet `t` holds exactly
/// `saves_per_thread * cells_per_save` cells.
pub fn stress_concurrent_saves<D>(
    store: Arc<D>,
    config: &StressConfig,
) -> (Vec<WorksheetIdent>, StressTestResult)
where
    D: Datastore + 'static,
{
    let idents: Vec<WorksheetIdent> = (0..config.threads as u64)
        .map(|t| WorksheetIdent::new(&config.owner, t).expect("Invalid stress owner"))
        .collect();
    for ident in &idents {
        store
            .create_worksheet(ident)
            .expect("Failed to create stress worksheet");
    }

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let handles: Vec<_> = idents
        .iter()
        .cloned()
        .map(|ident| {
            let store = Arc::clone(&store);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let saves = config.saves_per_thread;
            let cells = config.cells_per_save;

            thread::spawn(move || {
                let mut ws = match store.load_worksheet(&ident) {
                    Ok(ws) => ws,
                    Err(_) => {
                        failed.fetch_add(saves, Ordering::Relaxed);
                        return;
                    }
                };
                for i in 0..saves {
                    for c in 0..cells {
                        ws.push_cell(CellKind::Compute, format!("{ident} save {i} cell {c}"));
                    }
                    match store.save_worksheet(&ws, SaveMode::Full) {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Stress thread panicked");
    }

    let result = StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    );
    (idents, result)
}

/// All threads save to the same worksheet. Each save replaces the body
/// with `thread` identical cells, so any torn write shows up as a body
/// mixing cells from two writers.
pub fn stress_contended_saves<D>(store: Arc<D>, config: &StressConfig) -> StressTestResult
where
    D: Datastore + 'static,
{
    let ident = WorksheetIdent::new(&config.owner, 0).expect("Invalid stress owner");
    store
        .create_worksheet(&ident)
        .expect("Failed to create stress worksheet");

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let ident = ident.clone();
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let saves = config.saves_per_thread;
            let cells = config.cells_per_save.max(1);

            thread::spawn(move || {
                for _ in 0..saves {
                    let result = store.load_worksheet(&ident).and_then(|mut ws| {
                        ws.body.cells.clear();
                        for _ in 0..cells {
                            ws.push_cell(CellKind::Compute, format!("writer {t}"));
                        }
                        ws.set_title(format!("writer {t}"));
                        store.save_worksheet(&ws, SaveMode::Full)
                    });
                    match result {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Stress thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Threads repeatedly replace the histories of distinct users.
pub fn stress_history_writes<D>(store: Arc<D>, config: &StressConfig) -> StressTestResult
where
    D: Datastore + 'static,
{
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let user = format!("{}{t}", config.owner);
            let saves = config.saves_per_thread;

            thread::spawn(move || {
                let mut log = HistoryLog::new();
                for i in 0..saves {
                    log.push(format!("command {i}"));
                    match store.save_user_history(&user, &log) {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Stress thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

//! Workload Driver Task
//!
//! Background task that hammers both caches from several blocking workers
//! and reports what happened.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::{ConcurrentCache, RecencyCache};
use crate::config::Config;

/// Summary of one workload run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkloadReport {
    /// Workers that ran to completion or shutdown
    pub workers: usize,
    /// Lookups issued against each cache
    pub operations: u64,
    /// Factory executions in the recency cache
    pub recency_computations: u64,
    /// Factory executions in the concurrent cache
    pub concurrent_computations: u64,
    /// Lookups that returned a value other than the expected one
    pub mismatches: u64,
    /// Entries left in the recency cache
    pub recency_len: usize,
    /// Entries left in the concurrent cache
    pub concurrent_count: usize,
}

#[derive(Debug, Default)]
struct WorkerOutcome {
    operations: u64,
    mismatches: u64,
}

/// Shared state handed to every worker.
struct Workload {
    recency: Arc<RecencyCache<u64, u64>>,
    concurrent: Arc<ConcurrentCache<u64, u64>>,
    recency_computations: AtomicU64,
    concurrent_computations: AtomicU64,
    key_space: u64,
    operations: usize,
    stop: Arc<AtomicBool>,
}

/// Value every worker expects to see for `key`.
pub fn expected_value(key: u64) -> u64 {
    key.wrapping_mul(2_654_435_761)
}

/// Spawns the workload driver.
///
/// Each of `config.worker_count` workers runs on the blocking pool and issues
/// `config.operations_per_worker` get-or-compute calls against both caches,
/// walking the key space in a worker-specific order. Setting `stop` makes
/// every worker return early.
///
/// # Returns
/// A JoinHandle resolving to the run report once all workers finish.
///
/// # Example
/// ```ignore
/// let recency = Arc::new(RecencyCache::new(config.cache_capacity)?);
/// let concurrent = Arc::new(ConcurrentCache::new());
/// let stop = Arc::new(AtomicBool::new(false));
/// let report = spawn_workload(recency, concurrent, &config, stop).await?;
/// ```
pub fn spawn_workload(
    recency: Arc<RecencyCache<u64, u64>>,
    concurrent: Arc<ConcurrentCache<u64, u64>>,
    config: &Config,
    stop: Arc<AtomicBool>,
) -> JoinHandle<WorkloadReport> {
    let worker_count = config.worker_count;
    let workload = Arc::new(Workload {
        recency,
        concurrent,
        recency_computations: AtomicU64::new(0),
        concurrent_computations: AtomicU64::new(0),
        key_space: config.key_space as u64,
        operations: config.operations_per_worker,
        stop,
    });

    tokio::spawn(async move {
        info!(
            "Starting workload: {} workers x {} operations over {} keys",
            worker_count, workload.operations, workload.key_space
        );

        let handles: Vec<_> = (0..worker_count)
            .map(|worker| {
                let workload = workload.clone();
                tokio::task::spawn_blocking(move || run_worker(&workload, worker as u64))
            })
            .collect();

        let mut report = WorkloadReport::default();
        for handle in handles {
            match handle.await {
                Ok(outcome) => {
                    report.workers += 1;
                    report.operations += outcome.operations;
                    report.mismatches += outcome.mismatches;
                }
                Err(e) => error!("Workload worker failed: {}", e),
            }
        }

        report.recency_computations = workload.recency_computations.load(Ordering::SeqCst);
        report.concurrent_computations = workload.concurrent_computations.load(Ordering::SeqCst);
        report.recency_len = workload.recency.len();
        report.concurrent_count = workload.concurrent.count();

        info!(
            "Workload finished: {} operations, {} mismatches",
            report.operations, report.mismatches
        );
        report
    })
}

fn run_worker(workload: &Workload, worker: u64) -> WorkerOutcome {
    let mut outcome = WorkerOutcome::default();

    for i in 0..workload.operations as u64 {
        if workload.stop.load(Ordering::Relaxed) {
            debug!("Worker {} stopping early after {} operations", worker, i);
            break;
        }

        let key = (worker.wrapping_mul(7919) + i.wrapping_mul(104_729)) % workload.key_space;

        let bounded = workload.recency.get_or_compute(key, || {
            workload.recency_computations.fetch_add(1, Ordering::SeqCst);
            expected_value(key)
        });
        let unbounded = workload.concurrent.get_or_set(key, || {
            workload.concurrent_computations.fetch_add(1, Ordering::SeqCst);
            expected_value(key)
        });

        if bounded != expected_value(key) || unbounded != expected_value(key) {
            outcome.mismatches += 1;
        }
        outcome.operations += 1;
    }

    debug!("Worker {} done: {} operations", worker, outcome.operations);
    outcome
}

//! Background session worker.
//!
//! # Responsibility
//! - Run every network and disk operation off the interactive thread.
//! - Report results back over a completion channel keyed by job id.
//!
//! # Invariants
//! - The interactive thread never performs blocking I/O; it submits jobs
//!   and drains completions.
//! - A cancelled job's late result is discarded: its completion is
//!   reported as `Cancelled` and nothing from it reaches the store.
//! - The record store is the only mutable state shared with the worker,
//!   and the worker only touches it through the store contract.

use crate::net::geocode::{GeocodeClient, GeocodeResult};
use crate::net::BackendGateway;
use crate::repo::snapshot::{SnapshotError, SqliteSnapshotRepository};
use crate::store::record_store::RecordStore;
use crate::sync::manager::{SyncManager, SyncReport};
use log::{info, warn};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

/// Monotonic identifier for one submitted job.
pub type JobId = u64;

/// Work the interactive thread can hand to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Probe backend reachability (session-start decision between
    /// backend-synced and local-only mode).
    HealthCheck { timeout_ms: u64 },
    /// Resolve an address; the result is applied by the interactive
    /// thread, never by the worker.
    Geocode { address: String, timeout_ms: u64 },
    /// Push every pending record to the backend.
    PushPending { timeout_ms: u64 },
    /// Pull backend changes into the store.
    PullUpdates { timeout_ms: u64 },
    /// Write the working set to the local snapshot file.
    SaveLocally,
}

/// Result of one finished job.
#[derive(Debug)]
pub enum JobOutcome {
    Health { connected: bool },
    Geocode(GeocodeResult),
    Push(SyncReport),
    Pull(SyncReport),
    Save(Result<(), SnapshotError>),
    /// Job was cancelled before its result was delivered; nothing was
    /// applied to the store on its behalf.
    Cancelled,
}

/// Completion message delivered to the interactive thread.
#[derive(Debug)]
pub struct Completion {
    pub job: JobId,
    pub outcome: JobOutcome,
}

/// Owns the worker thread plus the job/completion channels.
pub struct SessionWorker {
    jobs: Option<Sender<(JobId, Job)>>,
    completions: Receiver<Completion>,
    cancelled: Arc<Mutex<HashSet<JobId>>>,
    next_job: AtomicU64,
    handle: Option<JoinHandle<()>>,
}

impl SessionWorker {
    /// Spawns the worker for one session.
    ///
    /// `snapshot_path` is where `Job::SaveLocally` writes; a session
    /// without one reports save jobs as failed instead of guessing.
    pub fn spawn(
        store: Arc<Mutex<RecordStore>>,
        gateway: Arc<dyn BackendGateway>,
        snapshot_path: Option<PathBuf>,
    ) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<(JobId, Job)>();
        let (completion_tx, completion_rx) = mpsc::channel::<Completion>();
        let cancelled = Arc::new(Mutex::new(HashSet::new()));

        let worker_cancelled = Arc::clone(&cancelled);
        let handle = std::thread::spawn(move || {
            run_worker(job_rx, completion_tx, store, gateway, snapshot_path, worker_cancelled);
        });

        Self {
            jobs: Some(job_tx),
            completions: completion_rx,
            cancelled,
            next_job: AtomicU64::new(1),
            handle: Some(handle),
        }
    }

    /// Queues one job and returns its id.
    pub fn submit(&self, job: Job) -> JobId {
        let id = self.next_job.fetch_add(1, Ordering::Relaxed);
        if let Some(jobs) = &self.jobs {
            if jobs.send((id, job)).is_err() {
                warn!("event=job_submit module=worker status=worker_gone job={id}");
            }
        }
        id
    }

    /// Marks a job cancelled. If it already ran, the flag is a no-op; if
    /// it is in flight or queued, its completion arrives as `Cancelled`.
    pub fn cancel(&self, job: JobId) {
        lock_unpoisoned(&self.cancelled).insert(job);
    }

    /// Non-blocking completion poll for UI ticks.
    pub fn try_next_completion(&self) -> Option<Completion> {
        self.completions.try_recv().ok()
    }

    /// Bounded wait for the next completion.
    pub fn next_completion(&self, timeout: Duration) -> Option<Completion> {
        match self.completions.recv_timeout(timeout) {
            Ok(completion) => Some(completion),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for SessionWorker {
    fn drop(&mut self) {
        // Closing the job channel lets the worker loop drain and exit.
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_worker(
    jobs: Receiver<(JobId, Job)>,
    completions: Sender<Completion>,
    store: Arc<Mutex<RecordStore>>,
    gateway: Arc<dyn BackendGateway>,
    snapshot_path: Option<PathBuf>,
    cancelled: Arc<Mutex<HashSet<JobId>>>,
) {
    let geocode = GeocodeClient::new(Arc::clone(&gateway));
    let sync = SyncManager::new(Arc::clone(&gateway));

    while let Ok((id, job)) = jobs.recv() {
        // A job cancelled while still queued is skipped outright.
        if lock_unpoisoned(&cancelled).remove(&id) {
            let _ = completions.send(Completion {
                job: id,
                outcome: JobOutcome::Cancelled,
            });
            continue;
        }

        let outcome = match job {
            Job::HealthCheck { timeout_ms } => JobOutcome::Health {
                connected: gateway.health_check(timeout_ms),
            },
            Job::Geocode {
                address,
                timeout_ms,
            } => JobOutcome::Geocode(geocode.resolve(&address, timeout_ms)),
            Job::PushPending { timeout_ms } => {
                let mut store = lock_unpoisoned(&store);
                JobOutcome::Push(sync.push_pending(&mut store, timeout_ms))
            }
            Job::PullUpdates { timeout_ms } => {
                let mut store = lock_unpoisoned(&store);
                JobOutcome::Pull(sync.pull_updates(&mut store, timeout_ms))
            }
            Job::SaveLocally => JobOutcome::Save(save_snapshot(&store, snapshot_path.as_deref())),
        };

        // A job cancelled mid-flight reports Cancelled; its result is
        // discarded so the interactive thread cannot apply it late.
        let outcome = if lock_unpoisoned(&cancelled).remove(&id) {
            JobOutcome::Cancelled
        } else {
            outcome
        };

        if completions
            .send(Completion {
                job: id,
                outcome,
            })
            .is_err()
        {
            // Session side hung up; nothing left to report to.
            break;
        }
    }
    info!("event=worker_stop module=worker status=ok");
}

fn save_snapshot(
    store: &Arc<Mutex<RecordStore>>,
    snapshot_path: Option<&std::path::Path>,
) -> Result<(), SnapshotError> {
    let Some(path) = snapshot_path else {
        return Err(SnapshotError::NoSnapshotPath);
    };
    let conn = crate::db::open_snapshot(path)?;
    let repo = SqliteSnapshotRepository::try_new(&conn)?;
    let store = lock_unpoisoned(store);
    store.save_locally(&repo)
}

/// Recovers the guard from a poisoned lock; store mutations are
/// all-or-nothing, so the data behind a poisoned lock is still valid.
fn lock_unpoisoned<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

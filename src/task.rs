use crate::resolver::{DiskUsageResolver, Resolution};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed(Resolution),
    Cancelled,
    /// The worker panicked or vanished before reporting.
    Failed(String),
}

const WORKER_LOST: &str = "worker exited without a result";

/// Clears the running flag however the worker exits.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Handle to one background resolution.
pub struct ResolutionHandle {
    rx:        mpsc::Receiver<TaskOutcome>,
    cancelled: Arc<AtomicBool>,
    running:   Arc<AtomicBool>,
    outcome:   Option<TaskOutcome>,
}

/// Resolve `path` on a worker thread. Cancellation is checked before the
/// mount lookup, before the usage query, and before the result is sent.
pub fn spawn(resolver: Arc<DiskUsageResolver>, path: impl Into<String>) -> ResolutionHandle {
    let (tx, rx) = mpsc::channel();
    let cancelled = Arc::new(AtomicBool::new(false));
    let running   = Arc::new(AtomicBool::new(true));
    let path      = path.into();

    let flag = cancelled.clone();
    let live = running.clone();
    std::thread::spawn(move || {
        let guard = RunningGuard(live);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| run(&resolver, &path, &flag)))
            .unwrap_or_else(|payload| {
                let msg = panic_message(payload.as_ref());
                log::error!("resolution of {} panicked: {}", path, msg);
                TaskOutcome::Failed(msg)
            });
        drop(guard);
        let _ = tx.send(outcome);
    });

    ResolutionHandle { rx, cancelled, running, outcome: None }
}

fn run(resolver: &DiskUsageResolver, path: &str, cancelled: &AtomicBool) -> TaskOutcome {
    if cancelled.load(Ordering::SeqCst) { return TaskOutcome::Cancelled; }
    let mount = resolver.resolve_mount_point(path);

    if cancelled.load(Ordering::SeqCst) { return TaskOutcome::Cancelled; }
    let usage = mount.entry().map(|e| resolver.query_usage(e));

    if cancelled.load(Ordering::SeqCst) { return TaskOutcome::Cancelled; }
    TaskOutcome::Completed(resolver.assemble(path, mount, usage))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

impl ResolutionHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Non-blocking poll.
    pub fn try_result(&mut self) -> Option<&TaskOutcome> {
        if self.outcome.is_none() {
            match self.rx.try_recv() {
                Ok(o) => self.outcome = Some(o),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => self.outcome = Some(TaskOutcome::Failed(WORKER_LOST.into())),
            }
        }
        self.outcome.as_ref()
    }

    /// Block until the worker finishes.
    pub fn wait(mut self) -> TaskOutcome {
        if let Some(o) = self.outcome.take() {
            return o;
        }
        self.rx.recv().unwrap_or_else(|_| TaskOutcome::Failed(WORKER_LOST.into()))
    }

    /// Block for at most `timeout`. `None` means the worker is still busy,
    /// e.g. on a hung storage device; the caller may `cancel` and move on.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<&TaskOutcome> {
        if self.outcome.is_none() {
            match self.rx.recv_timeout(timeout) {
                Ok(o) => self.outcome = Some(o),
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => self.outcome = Some(TaskOutcome::Failed(WORKER_LOST.into())),
            }
        }
        self.outcome.as_ref()
    }
}

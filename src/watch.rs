//! Periodic snapshot evaluation.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::ratelimit::{BucketObserver, PolicySet};
use crate::snapshot::{evaluate, Decision, Snapshot};

/// Re-evaluates a snapshot file on a fixed interval.
pub struct Watcher<O: BucketObserver> {
    /// Snapshot file to read on each tick
    snapshot_path: PathBuf,
    /// Rules to apply
    policy: PolicySet,
    /// Time between evaluations
    every: Duration,
    observer: O,
}

impl<O: BucketObserver> Watcher<O> {
    pub fn new(snapshot_path: impl Into<PathBuf>, policy: PolicySet, every: Duration, observer: O) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            policy,
            every,
            observer,
        }
    }

    /// Read and evaluate the snapshot once.
    ///
    /// Returns `None` when the snapshot cannot be loaded.
    pub fn tick(&self) -> Option<Decision> {
        match Snapshot::from_file(&self.snapshot_path) {
            Ok(snapshot) => {
                let decision = evaluate(&snapshot, &self.policy, &self.observer);
                if !decision.allowed {
                    warn!(
                        path = %self.snapshot_path.display(),
                        violations = ?decision.violations,
                        "Snapshot rejected"
                    );
                }
                Some(decision)
            }
            Err(e) => {
                error!(
                    path = %self.snapshot_path.display(),
                    error = %e,
                    "Failed to load snapshot, retrying on next tick"
                );
                None
            }
        }
    }

    /// Evaluate on every tick until `shutdown` resolves.
    ///
    /// Returns the number of ticks run.
    pub async fn run_until<F>(&self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            path = %self.snapshot_path.display(),
            interval_secs = self.every.as_secs(),
            "Watching snapshot"
        );

        let mut ticks = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.tick();
                    ticks += 1;
                }
            }
        }

        info!(ticks = ticks, "Snapshot watch stopped");
        ticks
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::NoopObserver;

    fn write_snapshot(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("ratecheck-{}-{}.json", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_tick_evaluates_snapshot() {
        let path = write_snapshot(
            "tick",
            r#"{"buckets": [{"labels": {"source": "192.168.192.14"}, "values": [9, 0, 0, 0, 0]}]}"#,
        );
        let watcher = Watcher::new(&path, PolicySet::default(), Duration::from_secs(1), NoopObserver);

        let decision = watcher.tick().unwrap();
        assert!(!decision.allowed);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_tick_missing_file() {
        let watcher = Watcher::new(
            "/nonexistent/ratecheck/snapshot.json",
            PolicySet::default(),
            Duration::from_secs(1),
            NoopObserver,
        );
        assert!(watcher.tick().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_stops_on_shutdown() {
        let path = write_snapshot("watch", r#"{"buckets": []}"#);
        let watcher = Watcher::new(&path, PolicySet::default(), Duration::from_secs(1), NoopObserver);

        let ticks = watcher
            .run_until(tokio::time::sleep(Duration::from_millis(2_500)))
            .await;
        // Ticks fire at 0s, 1s and 2s.
        assert_eq!(ticks, 3);
        std::fs::remove_file(path).unwrap();
    }
}

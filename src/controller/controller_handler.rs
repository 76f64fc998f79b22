use crate::configuration::config::Config;
use crate::error_handling::types::ControllerError;
use crate::network::SnapshotSource;
use crate::notification::Notifier;
use crate::session_tracker::{SessionTracker, TickSummary};
use crate::storage::Storage;
use crate::SessionStatus;
use chrono::Utc;
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;

/// The polling loop.
///
/// Samples the snapshot source once per tick, hands the result to the
/// session tracker and sleeps for the configured interval. Ticks never overlap.
pub struct Controller<P, S, N> {
    port: u16,
    interval: Duration,
    source: P,
    tracker: SessionTracker<S, N>,
}

impl<P: SnapshotSource, S: Storage, N: Notifier> Controller<P, S, N> {
    pub fn new(config: &Config, source: P, tracker: SessionTracker<S, N>) -> Self {
        Self {
            port: config.port,
            interval: config.interval,
            source,
            tracker,
        }
    }

    /// Runs until `shutdown` completes, then closes every open session.
    ///
    /// Rows left `active` by a previous process that did not exit cleanly are
    /// finalized before the first tick.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<(), ControllerError>
    where
        F: Future<Output = ()>,
    {
        let recovered = self
            .tracker
            .storage()
            .close_stale_sessions(Utc::now(), SessionStatus::TerminatedByShutdown)
            .await?;
        if recovered > 0 {
            warn!(
                "[!] Finalized {} session(s) left open by a previous run",
                recovered
            );
        }

        info!(
            "[+] Monitoring port {} every {}s, press Ctrl+C to stop",
            self.port,
            self.interval.as_secs()
        );

        tokio::pin!(shutdown);
        loop {
            self.tick().await;
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stop signal received, closing all open sessions");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        let closed = self.tracker.shutdown(Utc::now()).await;
        info!("[+] {} session(s) marked as terminated, monitoring stopped", closed);
        Ok(())
    }

    /// Runs one observation and reconciliation.
    ///
    /// Returns `None` when the snapshot could not be taken; open sessions are
    /// left untouched in that case.
    pub async fn tick(&mut self) -> Option<TickSummary> {
        match self.source.remote_addresses(self.port) {
            Ok(snapshot) => {
                let summary = self.tracker.reconcile(&snapshot, Utc::now()).await;
                if !summary.is_quiet() {
                    debug!(
                        "Tick: {} opened, {} closed, {} failed, {} open",
                        summary.opened,
                        summary.closed,
                        summary.failed,
                        self.tracker.active_session_count()
                    );
                }
                Some(summary)
            }
            Err(e) => {
                warn!("[!] Unable to read connection table, skipping tick: {}", e);
                None
            }
        }
    }

    pub fn tracker(&self) -> &SessionTracker<S, N> {
        &self.tracker
    }

    pub fn source(&self) -> &P {
        &self.source
    }
}

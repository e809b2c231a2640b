//! Background reconciliation loop.
//!
//! Per run: `Idle -> Scanning -> Persisting -> Notifying -> Idle`, repeated
//! until cancelled. Cycles never overlap; the loop awaits each one before
//! sleeping.

use super::signal::LatchHandle;
use super::{run_cycle, CycleReport};
use crate::clock::Clock;
use crate::notify::Notifier;
use crate::repo::todo_repo::TodoStore;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Sleep between the end of one cycle and the start of the next.
    pub interval: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RECONCILE_INTERVAL,
        }
    }
}

/// Cycle counts of one [`Reconciler::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub cycles: u64,
    /// Cycles that persisted at least one transition.
    pub changed_cycles: u64,
    /// Cycles whose scan failed or whose worker panicked.
    pub failed_cycles: u64,
}

/// Periodic status reconciler over a shared store.
pub struct Reconciler<S, N, C> {
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<C>,
    config: ReconcilerConfig,
}

impl<S, N, C> Reconciler<S, N, C>
where
    S: TodoStore + 'static,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, clock: Arc<C>, config: ReconcilerConfig) -> Self {
        Self {
            store,
            notifier,
            clock,
            config,
        }
    }

    /// Runs a single cycle on the calling thread.
    pub fn run_once(&self) -> CycleReport {
        run_cycle(
            self.store.as_ref(),
            self.notifier.as_ref(),
            self.clock.now(),
            &LatchHandle::detached(),
        )
    }

    /// Runs cycles until `cancel` fires.
    ///
    /// The first cycle starts only after `started` fires. Cancellation during
    /// the sleep exits without another scan.
    pub async fn run(&self, mut started: LatchHandle, mut cancel: LatchHandle) -> LoopSummary {
        info!(
            "event=reconciler_wait module=reconcile status=start interval_secs={}",
            self.config.interval.as_secs()
        );
        tokio::select! {
            biased;
            () = cancel.triggered() => {
                info!("event=reconciler_stop module=reconcile status=ok cycles=0");
                return LoopSummary::default();
            }
            () = started.triggered() => {}
        }

        let mut summary = LoopSummary::default();
        loop {
            if cancel.is_triggered() {
                break;
            }
            summary.cycles += 1;
            match self.cycle_off_thread(&cancel).await {
                Some(report) if report.read_failed => summary.failed_cycles += 1,
                Some(report) if report.changed > 0 => summary.changed_cycles += 1,
                Some(_) => {}
                None => summary.failed_cycles += 1,
            }

            tokio::select! {
                biased;
                () = cancel.triggered() => break,
                () = tokio::time::sleep(self.config.interval) => {}
            }
        }
        info!(
            "event=reconciler_stop module=reconcile status=ok cycles={} changed_cycles={} \
             failed_cycles={}",
            summary.cycles, summary.changed_cycles, summary.failed_cycles
        );
        summary
    }

    /// Spawns [`Reconciler::run`] onto the current runtime.
    pub fn spawn(
        self: Arc<Self>,
        started: LatchHandle,
        cancel: LatchHandle,
    ) -> JoinHandle<LoopSummary> {
        tokio::spawn(async move { self.run(started, cancel).await })
    }

    async fn cycle_off_thread(&self, cancel: &LatchHandle) -> Option<CycleReport> {
        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        let cancel = cancel.clone();
        let now = self.clock.now();

        match tokio::task::spawn_blocking(move || {
            run_cycle(store.as_ref(), notifier.as_ref(), now, &cancel)
        })
        .await
        {
            Ok(report) => Some(report),
            Err(err) => {
                // The next cycle still runs.
                error!("event=reconcile_cycle module=reconcile status=error error={err}");
                None
            }
        }
    }
}

//! Scheduler - daily trigger plus on-demand passes.
//!
//! One tokio task owns the schedule. Scheduled fires and manual triggers are
//! both handled inside that task, so passes started through one handle never
//! overlap: a manual trigger that arrives mid-pass waits in a bounded queue,
//! and is rejected with `TriggerError::Busy` once the queue is full.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::reconciler::RenewalReconciler;
use super::status::{PassReport, PassSummary, SchedulerStatus, TriggerSource};
use crate::domain::TriggerError;

/// Fire once a day at a local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySchedule {
    pub run_at: NaiveTime,
}

impl DailySchedule {
    pub fn new(run_at: NaiveTime) -> Self {
        Self { run_at }
    }

    /// First fire strictly after `now`.
    pub fn next_run_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let candidate = now.date().and_time(self.run_at);
        if candidate > now {
            candidate
        } else {
            candidate + TimeDelta::days(1)
        }
    }

    /// Wall-clock delay until the next fire. DST shifts are not accounted
    /// for; the fire lands up to an hour off on those two days.
    pub fn delay_from(&self, now: NaiveDateTime) -> Duration {
        (self.next_run_after(now) - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// `None` disables the timer; manual triggers still work.
    pub schedule: Option<DailySchedule>,
    pub trigger_queue: usize,
}

type TriggerRequest = oneshot::Sender<PassReport>;

/// Handle to a running scheduler.
/// - `trigger_now()` runs a pass on demand and waits for its report
/// - `shutdown_and_join()` stops the loop between passes
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    trigger_tx: mpsc::Sender<TriggerRequest>,
    status: Arc<RwLock<SchedulerStatus>>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn spawn(reconciler: Arc<RenewalReconciler>, settings: SchedulerSettings) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (trigger_tx, trigger_rx) = mpsc::channel(settings.trigger_queue.max(1));
        let status = Arc::new(RwLock::new(SchedulerStatus::default()));

        let join = tokio::spawn(scheduler_loop(
            reconciler,
            settings.schedule,
            Arc::clone(&status),
            shutdown_rx,
            trigger_rx,
        ));

        Self {
            shutdown_tx,
            trigger_tx,
            status,
            join,
        }
    }

    /// Run one pass now and return its report.
    pub async fn trigger_now(&self) -> Result<PassReport, TriggerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.trigger_tx.try_send(reply_tx).map_err(|err| match err {
            TrySendError::Full(_) => TriggerError::Busy,
            TrySendError::Closed(_) => TriggerError::Stopped,
        })?;
        reply_rx.await.map_err(|_| TriggerError::Stopped)
    }

    pub async fn status(&self) -> SchedulerStatus {
        self.status.read().await.clone()
    }

    /// Ask the loop to stop. An in-flight pass runs to completion first.
    pub fn request_shutdown(&self) {
        // receiver may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}

async fn scheduler_loop(
    reconciler: Arc<RenewalReconciler>,
    schedule: Option<DailySchedule>,
    status: Arc<RwLock<SchedulerStatus>>,
    mut shutdown_rx: watch::Receiver<bool>,
    mut trigger_rx: mpsc::Receiver<TriggerRequest>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let now = reconciler.clock().local_now();
        let next_run_at = schedule.map(|s| s.next_run_after(now));
        let delay = schedule.map(|s| s.delay_from(now));
        status.write().await.next_run_at = next_run_at;
        if let Some(at) = next_run_at {
            debug!(next_run_at = %at, "next scheduled renewal pass");
        }

        let timer = async move {
            match delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = timer => {
                run_pass(&reconciler, &status, TriggerSource::Scheduled).await;
            }
            request = trigger_rx.recv() => {
                let Some(reply_tx) = request else { break };
                let report = run_pass(&reconciler, &status, TriggerSource::Manual).await;
                // caller may have stopped waiting
                let _ = reply_tx.send(report);
            }
        }
    }
    info!("renewal scheduler stopped");
}

async fn run_pass(
    reconciler: &RenewalReconciler,
    status: &RwLock<SchedulerStatus>,
    source: TriggerSource,
) -> PassReport {
    info!(?source, "renewal pass triggered");
    status.write().await.running = true;

    let report = reconciler.run_reconciliation().await;

    let mut status = status.write().await;
    status.running = false;
    match source {
        TriggerSource::Scheduled => status.scheduled_runs += 1,
        TriggerSource::Manual => status.manual_runs += 1,
    }
    status.last_pass = Some(PassSummary::new(source, &report));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ReconcilerBuilder;
    use crate::domain::{LicenseType, Location, LocationId, StoreError};
    use crate::impls::{InMemoryLocationDirectory, InMemoryTaskStore, InMemoryUserDirectory};
    use crate::ports::{Clock, FixedClock, LocationDirectory};
    use async_trait::async_trait;
    use chrono::{Days, NaiveDate, TimeZone, Utc};
    use tokio::sync::Semaphore;
    use ulid::Ulid;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn nine() -> DailySchedule {
        DailySchedule::new(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
    }

    #[test]
    fn next_run_later_today() {
        assert_eq!(nine().next_run_after(at(8, 0, 0)), at(9, 0, 0));
    }

    #[test]
    fn next_run_tomorrow_when_time_has_passed() {
        let tomorrow_nine = at(9, 0, 0) + TimeDelta::days(1);
        assert_eq!(nine().next_run_after(at(9, 0, 0)), tomorrow_nine);
        assert_eq!(nine().next_run_after(at(23, 59, 59)), tomorrow_nine);
    }

    #[test]
    fn delay_is_wall_clock_difference() {
        assert_eq!(nine().delay_from(at(8, 59, 30)), Duration::from_secs(30));
    }

    fn reconciler_with(
        directory: Arc<dyn LocationDirectory>,
        tasks: InMemoryTaskStore,
        clock: FixedClock,
    ) -> Arc<RenewalReconciler> {
        Arc::new(
            ReconcilerBuilder::new()
                .locations(directory)
                .tasks(Arc::new(tasks))
                .users(Arc::new(InMemoryUserDirectory::new()))
                .clock(Arc::new(clock))
                .build()
                .unwrap(),
        )
    }

    fn expiring_location(today: NaiveDate) -> Location {
        let mut location = Location::new(LocationId::from_ulid(Ulid::new()), "Central");
        location.tobacco_license_expiry = Some(today + Days::new(10));
        location
    }

    fn manual_only() -> SchedulerSettings {
        SchedulerSettings {
            schedule: None,
            trigger_queue: 4,
        }
    }

    #[tokio::test]
    async fn manual_trigger_returns_report() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap());
        let tasks = InMemoryTaskStore::new();
        let directory =
            InMemoryLocationDirectory::with_locations([expiring_location(clock.today())]);
        let handle = SchedulerHandle::spawn(
            reconciler_with(Arc::new(directory), tasks.clone(), clock),
            manual_only(),
        );

        let first = handle.trigger_now().await.unwrap();
        let second = handle.trigger_now().await.unwrap();

        assert_eq!(first.tasks_created(), 1);
        assert_eq!(second.tasks_created(), 0);
        assert_eq!(tasks.all().await.len(), 1);

        let status = handle.status().await;
        assert_eq!(status.manual_runs, 2);
        assert_eq!(status.scheduled_runs, 0);
        assert_eq!(status.next_run_at, None);
        assert_eq!(status.last_pass.unwrap().already_active, 1);

        handle.shutdown_and_join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_pass_fires_at_run_at() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 8, 59, 59).unwrap());
        let tasks = InMemoryTaskStore::new();
        let directory =
            InMemoryLocationDirectory::with_locations([expiring_location(clock.today())]);
        let handle = SchedulerHandle::spawn(
            reconciler_with(Arc::new(directory), tasks.clone(), clock),
            SchedulerSettings {
                schedule: Some(nine()),
                trigger_queue: 4,
            },
        );

        tokio::time::sleep(Duration::from_millis(500)).await;
        let before = handle.status().await;
        assert_eq!(before.total_runs(), 0);
        assert_eq!(before.next_run_at, Some(at(9, 0, 0)));

        tokio::time::sleep(Duration::from_millis(1000)).await;
        let after = handle.status().await;
        assert_eq!(after.scheduled_runs, 1);
        assert_eq!(
            after.last_pass.map(|p| p.source),
            Some(TriggerSource::Scheduled)
        );
        assert_eq!(tasks.all().await.len(), 1);

        handle.shutdown_and_join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_schedule_never_fires() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 8, 59, 59).unwrap());
        let handle = SchedulerHandle::spawn(
            reconciler_with(
                Arc::new(InMemoryLocationDirectory::new()),
                InMemoryTaskStore::new(),
                clock,
            ),
            manual_only(),
        );

        tokio::time::sleep(Duration::from_secs(3 * 24 * 3600)).await;
        assert_eq!(handle.status().await.total_runs(), 0);

        handle.shutdown_and_join().await;
    }

    #[tokio::test]
    async fn trigger_after_shutdown_is_rejected() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap());
        let handle = SchedulerHandle::spawn(
            reconciler_with(
                Arc::new(InMemoryLocationDirectory::new()),
                InMemoryTaskStore::new(),
                clock,
            ),
            manual_only(),
        );

        handle.request_shutdown();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(handle.trigger_now().await.unwrap_err(), TriggerError::Stopped);
    }

    /// Directory that blocks every query until permits are released.
    struct GatedDirectory {
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl LocationDirectory for GatedDirectory {
        async fn find_active_with_expiry_at_or_before(
            &self,
            _license_type: LicenseType,
            _date: NaiveDate,
        ) -> Result<Vec<Location>, StoreError> {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| StoreError::Other(e.to_string()))?;
            permit.forget();
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_trigger_queue_is_busy() {
        let gate = Arc::new(Semaphore::new(0));
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap());
        let handle = Arc::new(SchedulerHandle::spawn(
            reconciler_with(
                Arc::new(GatedDirectory { gate: Arc::clone(&gate) }),
                InMemoryTaskStore::new(),
                clock,
            ),
            SchedulerSettings {
                schedule: None,
                trigger_queue: 1,
            },
        ));

        // first pass is dequeued and blocks on the gate
        let running = tokio::spawn({
            let handle = Arc::clone(&handle);
            async move { handle.trigger_now().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handle.status().await.running);

        // second waits in the queue
        let queued = tokio::spawn({
            let handle = Arc::clone(&handle);
            async move { handle.trigger_now().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(handle.trigger_now().await.unwrap_err(), TriggerError::Busy);

        gate.add_permits(16);
        assert!(running.await.unwrap().is_ok());
        assert!(queued.await.unwrap().is_ok());
        assert_eq!(handle.status().await.manual_runs, 2);
    }
}

//! Background scheduler for the periodic batch runs.
//!
//! One thread owns four jobs (vital scan, rosters, outbreak sweep, workflow
//! transitions), each on its own interval. Every job is due immediately at
//! start. The thread sleeps in short ticks so `shutdown()` is honoured
//! promptly; a job that is already running finishes first. An interval of
//! zero disables that job.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::SchedulerConfig;
use crate::orchestrator::{local_now, Orchestrator};

/// Sleep granularity for shutdown responsiveness.
const SLEEP_GRANULARITY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    VitalScan,
    Rosters,
    OutbreakSweep,
    Workflows,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VitalScan => "vital_scan",
            Self::Rosters => "rosters",
            Self::OutbreakSweep => "outbreak_sweep",
            Self::Workflows => "workflows",
        }
    }
}

struct ScheduledJob {
    kind: JobKind,
    interval: Duration,
    last_run: Option<Instant>,
}

fn jobs_from_config(config: &SchedulerConfig) -> Vec<ScheduledJob> {
    [
        (JobKind::VitalScan, config.vital_scan_interval_secs),
        (JobKind::Rosters, config.roster_interval_secs),
        (JobKind::OutbreakSweep, config.outbreak_sweep_interval_secs),
        (JobKind::Workflows, config.workflow_interval_secs),
    ]
    .into_iter()
    .filter(|(_, secs)| *secs > 0)
    .map(|(kind, secs)| ScheduledJob {
        kind,
        interval: Duration::from_secs(secs),
        last_run: None,
    })
    .collect()
}

/// Never-run jobs are due; otherwise due once `interval` has elapsed.
pub fn is_due(last_run: Option<Instant>, interval: Duration, now: Instant) -> bool {
    match last_run {
        None => true,
        Some(last) => now.saturating_duration_since(last) >= interval,
    }
}

/// Handle for the scheduler thread. Dropping it stops and joins the thread.
pub struct SchedulerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Request shutdown. A job in progress completes; no new job starts.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

pub fn start_scheduler(orchestrator: Arc<Orchestrator>) -> SchedulerHandle {
    start_scheduler_with_tick(orchestrator, SLEEP_GRANULARITY)
}

/// Start the scheduler with a custom sleep tick.
pub fn start_scheduler_with_tick(orchestrator: Arc<Orchestrator>, tick: Duration) -> SchedulerHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    let mut jobs = jobs_from_config(&orchestrator.config().scheduler);

    let handle = std::thread::spawn(move || {
        tracing::info!(jobs = jobs.len(), "Batch scheduler started");
        scheduler_loop(&orchestrator, &mut jobs, tick, &flag);
    });

    SchedulerHandle {
        shutdown,
        handle: Some(handle),
    }
}

fn scheduler_loop(
    orchestrator: &Orchestrator,
    jobs: &mut [ScheduledJob],
    tick: Duration,
    shutdown: &AtomicBool,
) {
    while !shutdown.load(Ordering::Relaxed) {
        for job in jobs.iter_mut() {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            let now = Instant::now();
            if is_due(job.last_run, job.interval, now) {
                run_job(orchestrator, job.kind);
                job.last_run = Some(now);
            }
        }
        std::thread::sleep(tick);
    }
    tracing::info!("Batch scheduler shutting down");
}

fn run_job(orchestrator: &Orchestrator, kind: JobKind) {
    let started = Instant::now();
    let now = local_now();
    let result = match kind {
        JobKind::VitalScan => orchestrator.scan_all_vitals_at(&now).map(|_| ()),
        JobKind::Rosters => orchestrator.run_all_rosters_at(&now).map(|_| ()),
        JobKind::OutbreakSweep => orchestrator.outbreak_sweep_at(&now).map(|_| ()),
        JobKind::Workflows => orchestrator.run_followup_workflows_at(&now).map(|_| ()),
    };
    match result {
        Ok(()) => tracing::debug!(
            job = kind.as_str(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scheduled job finished"
        ),
        Err(e) => tracing::warn!(job = kind.as_str(), error = %e, "Scheduled job failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockInference, NoDifferential, RemedyReference};
    use crate::config::EngineConfig;
    use crate::db::repository::fixtures::add_patient;
    use crate::db::{get_open_alerts, insert_reading, ClinicalStore};
    use crate::models::VitalKind;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn due_rules() {
        let now = Instant::now();
        let hour = Duration::from_secs(3600);
        assert!(is_due(None, hour, now));
        assert!(!is_due(Some(now), hour, now));
        assert!(is_due(Some(now), Duration::ZERO, now));
    }

    #[test]
    fn zero_interval_disables_job() {
        let config = SchedulerConfig {
            roster_interval_secs: 0,
            ..SchedulerConfig::default()
        };
        let kinds: Vec<JobKind> = jobs_from_config(&config).iter().map(|j| j.kind).collect();
        assert_eq!(
            kinds,
            vec![JobKind::VitalScan, JobKind::OutbreakSweep, JobKind::Workflows]
        );
    }

    #[test]
    fn runs_jobs_and_stops_on_drop() {
        let store = Arc::new(ClinicalStore::open_in_memory().unwrap());
        let patient = {
            let conn = store.conn().unwrap();
            let p = add_patient(&conn, "Sita", "Udane", "w1");
            let now = local_now();
            insert_reading(&conn, p, VitalKind::BloodSugar, 150.0, None, &(now - ChronoDuration::days(2)))
                .unwrap();
            insert_reading(&conn, p, VitalKind::BloodSugar, 260.0, None, &(now - ChronoDuration::hours(1)))
                .unwrap();
            p
        };
        let orchestrator = Arc::new(Orchestrator::new(
            store.clone(),
            Box::new(MockInference::failing("down")),
            Box::new(NoDifferential),
            RemedyReference::bundled().unwrap(),
            EngineConfig::default(),
        ));

        let handle = start_scheduler_with_tick(orchestrator, Duration::from_millis(10));
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut alerted = false;
        while Instant::now() < deadline {
            if !get_open_alerts(&store.conn().unwrap(), patient).unwrap().is_empty() {
                alerted = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(alerted);

        handle.shutdown();
        drop(handle);
    }
}

//! Composition root.
//!
//! [`Orchestrator`] owns the store handle, both external adapters, the
//! reference text and the engine configuration. It is the only place that
//! sequences the components: a triage submission runs classification, trend
//! alerts, follow-up scheduling, urgency and outbreak detection; batch runs
//! drive vital scans, workflow transitions, rosters and the hotspot sweep.
//!
//! Adapter calls happen with the store unlocked. Every write of a single
//! submission commits in one transaction.

use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapters::{
    ChatCompletionsClient, DiagnosticInference, DifferentialDiagnosis, InferenceError,
    Locale, NoDifferential, RemedyReference,
};
use crate::config::{ConfigError, EngineConfig};
use crate::db::{
    acknowledge_alerts, close_active_workflows, get_patient, get_patients_with_readings_since,
    insert_followup, insert_triage_report, insert_workflow, list_worker_ids, ClinicalStore,
    DatabaseError,
};
use crate::followup::{
    asha_task, followup_horizon_days, initial_state, run_workflow_scan, AshaTask,
    WorkflowScanSummary, ACTION_AMBULANCE,
};
use crate::models::{
    Hotspot, NewFollowUp, NewTriageReport, Severity, VitalKind, WorkflowState, WorkflowStatus,
};
use crate::monitoring::{scan_trend, AlertManager, OutbreakAlert, OutbreakDetector, TrendResult};
use crate::priority::{build_roster, collect_inputs, score_urgency, DailyRoster, UrgencyScore};
use crate::triage::{RiskAssessment, RiskClassifier, TriageInput};

const TRACKED_VITALS: [VitalKind; 2] = [VitalKind::BloodPressure, VitalKind::BloodSugar];
const FOLLOWUP_CREATED_BY: &str = "triage_orchestrator";

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Patient not found: {0}")]
    PatientNotFound(i64),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Inference adapter setup failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Everything produced by one triage submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageOutcome {
    pub report_id: i64,
    pub patient_id: i64,
    pub assessment: RiskAssessment,
    pub asha_task: AshaTask,
    pub trends: Vec<TrendResult>,
    /// Trend alerts actually created (suppressed ones are not listed).
    pub trend_alerts: Vec<i64>,
    pub triage_alert: Option<i64>,
    pub followup_id: i64,
    pub followup_date: NaiveDate,
    pub followup_days: i64,
    pub workflow_id: i64,
    pub workflow_state: WorkflowState,
    pub urgency: UrgencyScore,
    pub outbreak: Option<OutbreakAlert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SosOutcome {
    pub workflow_id: i64,
    /// None when an SOS alert is already open inside the dedup window.
    pub alert_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalScanSummary {
    pub patients_scanned: u32,
    pub alerts_created: u32,
    pub failed: Vec<(i64, String)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterRunSummary {
    pub rosters: Vec<DailyRoster>,
    /// (worker id, error) for rosters that could not be built.
    pub failed: Vec<(String, String)>,
}

pub struct Orchestrator {
    store: Arc<ClinicalStore>,
    inference: Box<dyn DiagnosticInference>,
    differential: Box<dyn DifferentialDiagnosis>,
    remedies: RemedyReference,
    config: EngineConfig,
}

impl Orchestrator {
    pub fn new(
        store: Arc<ClinicalStore>,
        inference: Box<dyn DiagnosticInference>,
        differential: Box<dyn DifferentialDiagnosis>,
        remedies: RemedyReference,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            inference,
            differential,
            remedies,
            config,
        }
    }

    /// Production wiring: chat-completions inference from `config.inference`,
    /// no local differential model, remedies from `remedies_path` or the
    /// bundled copy.
    pub fn from_config(
        store: Arc<ClinicalStore>,
        config: EngineConfig,
        remedies_path: &Path,
    ) -> Result<Self, OrchestratorError> {
        let inference = ChatCompletionsClient::from_config(&config.inference)?;
        let remedies = RemedyReference::load_or_bundled(remedies_path)?;
        Ok(Self::new(
            store,
            Box::new(inference),
            Box::new(NoDifferential),
            remedies,
            config,
        ))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &ClinicalStore {
        &self.store
    }

    fn classifier(&self) -> RiskClassifier<'_> {
        RiskClassifier::new(
            self.inference.as_ref(),
            self.differential.as_ref(),
            &self.remedies,
            &self.config.vitals,
        )
        .with_differential_top_n(self.config.inference.differential_top_n)
        .with_locale(Locale::from_code(&self.config.locale))
    }

    pub fn submit_triage(&self, input: &TriageInput) -> Result<TriageOutcome, OrchestratorError> {
        self.submit_triage_at(input, &local_now())
    }

    /// Run one triage submission end to end as of `now`.
    pub fn submit_triage_at(
        &self,
        input: &TriageInput,
        now: &NaiveDateTime,
    ) -> Result<TriageOutcome, OrchestratorError> {
        {
            let conn = self.store.conn()?;
            if get_patient(&conn, input.patient_id)?.is_none() {
                return Err(OrchestratorError::PatientNotFound(input.patient_id));
            }
        }

        let assessment = self.classifier().classify(&self.store, input)?;
        let task = asha_task(assessment.decision);
        let followup_days =
            followup_horizon_days(assessment.risk, assessment.decision, &self.config.followup);
        let followup_date = now.date() + Duration::days(followup_days);
        let result_json = serde_json::to_string(&assessment)?;

        let alerts = AlertManager::new(&self.config.alerts);
        let outbreaks = OutbreakDetector::new(&self.config.outbreak);

        let conn = self.store.conn()?;
        let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;

        let patient = get_patient(&tx, input.patient_id)?
            .ok_or(OrchestratorError::PatientNotFound(input.patient_id))?;

        let notes = Some(input.notes.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        let report_id = insert_triage_report(
            &tx,
            &NewTriageReport {
                patient_id: patient.id,
                chief_complaint: input.chief_complaint.clone(),
                symptoms: input.symptoms.clone(),
                notes,
                risk: assessment.risk,
                decision: assessment.decision,
                result_json,
            },
            now,
        )?;

        let mut trends = Vec::with_capacity(TRACKED_VITALS.len());
        let mut trend_alerts = Vec::new();
        for kind in TRACKED_VITALS {
            let trend = scan_trend(&tx, patient.id, kind, &self.config.trend, now)?;
            if let Some(id) = alerts.raise_trend(&tx, patient.id, &trend, now)? {
                trend_alerts.push(id);
            }
            trends.push(trend);
        }

        let triage_alert = alerts.raise_triage(
            &tx,
            patient.id,
            assessment.risk,
            &assessment.primary_diagnosis,
            now,
        )?;

        let followup_id = insert_followup(
            &tx,
            &NewFollowUp {
                patient_id: patient.id,
                scheduled_date: followup_date,
                visit_type: assessment.decision.as_str().to_string(),
                priority: task.priority,
                created_by: FOLLOWUP_CREATED_BY.to_string(),
                notes: Some(task.task.clone()),
            },
            now,
        )?;

        let (workflow_state, next_action) = initial_state(assessment.decision);
        close_active_workflows(&tx, patient.id, now)?;
        let workflow_id = insert_workflow(
            &tx,
            patient.id,
            workflow_state,
            next_action,
            WorkflowStatus::Active,
            now,
        )?;

        let urgency = score_urgency(
            &collect_inputs(&tx, patient.id, now)?,
            &self.config.urgency,
            &self.config.vitals,
        );

        let district = if patient.district.trim().is_empty() {
            self.config.default_district.as_str()
        } else {
            patient.district.as_str()
        };
        let outbreak = outbreaks.evaluate(
            &tx,
            patient.village.as_deref(),
            district,
            assessment.decision,
            Some(report_id),
            now,
        )?;

        tx.commit().map_err(DatabaseError::from)?;

        tracing::info!(
            patient_id = patient.id,
            report_id,
            risk = assessment.risk.as_str(),
            decision = assessment.decision.as_str(),
            followup_days,
            urgency = urgency.score,
            outbreak = outbreak.is_some(),
            "Triage submission processed"
        );

        Ok(TriageOutcome {
            report_id,
            patient_id: patient.id,
            assessment,
            asha_task: task,
            trends,
            trend_alerts,
            triage_alert,
            followup_id,
            followup_date,
            followup_days,
            workflow_id,
            workflow_state,
            urgency,
            outbreak,
        })
    }

    pub fn trigger_sos(&self, patient_id: i64) -> Result<SosOutcome, OrchestratorError> {
        self.trigger_sos_at(patient_id, &local_now())
    }

    /// Manual emergency override: a locked EMERGENCY episode plus an SOS alert.
    pub fn trigger_sos_at(
        &self,
        patient_id: i64,
        now: &NaiveDateTime,
    ) -> Result<SosOutcome, OrchestratorError> {
        let conn = self.store.conn()?;
        if get_patient(&conn, patient_id)?.is_none() {
            return Err(OrchestratorError::PatientNotFound(patient_id));
        }
        let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;
        close_active_workflows(&tx, patient_id, now)?;
        let workflow_id = insert_workflow(
            &tx,
            patient_id,
            WorkflowState::Emergency,
            ACTION_AMBULANCE,
            WorkflowStatus::Locked,
            now,
        )?;
        let alert_id = AlertManager::new(&self.config.alerts).raise_sos(&tx, patient_id, now)?;
        tx.commit().map_err(DatabaseError::from)?;

        tracing::warn!(patient_id, workflow_id, "SOS triggered");
        Ok(SosOutcome {
            workflow_id,
            alert_id,
        })
    }

    /// Acknowledge a patient's open alerts (one severity, or all when `None`).
    pub fn acknowledge_alerts(
        &self,
        patient_id: i64,
        severity: Option<Severity>,
        actor: &str,
    ) -> Result<usize, OrchestratorError> {
        let now = local_now();
        let conn = self.store.conn()?;
        let count = acknowledge_alerts(&conn, patient_id, severity, actor, &now)?;
        tracing::info!(patient_id, count, actor, "Alerts acknowledged");
        Ok(count)
    }

    pub fn run_daily_roster(&self, worker_id: &str) -> Result<DailyRoster, OrchestratorError> {
        self.run_daily_roster_at(worker_id, &local_now())
    }

    /// Rank a worker's patients, then re-scan vitals for the most urgent few.
    pub fn run_daily_roster_at(
        &self,
        worker_id: &str,
        now: &NaiveDateTime,
    ) -> Result<DailyRoster, OrchestratorError> {
        let roster = {
            let conn = self.store.conn()?;
            build_roster(
                &conn,
                worker_id,
                &self.config.urgency,
                &self.config.vitals,
                &self.config.roster,
                now,
            )?
        };

        for entry in roster.patients.iter().take(self.config.roster.trend_scan_top_n) {
            if let Err(e) = self.scan_patient_vitals(entry.patient_id, now) {
                tracing::warn!(
                    patient_id = entry.patient_id,
                    error = %e,
                    "Roster trend scan failed, continuing"
                );
            }
        }
        Ok(roster)
    }

    /// Trend scan of both vitals for one patient. Returns alerts created.
    fn scan_patient_vitals(&self, patient_id: i64, now: &NaiveDateTime) -> Result<u32, DatabaseError> {
        let alerts = AlertManager::new(&self.config.alerts);
        let conn = self.store.conn()?;
        let mut created = 0;
        for kind in TRACKED_VITALS {
            let trend = scan_trend(&conn, patient_id, kind, &self.config.trend, now)?;
            if alerts.raise_trend(&conn, patient_id, &trend, now)?.is_some() {
                created += 1;
            }
        }
        Ok(created)
    }

    /// Trend scan of every patient with readings in the lookback window.
    pub fn scan_all_vitals_at(
        &self,
        now: &NaiveDateTime,
    ) -> Result<VitalScanSummary, OrchestratorError> {
        let since = *now - Duration::days(self.config.trend.lookback_days);
        let patients = {
            let conn = self.store.conn()?;
            get_patients_with_readings_since(&conn, &since)?
        };

        let mut summary = VitalScanSummary::default();
        for patient_id in patients {
            summary.patients_scanned += 1;
            match self.scan_patient_vitals(patient_id, now) {
                Ok(created) => summary.alerts_created += created,
                Err(e) => {
                    tracing::warn!(patient_id, error = %e, "Vital scan failed, continuing");
                    summary.failed.push((patient_id, e.to_string()));
                }
            }
        }
        tracing::info!(
            scanned = summary.patients_scanned,
            alerts = summary.alerts_created,
            failed = summary.failed.len(),
            "Vital scan complete"
        );
        Ok(summary)
    }

    pub fn run_followup_workflows_at(
        &self,
        now: &NaiveDateTime,
    ) -> Result<WorkflowScanSummary, OrchestratorError> {
        Ok(run_workflow_scan(&self.store, &self.config.followup, now)?)
    }

    /// Report villages above the outbreak threshold. Advisories themselves
    /// are only raised per submission.
    pub fn outbreak_sweep_at(&self, now: &NaiveDateTime) -> Result<Vec<Hotspot>, OrchestratorError> {
        let hotspots = {
            let conn = self.store.conn()?;
            OutbreakDetector::new(&self.config.outbreak).hotspots(&conn, now)?
        };
        for spot in &hotspots {
            tracing::warn!(
                village = %spot.village,
                district = %spot.district,
                cases = spot.case_count,
                "High-risk hotspot"
            );
        }
        tracing::info!(hotspots = hotspots.len(), "Outbreak sweep complete");
        Ok(hotspots)
    }

    pub fn run_all_rosters_at(
        &self,
        now: &NaiveDateTime,
    ) -> Result<RosterRunSummary, OrchestratorError> {
        let workers = {
            let conn = self.store.conn()?;
            list_worker_ids(&conn)?
        };

        let mut summary = RosterRunSummary::default();
        for worker in workers {
            match self.run_daily_roster_at(&worker, now) {
                Ok(roster) => summary.rosters.push(roster),
                Err(e) => {
                    tracing::warn!(worker_id = %worker, error = %e, "Roster failed, continuing");
                    summary.failed.push((worker, e.to_string()));
                }
            }
        }
        Ok(summary)
    }
}

pub(crate) fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

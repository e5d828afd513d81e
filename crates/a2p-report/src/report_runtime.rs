use a2p_twilio::RecordFetcher;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::activity::{augment_home_country_numbers, ActivityOptions};
use crate::findings::{classify_findings, Findings};
use crate::progress::{ProgressTracker, ProgressUpdate, DASHBOARD_PROGRESS_STEPS};
use crate::reconciliation::{
    gather_service_snapshots, reconcile_numbers, NumberTable, ReconcileStats,
    ReconciledNumberRow, MESSAGING_SERVICE_ATTRIBUTES, PHONE_NUMBER_ATTRIBUTES,
};
use crate::render::ReportLine;
use crate::tabular::{normalize_records, RecordTable};
use crate::ReportError;

const STEP_GATHER_SERVICES: &str = "Gathering Messaging Services...";
const STEP_GATHER_NUMBERS: &str = "Gathering all phone numbers";
const STEP_SAMPLE_ACTIVITY: &str = "Collecting stats on US Numbers...";
const STEP_CHECK_UNSERVICED: &str = "Checking for active US numbers not in messaging services...";
const STEP_CHECK_UNREGISTERED: &str =
    "Checking for Messaging Services that are unregistered with US numbers";

/// Receives progress while a dashboard is collected and report lines once it
/// is rendered.
pub trait ReportSink {
    fn progress(&mut self, update: &ProgressUpdate);
    fn emit(&mut self, line: &ReportLine);

    fn emit_all(&mut self, lines: &[ReportLine]) {
        for line in lines {
            self.emit(line);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardOptions {
    pub activity: ActivityOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub account_sid: String,
    pub generated_at: DateTime<Utc>,
    pub messaging_services: RecordTable,
    pub reconcile_stats: ReconcileStats,
    /// Augmented home-country rows in recency order.
    pub us_numbers: Vec<ReconciledNumberRow>,
    pub findings: Findings,
}

/// Runs the full pipeline: gather, reconcile, sample, classify.
///
/// Every remote failure aborts the run; no partial report is returned.
pub fn collect_dashboard(
    fetcher: &dyn RecordFetcher,
    account_sid: &str,
    options: &DashboardOptions,
    sink: &mut dyn ReportSink,
) -> Result<DashboardReport, ReportError> {
    let mut tracker = ProgressTracker::new(DASHBOARD_PROGRESS_STEPS);

    sink.progress(&tracker.advance(STEP_GATHER_SERVICES));
    let services = fetcher.list_messaging_services()?;
    let messaging_services = normalize_records(&services, &MESSAGING_SERVICE_ATTRIBUTES, "sid")?;
    info!(services = services.len(), "gathered messaging services");

    sink.progress(&tracker.advance(STEP_GATHER_NUMBERS));
    let numbers = fetcher.list_phone_numbers()?;
    let number_records = normalize_records(&numbers, &PHONE_NUMBER_ATTRIBUTES, "sid")?;
    let mut table = NumberTable::from_record_table(&number_records)?;
    let snapshots = gather_service_snapshots(fetcher, &services)?;
    let reconcile_stats = reconcile_numbers(&mut table, &snapshots);
    info!(
        numbers = table.len(),
        member_rows = reconcile_stats.member_rows,
        campaign_rows = reconcile_stats.campaign_rows,
        unmatched_members = reconcile_stats.unmatched_members,
        "reconciled phone numbers"
    );

    sink.progress(&tracker.advance(STEP_SAMPLE_ACTIVITY));
    let us_numbers = augment_home_country_numbers(&table, fetcher, &options.activity)?;

    sink.progress(&tracker.advance(STEP_CHECK_UNSERVICED));
    let findings = classify_findings(&us_numbers);

    sink.progress(&tracker.advance(STEP_CHECK_UNREGISTERED));
    info!(
        us_numbers = us_numbers.len(),
        unserviced = findings.unserviced.len(),
        unregistered = findings.unregistered.len(),
        unregistered_services = findings.unregistered_service_count(),
        "classified dashboard findings"
    );

    Ok(DashboardReport {
        account_sid: account_sid.to_string(),
        generated_at: Utc::now(),
        messaging_services,
        reconcile_stats,
        us_numbers,
        findings,
    })
}

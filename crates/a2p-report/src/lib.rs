//! Reconciliation, classification, and rendering for the A2P 10DLC dashboard.
//!
//! Joins account phone numbers with messaging-service membership and A2P
//! campaign state, samples recent outbound activity for US numbers, and
//! renders the findings operators need to act on.

pub mod activity;
pub mod findings;
pub mod progress;
pub mod reconciliation;
pub mod render;
pub mod report_runtime;
pub mod tabular;

pub use activity::{
    augment_home_country_numbers, sort_by_recent_activity, ActivityOptions,
    MessageActivitySample, DEFAULT_MESSAGE_SAMPLE_LIMIT, HOME_COUNTRY_PREFIX,
};
pub use findings::{classify_findings, Findings};
pub use progress::{ProgressTracker, ProgressUpdate, DASHBOARD_PROGRESS_STEPS};
pub use reconciliation::{
    gather_service_snapshots, reconcile_numbers, NumberTable, ReconcileStats,
    ReconciledNumberRow, ServiceSnapshot,
};
pub use render::{link_for_sid, render_dashboard_lines, ReportLine};
pub use report_runtime::{collect_dashboard, DashboardOptions, DashboardReport, ReportSink};
pub use tabular::{normalize_records, CellValue, RecordTable, TabularRecord};

use a2p_twilio::TwilioError;
use thiserror::Error;

#[derive(Debug, Error)]
/// Enumerates failures that abort a dashboard run.
pub enum ReportError {
    #[error("To get started, please provide your Twilio credentials")]
    CredentialsMissing,
    #[error("{record_kind} record is missing attribute '{attribute}'")]
    AttributeMissing {
        record_kind: &'static str,
        attribute: String,
    },
    #[error("remote call failed: {0}")]
    RemoteCallFailure(#[from] TwilioError),
}

//! Report line rendering for dashboard findings.
//!
//! Unregistered findings are grouped by messaging-service friendly name with
//! a single line of lookback: a header is emitted whenever the name differs
//! from the previous row's, so non-contiguous rows of the same service repeat
//! their header.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::reconciliation::ReconciledNumberRow;
use crate::report_runtime::DashboardReport;
use crate::tabular::render_aligned;

pub const DASHBOARD_TITLE: &str = "A2P 10DLC Dashboard";
const PHONE_NUMBER_SID_PREFIX: &str = "PN";
const MESSAGING_SERVICE_SID_PREFIX: &str = "MG";
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum ReportLine {
    Title(String),
    Text(String),
    Warning(String),
    GroupHeader(String),
    Item(String),
    Debug(String),
}

impl ReportLine {
    pub fn text(&self) -> &str {
        match self {
            Self::Title(text)
            | Self::Text(text)
            | Self::Warning(text)
            | Self::GroupHeader(text)
            | Self::Item(text)
            | Self::Debug(text) => text.as_str(),
        }
    }

    pub fn to_markdown(&self) -> String {
        match self {
            Self::Title(text) => format!("# {text}"),
            Self::Warning(text) => format!("> **Warning:** {text}"),
            Self::GroupHeader(text) => format!("\n{text}"),
            Self::Debug(text) => format!("    {text}"),
            Self::Text(text) | Self::Item(text) => text.clone(),
        }
    }
}

/// Console deep link for an account resource sid, when the prefix is known.
pub fn link_for_sid(sid: &str) -> Option<String> {
    if sid.starts_with(PHONE_NUMBER_SID_PREFIX) {
        return Some(format!(
            "https://console.twilio.com/us1/develop/phone-numbers/manage/incoming/{sid}/configure"
        ));
    }
    if sid.starts_with(MESSAGING_SERVICE_SID_PREFIX) {
        return Some(format!(
            "https://console.twilio.com/us1/service/sms/{sid}/sms-senders"
        ));
    }
    None
}

fn markdown_link(label: &str, sid: &str) -> String {
    match link_for_sid(sid) {
        Some(link) => format!("[{label}]({link})"),
        None => label.to_string(),
    }
}

/// Whole days between `last` and `now`, floored.
pub fn days_since(last: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(last)
        .num_seconds()
        .div_euclid(SECONDS_PER_DAY)
}

pub fn active_number_line(row: &ReconciledNumberRow, now: DateTime<Utc>) -> String {
    let label = markdown_link(
        &format!("{}: {}", row.friendly_name, row.phone_number),
        &row.sid,
    );
    let recency = match row.last_message_sent_date {
        Some(last) => format!("last sent {} days ago", days_since(last, now)),
        None => "no recent sends".to_string(),
    };
    format!(
        "{label} ({} total outbound messages, {recency})",
        row.message_count
    )
}

pub fn render_unserviced(rows: &[ReconciledNumberRow], now: DateTime<Utc>) -> Vec<ReportLine> {
    if rows.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![ReportLine::Warning(format!(
        "You have {} **active** US phone numbers not currently in a Messaging Service",
        rows.len()
    ))];
    lines.extend(
        rows.iter()
            .map(|row| ReportLine::Item(active_number_line(row, now))),
    );
    lines
}

pub fn render_unregistered(
    rows: &[ReconciledNumberRow],
    service_count: usize,
    now: DateTime<Utc>,
) -> Vec<ReportLine> {
    if rows.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![ReportLine::Warning(format!(
        "You have {service_count} unregistered for A2P 10DLC Messaging Services with active US numbers"
    ))];
    // Outer `None` means no row emitted yet; inner is the previous row's name.
    let mut previous_group: Option<Option<&str>> = None;
    for row in rows {
        let group = row.messaging_service_friendly_name.as_deref();
        if previous_group != Some(group) {
            let name = group.unwrap_or("(unnamed messaging service)");
            let header = match row.messaging_service_sid.as_deref() {
                Some(service_sid) => markdown_link(&format!("**{name}**"), service_sid),
                None => format!("**{name}**"),
            };
            lines.push(ReportLine::GroupHeader(header));
            previous_group = Some(group);
        }
        lines.push(ReportLine::Item(format!(
            "- {}",
            active_number_line(row, now)
        )));
    }
    lines
}

const DEBUG_COLUMNS: [&str; 12] = [
    "sid",
    "phone_number",
    "friendly_name",
    "messaging_service_sid",
    "messaging_service_friendly_name",
    "messaging_service_usecase",
    "us_a2p_registered",
    "campaign_status",
    "us_app_to_person_usecase",
    "brand_registration_sid",
    "message_count",
    "last_message_sent_date",
];

fn optional_cell(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

/// Raw view of the augmented table, one aligned text line per row.
pub fn render_debug_table(rows: &[ReconciledNumberRow]) -> Vec<ReportLine> {
    let header = DEBUG_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .collect::<Vec<_>>();
    let body = rows
        .iter()
        .map(|row| {
            vec![
                row.sid.clone(),
                row.phone_number.clone(),
                row.friendly_name.clone(),
                optional_cell(row.messaging_service_sid.as_deref()),
                optional_cell(row.messaging_service_friendly_name.as_deref()),
                optional_cell(row.messaging_service_usecase.as_deref()),
                row.us_a2p_registered.to_string(),
                optional_cell(row.campaign_status.as_deref()),
                optional_cell(row.us_app_to_person_usecase.as_deref()),
                optional_cell(row.brand_registration_sid.as_deref()),
                row.message_count.to_string(),
                row.last_message_sent_date
                    .map(|value| value.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect::<Vec<_>>();
    render_aligned(&header, &body)
        .into_iter()
        .map(ReportLine::Debug)
        .collect()
}

pub fn render_dashboard_lines(report: &DashboardReport, include_debug: bool) -> Vec<ReportLine> {
    let now = report.generated_at;
    let mut lines = vec![
        ReportLine::Title(DASHBOARD_TITLE.to_string()),
        ReportLine::Text(format!("**Account SID** : `{}`", report.account_sid)),
    ];
    lines.extend(render_unserviced(&report.findings.unserviced, now));
    lines.extend(render_unregistered(
        &report.findings.unregistered,
        report.findings.unregistered_service_count(),
        now,
    ));
    if report.findings.is_empty() {
        lines.push(ReportLine::Text(
            "No active US numbers need A2P 10DLC attention.".to_string(),
        ));
    }
    if include_debug {
        lines.push(ReportLine::Text("## For debugging only".to_string()));
        lines.extend(render_debug_table(&report.us_numbers));
        if !report.messaging_services.is_empty() {
            lines.push(ReportLine::Text("## Messaging services".to_string()));
            lines.extend(
                report
                    .messaging_services
                    .render_text()
                    .into_iter()
                    .map(ReportLine::Debug),
            );
        }
    }
    lines
}

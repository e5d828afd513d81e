//! Joins phone numbers with messaging-service membership and A2P campaigns.
//!
//! Services are applied one at a time in fetch order: membership first, then
//! the service's first campaign onto every row now linked to it. Rows are only
//! ever updated in place; the table keeps exactly one row per number sid.

use std::collections::HashMap;

use a2p_twilio::{CampaignRecord, MessagingServiceRecord, RecordFetcher};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::activity::MessageActivitySample;
use crate::tabular::RecordTable;
use crate::ReportError;

pub const PHONE_NUMBER_ATTRIBUTES: [&str; 2] = ["phone_number", "friendly_name"];
pub const MESSAGING_SERVICE_ATTRIBUTES: [&str; 3] =
    ["friendly_name", "usecase", "us_app_to_person_registered"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One reconciled account phone number.
pub struct ReconciledNumberRow {
    pub sid: String,
    pub phone_number: String,
    pub friendly_name: String,
    pub messaging_service_sid: Option<String>,
    pub messaging_service_friendly_name: Option<String>,
    pub messaging_service_usecase: Option<String>,
    pub us_a2p_registered: bool,
    pub campaign_status: Option<String>,
    pub us_app_to_person_usecase: Option<String>,
    pub brand_registration_sid: Option<String>,
    pub message_count: usize,
    pub last_message_sent_date: Option<DateTime<Utc>>,
}

impl ReconciledNumberRow {
    pub fn new(
        sid: impl Into<String>,
        phone_number: impl Into<String>,
        friendly_name: impl Into<String>,
    ) -> Self {
        Self {
            sid: sid.into(),
            phone_number: phone_number.into(),
            friendly_name: friendly_name.into(),
            messaging_service_sid: None,
            messaging_service_friendly_name: None,
            messaging_service_usecase: None,
            us_a2p_registered: false,
            campaign_status: None,
            us_app_to_person_usecase: None,
            brand_registration_sid: None,
            message_count: 0,
            last_message_sent_date: None,
        }
    }

    pub fn assign_service(&mut self, service: &MessagingServiceRecord) {
        self.messaging_service_sid = Some(service.sid.clone());
        self.messaging_service_friendly_name = Some(service.friendly_name.clone());
        self.messaging_service_usecase = service.usecase.clone();
        self.us_a2p_registered = service.us_app_to_person_registered;
    }

    pub fn assign_campaign(&mut self, campaign: &CampaignRecord) {
        self.campaign_status = campaign.campaign_status.clone();
        self.us_app_to_person_usecase = campaign.us_app_to_person_usecase.clone();
        self.brand_registration_sid = campaign.brand_registration_sid.clone();
    }

    pub fn apply_activity(&mut self, sample: &MessageActivitySample) {
        self.message_count = sample.message_count;
        self.last_message_sent_date = sample.last_message_sent_date;
    }

    pub fn is_active(&self) -> bool {
        self.message_count > 0
    }

    pub fn belongs_to(&self, service_sid: &str) -> bool {
        self.messaging_service_sid.as_deref() == Some(service_sid)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NumberTable {
    rows: Vec<ReconciledNumberRow>,
    index: HashMap<String, usize>,
}

impl NumberTable {
    /// Seeds one row per key of a normalized phone-number table. The table
    /// must carry `phone_number` and `friendly_name` columns.
    pub fn from_record_table(table: &RecordTable) -> Result<Self, ReportError> {
        let phone_numbers = table.text_column("phone_number")?;
        let friendly_names = table.text_column("friendly_name")?;
        let mut numbers = Self::default();
        for ((sid, phone_number), friendly_name) in
            table.keys.iter().zip(phone_numbers).zip(friendly_names)
        {
            let phone_number = phone_number.ok_or_else(|| ReportError::AttributeMissing {
                record_kind: table.record_kind,
                attribute: "phone_number".to_string(),
            })?;
            numbers.upsert(ReconciledNumberRow::new(
                sid.as_str(),
                phone_number,
                friendly_name.unwrap_or_default(),
            ));
        }
        Ok(numbers)
    }

    pub fn from_rows(rows: impl IntoIterator<Item = ReconciledNumberRow>) -> Self {
        let mut numbers = Self::default();
        for row in rows {
            numbers.upsert(row);
        }
        numbers
    }

    fn upsert(&mut self, row: ReconciledNumberRow) {
        match self.index.get(&row.sid) {
            Some(position) => self.rows[*position] = row,
            None => {
                self.index.insert(row.sid.clone(), self.rows.len());
                self.rows.push(row);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ReconciledNumberRow] {
        &self.rows
    }

    pub fn get(&self, sid: &str) -> Option<&ReconciledNumberRow> {
        self.index.get(sid).map(|position| &self.rows[*position])
    }

    /// Applies `update` to every row matching `predicate`; returns the count.
    pub fn update_where<P, U>(&mut self, predicate: P, mut update: U) -> usize
    where
        P: Fn(&ReconciledNumberRow) -> bool,
        U: FnMut(&mut ReconciledNumberRow),
    {
        let mut updated = 0;
        for row in &mut self.rows {
            if predicate(row) {
                update(row);
                updated += 1;
            }
        }
        updated
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A messaging service together with its fetched membership and campaigns.
pub struct ServiceSnapshot {
    pub service: MessagingServiceRecord,
    pub member_numbers: Vec<String>,
    pub campaigns: Vec<CampaignRecord>,
}

impl ServiceSnapshot {
    /// First campaign as returned by the API; no ranking is applied.
    pub fn primary_campaign(&self) -> Option<&CampaignRecord> {
        self.campaigns.first()
    }
}

pub fn gather_service_snapshots(
    fetcher: &dyn RecordFetcher,
    services: &[MessagingServiceRecord],
) -> Result<Vec<ServiceSnapshot>, ReportError> {
    services
        .iter()
        .map(|service| -> Result<ServiceSnapshot, ReportError> {
            let member_numbers = fetcher.list_service_members(&service.sid)?;
            let campaigns = fetcher.list_service_campaigns(&service.sid)?;
            debug!(
                service_sid = %service.sid,
                members = member_numbers.len(),
                campaigns = campaigns.len(),
                "gathered messaging service snapshot"
            );
            Ok(ServiceSnapshot {
                service: service.clone(),
                member_numbers,
                campaigns,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub services: usize,
    pub member_rows: usize,
    pub campaign_rows: usize,
    pub unmatched_members: usize,
}

pub fn reconcile_numbers(table: &mut NumberTable, snapshots: &[ServiceSnapshot]) -> ReconcileStats {
    let mut stats = ReconcileStats::default();
    for snapshot in snapshots {
        stats.services += 1;
        let service = &snapshot.service;
        for member in &snapshot.member_numbers {
            let linked = table.update_where(
                |row| row.phone_number == *member,
                |row| row.assign_service(service),
            );
            if linked == 0 {
                stats.unmatched_members += 1;
            }
            stats.member_rows += linked;
        }

        if let Some(campaign) = snapshot.primary_campaign() {
            stats.campaign_rows += table.update_where(
                |row| row.belongs_to(&service.sid),
                |row| row.assign_campaign(campaign),
            );
        }
    }
    stats
}

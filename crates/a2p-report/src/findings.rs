use std::collections::BTreeSet;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::reconciliation::ReconciledNumberRow;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Actionable partitions of the augmented table, both in recency order.
///
/// Serializes with the derived `unregistered_service_count` alongside the
/// two partitions.
pub struct Findings {
    /// Active numbers outside every messaging service.
    pub unserviced: Vec<ReconciledNumberRow>,
    /// Active numbers inside a messaging service that is not A2P registered.
    pub unregistered: Vec<ReconciledNumberRow>,
}

impl Findings {
    pub fn is_empty(&self) -> bool {
        self.unserviced.is_empty() && self.unregistered.is_empty()
    }

    /// Distinct messaging services behind the unregistered findings.
    pub fn unregistered_service_count(&self) -> usize {
        self.unregistered
            .iter()
            .filter_map(|row| row.messaging_service_sid.as_deref())
            .collect::<BTreeSet<_>>()
            .len()
    }
}

impl Serialize for Findings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Findings", 3)?;
        state.serialize_field("unserviced", &self.unserviced)?;
        state.serialize_field("unregistered", &self.unregistered)?;
        state.serialize_field(
            "unregistered_service_count",
            &self.unregistered_service_count(),
        )?;
        state.end()
    }
}

pub fn is_unserviced(row: &ReconciledNumberRow) -> bool {
    row.is_active() && row.messaging_service_sid.is_none()
}

pub fn is_unregistered(row: &ReconciledNumberRow) -> bool {
    row.is_active() && row.messaging_service_sid.is_some() && !row.us_a2p_registered
}

pub fn classify_findings(rows: &[ReconciledNumberRow]) -> Findings {
    Findings {
        unserviced: rows.iter().filter(|row| is_unserviced(row)).cloned().collect(),
        unregistered: rows
            .iter()
            .filter(|row| is_unregistered(row))
            .cloned()
            .collect(),
    }
}

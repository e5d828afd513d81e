//! Uniform keyed tables built from heterogeneous account records.

use std::collections::HashMap;

use a2p_twilio::{MessagingServiceRecord, PhoneNumberRecord};
use serde::Serialize;

use crate::ReportError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Text(String),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    fn as_key(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(value) => Some(value.to_string()),
            Self::Text(value) => Some(value.clone()),
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Null => "-".to_string(),
            Self::Bool(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Option<&String>> for CellValue {
    fn from(value: Option<&String>) -> Self {
        value.map_or(Self::Null, |value| Self::Text(value.clone()))
    }
}

/// Records whose attributes can be read by name. `None` means the record
/// type has no such attribute; nullable attributes return `CellValue::Null`.
pub trait TabularRecord {
    const RECORD_KIND: &'static str;

    fn attribute(&self, name: &str) -> Option<CellValue>;
}

impl TabularRecord for PhoneNumberRecord {
    const RECORD_KIND: &'static str = "phone_number";

    fn attribute(&self, name: &str) -> Option<CellValue> {
        match name {
            "sid" => Some(self.sid.as_str().into()),
            "phone_number" => Some(self.phone_number.as_str().into()),
            "friendly_name" => Some(self.friendly_name.as_str().into()),
            _ => None,
        }
    }
}

impl TabularRecord for MessagingServiceRecord {
    const RECORD_KIND: &'static str = "messaging_service";

    fn attribute(&self, name: &str) -> Option<CellValue> {
        match name {
            "sid" => Some(self.sid.as_str().into()),
            "friendly_name" => Some(self.friendly_name.as_str().into()),
            "usecase" => Some(self.usecase.as_ref().into()),
            "us_app_to_person_registered" => Some(CellValue::Bool(self.us_app_to_person_registered)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordTable {
    pub record_kind: &'static str,
    pub key_attribute: String,
    pub columns: Vec<String>,
    pub keys: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl RecordTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_position(&self, column: &str) -> Result<usize, ReportError> {
        self.columns
            .iter()
            .position(|candidate| candidate == column)
            .ok_or_else(|| ReportError::AttributeMissing {
                record_kind: self.record_kind,
                attribute: column.to_string(),
            })
    }

    /// Reads a text column across every row in table order.
    pub fn text_column(&self, column: &str) -> Result<Vec<Option<&str>>, ReportError> {
        let position = self.column_position(column)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row[position].as_text())
            .collect())
    }

    /// Plain-text rendering with aligned columns, key first.
    pub fn render_text(&self) -> Vec<String> {
        let mut header = vec![self.key_attribute.clone()];
        header.extend(self.columns.iter().cloned());
        let mut body = Vec::with_capacity(self.rows.len());
        for (key, row) in self.keys.iter().zip(&self.rows) {
            let mut cells = vec![key.clone()];
            cells.extend(row.iter().map(CellValue::render));
            body.push(cells);
        }
        render_aligned(&header, &body)
    }
}

pub(crate) fn render_aligned(header: &[String], body: &[Vec<String>]) -> Vec<String> {
    let mut widths = header
        .iter()
        .map(|cell| cell.chars().count())
        .collect::<Vec<_>>();
    for row in body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let format_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}", width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    let mut lines = vec![format_row(header)];
    lines.extend(body.iter().map(|row| format_row(row.as_slice())));
    lines
}

/// Builds a keyed table from `records`, reading `attributes` in order.
///
/// Fails fast with `AttributeMissing` when a record lacks a requested
/// attribute or has no value for the key attribute. Duplicate keys are
/// last-write-wins: the later record replaces the earlier row in place.
pub fn normalize_records<R: TabularRecord>(
    records: &[R],
    attributes: &[&str],
    key_attribute: &str,
) -> Result<RecordTable, ReportError> {
    let missing = |attribute: &str| ReportError::AttributeMissing {
        record_kind: R::RECORD_KIND,
        attribute: attribute.to_string(),
    };

    let mut table = RecordTable {
        record_kind: R::RECORD_KIND,
        key_attribute: key_attribute.to_string(),
        columns: attributes.iter().map(|name| name.to_string()).collect(),
        keys: Vec::with_capacity(records.len()),
        rows: Vec::with_capacity(records.len()),
        index: HashMap::with_capacity(records.len()),
    };

    for record in records {
        let key = record
            .attribute(key_attribute)
            .and_then(|value| value.as_key())
            .ok_or_else(|| missing(key_attribute))?;
        let values = attributes
            .iter()
            .map(|name| record.attribute(name).ok_or_else(|| missing(*name)))
            .collect::<Result<Vec<_>, _>>()?;

        match table.index.get(&key) {
            Some(position) => table.rows[*position] = values,
            None => {
                table.index.insert(key.clone(), table.rows.len());
                table.keys.push(key);
                table.rows.push(values);
            }
        }
    }
    Ok(table)
}

//! Outbound message activity sampling for home-country numbers.
//!
//! One bounded query runs per US number. With more than one worker the
//! queries fan out across scoped threads; samples are merged back by input
//! position so the result matches a sequential run exactly.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};

use a2p_twilio::RecordFetcher;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::reconciliation::{NumberTable, ReconciledNumberRow};
use crate::ReportError;

pub const HOME_COUNTRY_PREFIX: &str = "+1";
pub const DEFAULT_MESSAGE_SAMPLE_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MessageActivitySample {
    pub message_count: usize,
    pub last_message_sent_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityOptions {
    pub message_sample_limit: usize,
    pub workers: usize,
}

impl Default for ActivityOptions {
    fn default() -> Self {
        Self {
            message_sample_limit: DEFAULT_MESSAGE_SAMPLE_LIMIT,
            workers: 1,
        }
    }
}

pub fn is_home_country_number(phone_number: &str) -> bool {
    phone_number.starts_with(HOME_COUNTRY_PREFIX)
}

/// Samples the newest `limit` outbound messages for one number. The fetcher
/// returns messages newest first, so the first entry carries the latest date.
pub fn sample_activity(
    fetcher: &dyn RecordFetcher,
    phone_number: &str,
    limit: usize,
) -> Result<MessageActivitySample, ReportError> {
    let messages = fetcher.list_outbound_messages(phone_number, limit)?;
    Ok(MessageActivitySample {
        message_count: messages.len().min(limit),
        last_message_sent_date: messages.first().map(|message| message.date_created),
    })
}

fn collect_samples(
    fetcher: &dyn RecordFetcher,
    phone_numbers: &[&str],
    options: &ActivityOptions,
) -> Result<Vec<MessageActivitySample>, ReportError> {
    let workers = options.workers.clamp(1, phone_numbers.len().max(1));
    if workers == 1 {
        return phone_numbers
            .iter()
            .map(|phone_number| sample_activity(fetcher, phone_number, options.message_sample_limit))
            .collect();
    }

    let next = AtomicUsize::new(0);
    let next = &next;
    let failed = AtomicBool::new(false);
    let failed = &failed;
    let limit = options.message_sample_limit;
    let mut produced = std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            handles.push(scope.spawn(move || {
                let mut samples = Vec::new();
                // Workers stop claiming numbers once any sample has failed.
                while !failed.load(AtomicOrdering::Relaxed) {
                    let position = next.fetch_add(1, AtomicOrdering::Relaxed);
                    let Some(phone_number) = phone_numbers.get(position) else {
                        break;
                    };
                    let sample = sample_activity(fetcher, phone_number, limit);
                    let is_failure = sample.is_err();
                    samples.push((position, sample));
                    if is_failure {
                        failed.store(true, AtomicOrdering::Relaxed);
                        break;
                    }
                }
                samples
            }));
        }
        let mut merged = Vec::with_capacity(phone_numbers.len());
        for handle in handles {
            match handle.join() {
                Ok(samples) => merged.extend(samples),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        merged
    });
    produced.sort_by_key(|(position, _)| *position);
    produced.into_iter().map(|(_, sample)| sample).collect()
}

/// Newest `last_message_sent_date` first; rows without a date sort last.
/// The sort is stable, so ties keep their reconciled order.
pub fn sort_by_recent_activity(rows: &mut [ReconciledNumberRow]) {
    rows.sort_by(|left, right| {
        match (left.last_message_sent_date, right.last_message_sent_date) {
            (Some(left), Some(right)) => right.cmp(&left),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

/// Restricts the table to home-country numbers, attaches activity samples,
/// and orders the result by recency. Any failed sample aborts the run.
pub fn augment_home_country_numbers(
    table: &NumberTable,
    fetcher: &dyn RecordFetcher,
    options: &ActivityOptions,
) -> Result<Vec<ReconciledNumberRow>, ReportError> {
    let mut rows = table
        .rows()
        .iter()
        .filter(|row| is_home_country_number(&row.phone_number))
        .cloned()
        .collect::<Vec<_>>();
    let phone_numbers = rows
        .iter()
        .map(|row| row.phone_number.as_str())
        .collect::<Vec<_>>();
    let samples = collect_samples(fetcher, &phone_numbers, options)?;
    debug!(
        numbers = rows.len(),
        workers = options.workers,
        "sampled outbound activity"
    );
    for (row, sample) in rows.iter_mut().zip(&samples) {
        row.apply_activity(sample);
    }
    sort_by_recent_activity(&mut rows);
    Ok(rows)
}

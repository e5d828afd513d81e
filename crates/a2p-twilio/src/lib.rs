//! Read-only Twilio account access for the A2P 10DLC dashboard.
//!
//! Provides the record types returned by the account inventory endpoints, the
//! `RecordFetcher` contract consumed by report crates, a blocking REST client
//! implementing it, and an opt-in memoizing decorator.

pub mod cached_fetcher;
pub mod fetcher;
pub mod records;
mod transport_helpers;
pub mod twilio_api_client;

pub use cached_fetcher::CachedFetcher;
pub use fetcher::RecordFetcher;
pub use records::{
    CampaignRecord, MessagingServiceRecord, OutboundMessageRecord, PhoneNumberRecord,
};
pub use twilio_api_client::{
    TwilioApiClient, TwilioApiConfig, TwilioCredentials, DEFAULT_TWILIO_API_BASE,
    DEFAULT_TWILIO_MESSAGING_API_BASE, MAX_PAGE_SIZE,
};

use thiserror::Error;

#[derive(Debug, Error)]
/// Enumerates failures surfaced by Twilio fetch operations.
pub enum TwilioError {
    #[error("missing Twilio account sid or auth token")]
    MissingCredentials,
    #[error("twilio {operation} request failed: {source}")]
    Http {
        operation: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("twilio {operation} failed with status {status}: {body}")]
    HttpStatus {
        operation: String,
        status: u16,
        body: String,
    },
    #[error("invalid twilio {operation} response: {message}")]
    InvalidResponse { operation: String, message: String },
}

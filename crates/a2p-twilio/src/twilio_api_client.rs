//! Blocking Twilio REST client implementing [`RecordFetcher`].
//!
//! Inventory endpoints live on two hosts: the 2010-04-01 core API (incoming
//! numbers, messages) paginates with a relative `next_page_uri`, while the
//! Messaging v1 API (services, service senders, A2P compliance) paginates with
//! an absolute `meta.next_page_url`. Both are followed until exhausted.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::transport_helpers::{
    is_retryable_transport_error, is_retryable_twilio_status, parse_retry_after,
    resolve_page_url, retry_delay, truncate_for_error,
};
use crate::{
    CampaignRecord, MessagingServiceRecord, OutboundMessageRecord, PhoneNumberRecord,
    RecordFetcher, TwilioError,
};

pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";
pub const DEFAULT_TWILIO_MESSAGING_API_BASE: &str = "https://messaging.twilio.com";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_RETRY_MAX_ATTEMPTS: usize = 3;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 1_000;
const ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Clone, PartialEq, Eq)]
/// Resolved account identity and secret.
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
}

impl TwilioCredentials {
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            account_sid: account_sid.into().trim().to_string(),
            auth_token: auth_token.into().trim().to_string(),
        }
    }
}

impl fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct TwilioApiConfig {
    pub api_base: String,
    pub messaging_api_base: String,
    pub credentials: TwilioCredentials,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
    pub page_size: usize,
}

impl TwilioApiConfig {
    pub fn new(credentials: TwilioCredentials) -> Self {
        Self {
            api_base: DEFAULT_TWILIO_API_BASE.to_string(),
            messaging_api_base: DEFAULT_TWILIO_MESSAGING_API_BASE.to_string(),
            credentials,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagingPageMeta {
    #[serde(default)]
    next_page_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServicesPage {
    #[serde(default)]
    services: Vec<MessagingServiceRecord>,
    #[serde(default)]
    meta: Option<MessagingPageMeta>,
}

#[derive(Debug, Deserialize)]
struct ServicePhoneNumber {
    phone_number: String,
}

#[derive(Debug, Deserialize)]
struct ServicePhoneNumbersPage {
    #[serde(default)]
    phone_numbers: Vec<ServicePhoneNumber>,
    #[serde(default)]
    meta: Option<MessagingPageMeta>,
}

#[derive(Debug, Deserialize)]
struct CampaignsPage {
    #[serde(default)]
    compliance: Vec<CampaignRecord>,
    #[serde(default)]
    meta: Option<MessagingPageMeta>,
}

#[derive(Debug, Deserialize)]
struct IncomingPhoneNumbersPage {
    #[serde(default)]
    incoming_phone_numbers: Vec<PhoneNumberRecord>,
    #[serde(default)]
    next_page_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesPage {
    #[serde(default)]
    messages: Vec<OutboundMessageRecord>,
    #[serde(default)]
    next_page_uri: Option<String>,
}

fn messaging_next_page(meta: Option<MessagingPageMeta>) -> Option<String> {
    meta.and_then(|meta| meta.next_page_url)
        .filter(|value| !value.trim().is_empty())
}

struct PageChunk<T> {
    items: Vec<T>,
    next_page: Option<String>,
}

pub struct TwilioApiClient {
    http: reqwest::blocking::Client,
    config: TwilioApiConfig,
}

impl TwilioApiClient {
    pub fn new(config: TwilioApiConfig) -> Result<Self, TwilioError> {
        if config.credentials.account_sid.is_empty() || config.credentials.auth_token.is_empty() {
            return Err(TwilioError::MissingCredentials);
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("a2p-dashboard"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .map_err(|source| TwilioError::Http {
                operation: "client setup".to_string(),
                source,
            })?;

        Ok(Self {
            http,
            config: TwilioApiConfig {
                api_base: config.api_base.trim_end_matches('/').to_string(),
                messaging_api_base: config.messaging_api_base.trim_end_matches('/').to_string(),
                retry_max_attempts: config.retry_max_attempts.max(1),
                retry_base_delay_ms: config.retry_base_delay_ms.max(1),
                page_size: config.page_size.clamp(1, MAX_PAGE_SIZE),
                ..config
            },
        })
    }

    pub fn account_sid(&self) -> &str {
        &self.config.credentials.account_sid
    }

    fn account_url(&self, resource: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/{}",
            self.config.api_base, self.config.credentials.account_sid, resource
        )
    }

    fn page_size_query(&self) -> Vec<(&'static str, String)> {
        vec![("PageSize", self.config.page_size.to_string())]
    }

    fn list_paginated<P, T, F>(
        &self,
        operation: &str,
        first_url: String,
        first_query: Vec<(&'static str, String)>,
        page_base: &str,
        into_chunk: F,
    ) -> Result<Vec<T>, TwilioError>
    where
        P: DeserializeOwned,
        F: Fn(P) -> PageChunk<T>,
    {
        let mut rows = Vec::new();
        let mut seen_urls = HashSet::new();
        let mut url = first_url;
        let mut query = first_query;
        let mut page = 0_usize;
        loop {
            page = page.saturating_add(1);
            let chunk = into_chunk(self.request_json::<P>(operation, &url, &query)?);
            debug!(
                operation,
                page,
                items = chunk.items.len(),
                "fetched twilio page"
            );
            rows.extend(chunk.items);
            seen_urls.insert(url);

            let Some(next_page) = chunk.next_page else {
                break;
            };
            let next_url = resolve_page_url(page_base, &next_page);
            if seen_urls.contains(&next_url) {
                warn!(operation, next_url = %next_url, "twilio pagination repeated a page; stopping");
                break;
            }
            url = next_url;
            query = Vec::new();
        }
        Ok(rows)
    }

    fn request_json<T>(
        &self,
        operation: &str,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, TwilioError>
    where
        T: DeserializeOwned,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = self
                .http
                .get(url)
                .basic_auth(
                    &self.config.credentials.account_sid,
                    Some(&self.config.credentials.auth_token),
                )
                .query(query)
                .send();
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response.text().map_err(|source| TwilioError::Http {
                            operation: operation.to_string(),
                            source,
                        })?;
                        return serde_json::from_str::<T>(&body).map_err(|error| {
                            TwilioError::InvalidResponse {
                                operation: operation.to_string(),
                                message: error.to_string(),
                            }
                        });
                    }

                    let retry_after = parse_retry_after(response.headers());
                    let body = response.text().unwrap_or_default();
                    if attempt < self.config.retry_max_attempts
                        && is_retryable_twilio_status(status.as_u16())
                    {
                        let delay =
                            retry_delay(self.config.retry_base_delay_ms, attempt, retry_after);
                        warn!(
                            operation,
                            status = status.as_u16(),
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "retrying twilio request"
                        );
                        std::thread::sleep(delay);
                        continue;
                    }

                    return Err(TwilioError::HttpStatus {
                        operation: operation.to_string(),
                        status: status.as_u16(),
                        body: truncate_for_error(&body, ERROR_BODY_MAX_CHARS),
                    });
                }
                Err(error) => {
                    if attempt < self.config.retry_max_attempts
                        && is_retryable_transport_error(&error)
                    {
                        let delay = retry_delay(self.config.retry_base_delay_ms, attempt, None);
                        warn!(operation, attempt, %error, "retrying twilio request after transport error");
                        std::thread::sleep(delay);
                        continue;
                    }
                    return Err(TwilioError::Http {
                        operation: operation.to_string(),
                        source: error,
                    });
                }
            }
        }
    }
}

impl RecordFetcher for TwilioApiClient {
    fn list_messaging_services(&self) -> Result<Vec<MessagingServiceRecord>, TwilioError> {
        self.list_paginated(
            "list messaging services",
            format!("{}/v1/Services", self.config.messaging_api_base),
            self.page_size_query(),
            &self.config.messaging_api_base,
            |page: ServicesPage| PageChunk {
                items: page.services,
                next_page: messaging_next_page(page.meta),
            },
        )
    }

    fn list_phone_numbers(&self) -> Result<Vec<PhoneNumberRecord>, TwilioError> {
        self.list_paginated(
            "list phone numbers",
            self.account_url("IncomingPhoneNumbers.json"),
            self.page_size_query(),
            &self.config.api_base,
            |page: IncomingPhoneNumbersPage| PageChunk {
                items: page.incoming_phone_numbers,
                next_page: page.next_page_uri.filter(|value| !value.trim().is_empty()),
            },
        )
    }

    fn list_service_members(&self, service_sid: &str) -> Result<Vec<String>, TwilioError> {
        self.list_paginated(
            "list messaging service phone numbers",
            format!(
                "{}/v1/Services/{}/PhoneNumbers",
                self.config.messaging_api_base, service_sid
            ),
            self.page_size_query(),
            &self.config.messaging_api_base,
            |page: ServicePhoneNumbersPage| PageChunk {
                items: page
                    .phone_numbers
                    .into_iter()
                    .map(|entry| entry.phone_number)
                    .collect(),
                next_page: messaging_next_page(page.meta),
            },
        )
    }

    fn list_service_campaigns(
        &self,
        service_sid: &str,
    ) -> Result<Vec<CampaignRecord>, TwilioError> {
        self.list_paginated(
            "list messaging service a2p campaigns",
            format!(
                "{}/v1/Services/{}/Compliance/Usa2p",
                self.config.messaging_api_base, service_sid
            ),
            self.page_size_query(),
            &self.config.messaging_api_base,
            |page: CampaignsPage| PageChunk {
                items: page.compliance,
                next_page: messaging_next_page(page.meta),
            },
        )
    }

    fn list_outbound_messages(
        &self,
        phone_number: &str,
        limit: usize,
    ) -> Result<Vec<OutboundMessageRecord>, TwilioError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut messages = Vec::new();
        let mut seen_urls = HashSet::new();
        let mut url = self.account_url("Messages.json");
        let mut query = vec![
            ("From", phone_number.to_string()),
            ("PageSize", limit.min(MAX_PAGE_SIZE).to_string()),
        ];
        loop {
            let page: MessagesPage = self.request_json("list outbound messages", &url, &query)?;
            messages.extend(page.messages);
            seen_urls.insert(url);
            if messages.len() >= limit {
                break;
            }
            let Some(next_page) = page
                .next_page_uri
                .filter(|value| !value.trim().is_empty())
            else {
                break;
            };
            let next_url = resolve_page_url(&self.config.api_base, &next_page);
            if seen_urls.contains(&next_url) {
                warn!(next_url = %next_url, "twilio message pagination repeated a page; stopping");
                break;
            }
            url = next_url;
            query = Vec::new();
        }
        messages.truncate(limit);
        debug!(phone_number, count = messages.len(), "sampled outbound messages");
        Ok(messages)
    }
}

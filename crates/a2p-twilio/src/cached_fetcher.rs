//! Opt-in memoizing decorator for [`RecordFetcher`].
//!
//! Successful results are cached per operation and argument for the lifetime
//! of the decorator; failures are never cached. Account state is assumed
//! stable within a run, so a cached answer is interchangeable with a fresh one.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

use tracing::debug;

use crate::{
    CampaignRecord, MessagingServiceRecord, OutboundMessageRecord, PhoneNumberRecord,
    RecordFetcher, TwilioError,
};

pub struct CachedFetcher<F> {
    inner: F,
    messaging_services: Mutex<Option<Vec<MessagingServiceRecord>>>,
    phone_numbers: Mutex<Option<Vec<PhoneNumberRecord>>>,
    service_members: Mutex<HashMap<String, Vec<String>>>,
    service_campaigns: Mutex<HashMap<String, Vec<CampaignRecord>>>,
    outbound_messages: Mutex<HashMap<(String, usize), Vec<OutboundMessageRecord>>>,
}

impl<F: RecordFetcher> CachedFetcher<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            messaging_services: Mutex::new(None),
            phone_numbers: Mutex::new(None),
            service_members: Mutex::new(HashMap::new()),
            service_campaigns: Mutex::new(HashMap::new()),
            outbound_messages: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

fn memoize_single<V, L>(
    operation: &str,
    slot: &Mutex<Option<V>>,
    load: L,
) -> Result<V, TwilioError>
where
    V: Clone,
    L: FnOnce() -> Result<V, TwilioError>,
{
    if let Some(cached) = slot.lock().ok().and_then(|guard| (*guard).clone()) {
        debug!(operation, "fetch cache hit");
        return Ok(cached);
    }
    let value = load()?;
    if let Ok(mut guard) = slot.lock() {
        *guard = Some(value.clone());
    }
    Ok(value)
}

fn memoize_keyed<K, V, L>(
    operation: &str,
    cache: &Mutex<HashMap<K, V>>,
    key: K,
    load: L,
) -> Result<V, TwilioError>
where
    K: Eq + Hash,
    V: Clone,
    L: FnOnce() -> Result<V, TwilioError>,
{
    if let Some(cached) = cache
        .lock()
        .ok()
        .and_then(|guard| guard.get(&key).cloned())
    {
        debug!(operation, "fetch cache hit");
        return Ok(cached);
    }
    let value = load()?;
    if let Ok(mut guard) = cache.lock() {
        guard.insert(key, value.clone());
    }
    Ok(value)
}

impl<F: RecordFetcher> RecordFetcher for CachedFetcher<F> {
    fn list_messaging_services(&self) -> Result<Vec<MessagingServiceRecord>, TwilioError> {
        memoize_single("list messaging services", &self.messaging_services, || {
            self.inner.list_messaging_services()
        })
    }

    fn list_phone_numbers(&self) -> Result<Vec<PhoneNumberRecord>, TwilioError> {
        memoize_single("list phone numbers", &self.phone_numbers, || {
            self.inner.list_phone_numbers()
        })
    }

    fn list_service_members(&self, service_sid: &str) -> Result<Vec<String>, TwilioError> {
        memoize_keyed(
            "list messaging service phone numbers",
            &self.service_members,
            service_sid.to_string(),
            || self.inner.list_service_members(service_sid),
        )
    }

    fn list_service_campaigns(
        &self,
        service_sid: &str,
    ) -> Result<Vec<CampaignRecord>, TwilioError> {
        memoize_keyed(
            "list messaging service a2p campaigns",
            &self.service_campaigns,
            service_sid.to_string(),
            || self.inner.list_service_campaigns(service_sid),
        )
    }

    fn list_outbound_messages(
        &self,
        phone_number: &str,
        limit: usize,
    ) -> Result<Vec<OutboundMessageRecord>, TwilioError> {
        memoize_keyed(
            "list outbound messages",
            &self.outbound_messages,
            (phone_number.to_string(), limit),
            || self.inner.list_outbound_messages(phone_number, limit),
        )
    }
}

use crate::{
    CampaignRecord, MessagingServiceRecord, OutboundMessageRecord, PhoneNumberRecord, TwilioError,
};

/// Trait contract for the read operations the dashboard performs against an
/// account. Every call is blocking and returns a finite collection.
pub trait RecordFetcher: Send + Sync {
    fn list_messaging_services(&self) -> Result<Vec<MessagingServiceRecord>, TwilioError>;

    fn list_phone_numbers(&self) -> Result<Vec<PhoneNumberRecord>, TwilioError>;

    /// Phone numbers (E.164) attached to the messaging service.
    fn list_service_members(&self, service_sid: &str) -> Result<Vec<String>, TwilioError>;

    fn list_service_campaigns(&self, service_sid: &str)
        -> Result<Vec<CampaignRecord>, TwilioError>;

    /// Most recent messages sent from `phone_number`, newest first, at most
    /// `limit` entries.
    fn list_outbound_messages(
        &self,
        phone_number: &str,
        limit: usize,
    ) -> Result<Vec<OutboundMessageRecord>, TwilioError>;
}

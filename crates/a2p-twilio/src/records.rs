use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Incoming phone number owned by the account.
pub struct PhoneNumberRecord {
    pub sid: String,
    pub phone_number: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub friendly_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Messaging service grouping a pool of sender numbers.
pub struct MessagingServiceRecord {
    pub sid: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub friendly_name: String,
    #[serde(default)]
    pub usecase: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub us_app_to_person_registered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// US A2P registration campaign attached to a messaging service.
pub struct CampaignRecord {
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub messaging_service_sid: Option<String>,
    #[serde(default)]
    pub campaign_status: Option<String>,
    #[serde(default)]
    pub us_app_to_person_usecase: Option<String>,
    #[serde(default)]
    pub brand_registration_sid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Outbound message sample; only the creation timestamp feeds the report.
pub struct OutboundMessageRecord {
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(deserialize_with = "deserialize_twilio_timestamp")]
    pub date_created: DateTime<Utc>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Parses the RFC 2822 timestamps used by the 2010-04-01 API, accepting
/// RFC 3339 as well.
pub fn parse_twilio_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    DateTime::parse_from_rfc2822(trimmed)
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed))
        .ok()
        .map(|value| value.with_timezone(&Utc))
}

fn deserialize_twilio_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_twilio_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid twilio timestamp '{raw}'")))
}

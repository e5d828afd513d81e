use a2p_twilio::MAX_PAGE_SIZE;
use clap::Parser;

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_page_size(value: &str) -> Result<usize, String> {
    let parsed = parse_positive_usize(value)?;
    if parsed > MAX_PAGE_SIZE {
        return Err(format!("value must be in range 1..={MAX_PAGE_SIZE}"));
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "a2p-dashboard",
    about = "Report Twilio phone numbers that need A2P 10DLC attention",
    version
)]
pub struct Cli {
    #[arg(
        long = "account-sid",
        env = "TWILIO_ACCOUNT_SID",
        help = "Twilio account sid (AC...)"
    )]
    pub account_sid: Option<String>,

    #[arg(
        long = "auth-token",
        env = "TWILIO_AUTH_TOKEN",
        hide_env_values = true,
        help = "Twilio auth token for the account"
    )]
    pub auth_token: Option<String>,

    #[arg(
        long = "no-prompt",
        default_value_t = false,
        help = "Never prompt for missing credentials, even when stdin is a terminal"
    )]
    pub no_prompt: bool,

    #[arg(
        long = "api-base",
        env = "A2P_TWILIO_API_BASE",
        default_value = "https://api.twilio.com",
        help = "Base URL for the Twilio core REST API"
    )]
    pub api_base: String,

    #[arg(
        long = "messaging-api-base",
        env = "A2P_TWILIO_MESSAGING_API_BASE",
        default_value = "https://messaging.twilio.com",
        help = "Base URL for the Twilio Messaging v1 API"
    )]
    pub messaging_api_base: String,

    #[arg(
        long = "request-timeout-ms",
        env = "A2P_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "HTTP request timeout in milliseconds"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "retry-max-attempts",
        env = "A2P_RETRY_MAX_ATTEMPTS",
        default_value_t = 3,
        value_parser = parse_positive_usize,
        help = "Maximum attempts per request for retryable failures (1 disables retries)"
    )]
    pub retry_max_attempts: usize,

    #[arg(
        long = "retry-base-delay-ms",
        env = "A2P_RETRY_BASE_DELAY_MS",
        default_value_t = 500,
        value_parser = parse_positive_u64,
        help = "Initial backoff delay in milliseconds between retries"
    )]
    pub retry_base_delay_ms: u64,

    #[arg(
        long = "page-size",
        env = "A2P_PAGE_SIZE",
        default_value_t = 50,
        value_parser = parse_page_size,
        help = "Page size for list endpoints (1..=1000)"
    )]
    pub page_size: usize,

    #[arg(
        long = "message-sample-limit",
        env = "A2P_MESSAGE_SAMPLE_LIMIT",
        default_value_t = 100,
        value_parser = parse_positive_usize,
        help = "Maximum recent outbound messages sampled per US number"
    )]
    pub message_sample_limit: usize,

    #[arg(
        long = "activity-workers",
        env = "A2P_ACTIVITY_WORKERS",
        default_value_t = 1,
        value_parser = parse_positive_usize,
        help = "Concurrent workers used to sample outbound activity"
    )]
    pub activity_workers: usize,

    #[arg(
        long = "disable-fetch-cache",
        default_value_t = false,
        help = "Bypass the in-run memoization of remote reads"
    )]
    pub disable_fetch_cache: bool,

    #[arg(
        long = "debug-table",
        default_value_t = false,
        help = "Append the raw augmented number table and messaging services to the report"
    )]
    pub debug_table: bool,

    #[arg(
        long = "json",
        default_value_t = false,
        help = "Emit the report as a JSON document instead of markdown lines"
    )]
    pub json: bool,

    #[arg(
        long = "log-level",
        env = "A2P_LOG",
        help = "Tracing filter directive for stderr diagnostics (for example 'info' or 'a2p_twilio=debug')"
    )]
    pub log_level: Option<String>,
}

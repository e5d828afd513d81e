use std::io::{self, IsTerminal};

use a2p_cli::Cli;
use a2p_report::{
    collect_dashboard, render_dashboard_lines, ActivityOptions, DashboardOptions,
    DashboardReport, ReportSink,
};
use a2p_twilio::{CachedFetcher, RecordFetcher, TwilioApiClient, TwilioApiConfig};
use anyhow::{Context, Result};
use tracing::info;

use crate::credentials::resolve_credentials;
use crate::terminal_sink::TerminalSink;

fn build_api_config(cli: &Cli) -> Result<TwilioApiConfig> {
    let credentials = resolve_credentials(cli)?;
    Ok(TwilioApiConfig {
        api_base: cli.api_base.clone(),
        messaging_api_base: cli.messaging_api_base.clone(),
        request_timeout_ms: cli.request_timeout_ms,
        retry_max_attempts: cli.retry_max_attempts,
        retry_base_delay_ms: cli.retry_base_delay_ms,
        page_size: cli.page_size,
        ..TwilioApiConfig::new(credentials)
    })
}

fn dashboard_options(cli: &Cli) -> DashboardOptions {
    DashboardOptions {
        activity: ActivityOptions {
            message_sample_limit: cli.message_sample_limit,
            workers: cli.activity_workers,
        },
    }
}

fn collect_with(
    fetcher: &dyn RecordFetcher,
    account_sid: &str,
    cli: &Cli,
    sink: &mut dyn ReportSink,
) -> Result<DashboardReport> {
    collect_dashboard(fetcher, account_sid, &dashboard_options(cli), sink)
        .context("failed to collect A2P 10DLC dashboard")
}

pub(crate) fn run_dashboard(cli: &Cli) -> Result<()> {
    let config = build_api_config(cli)?;
    let client = TwilioApiClient::new(config).context("failed to build Twilio API client")?;
    let account_sid = client.account_sid().to_string();
    info!(
        account_sid = %account_sid,
        fetch_cache = !cli.disable_fetch_cache,
        "starting A2P 10DLC dashboard"
    );

    let show_progress = !cli.json && io::stderr().is_terminal();
    let mut sink = TerminalSink::new(io::stdout().lock(), io::stderr(), show_progress);
    let report = if cli.disable_fetch_cache {
        collect_with(&client, &account_sid, cli, &mut sink)?
    } else {
        let cached = CachedFetcher::new(client);
        collect_with(&cached, &account_sid, cli, &mut sink)?
    };

    if cli.json {
        let document =
            serde_json::to_string_pretty(&report).context("failed to encode dashboard report")?;
        sink.write_raw(&document);
    } else {
        sink.emit_all(&render_dashboard_lines(&report, cli.debug_table));
    }
    sink.finish().context("failed to write dashboard report")
}

use a2p_report::{
    collect_dashboard, render_dashboard_lines, DashboardOptions, ProgressUpdate, ReportLine,
    ReportSink,
};
use a2p_twilio::{CachedFetcher, TwilioApiClient, TwilioApiConfig, TwilioCredentials};
use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::{json, Value};

#[derive(Default)]
struct CollectingSink {
    updates: Vec<ProgressUpdate>,
    lines: Vec<ReportLine>,
}

impl ReportSink for CollectingSink {
    fn progress(&mut self, update: &ProgressUpdate) {
        self.updates.push(update.clone());
    }

    fn emit(&mut self, line: &ReportLine) {
        self.lines.push(line.clone());
    }
}

fn client_for(server: &MockServer) -> TwilioApiClient {
    let mut config = TwilioApiConfig::new(TwilioCredentials::new("AC123", "token"));
    config.api_base = server.base_url();
    config.messaging_api_base = server.base_url();
    config.request_timeout_ms = 5_000;
    config.retry_max_attempts = 1;
    TwilioApiClient::new(config).expect("twilio client should be created")
}

fn messages_sent_on(dates: &[&str]) -> Value {
    let entries = dates
        .iter()
        .enumerate()
        .map(|(index, date)| json!({"sid": format!("SM{index}"), "date_created": date}))
        .collect::<Vec<_>>();
    json!({"messages": entries, "next_page_uri": null})
}

struct MountedAccount<'a> {
    services: Mock<'a>,
    numbers_first_page: Mock<'a>,
    numbers_second_page: Mock<'a>,
    message_mocks: Vec<Mock<'a>>,
}

/// Two services: `MG1` unregistered with two members and two campaigns, `MG2`
/// registered with one member. Phone numbers span two pages.
fn mount_account(server: &MockServer) -> MountedAccount<'_> {
    let services = server.mock(|when, then| {
        when.method(GET).path("/v1/Services");
        then.status(200).json_body(json!({
            "services": [
                {"sid": "MG1", "friendly_name": "Alerts", "usecase": "notifications", "us_app_to_person_registered": false},
                {"sid": "MG2", "friendly_name": "Billing", "usecase": "account_notification", "us_app_to_person_registered": true}
            ],
            "meta": {"next_page_url": null}
        }));
    });
    let numbers_first_page = server.mock(|when, then| {
        when.method(GET)
            .path("/2010-04-01/Accounts/AC123/IncomingPhoneNumbers.json")
            .query_param("PageSize", "50");
        then.status(200).json_body(json!({
            "incoming_phone_numbers": [
                {"sid": "PN1", "phone_number": "+15550000001", "friendly_name": "Alerts A"},
                {"sid": "PN2", "phone_number": "+15550000002", "friendly_name": "Alerts B"},
                {"sid": "PN3", "phone_number": "+15550000003", "friendly_name": "Billing"}
            ],
            "next_page_uri": "/2010-04-01/Accounts/AC123/IncomingPhoneNumbers.json?PageSize=3&Page=1&PageToken=PA1"
        }));
    });
    let numbers_second_page = server.mock(|when, then| {
        when.method(GET)
            .path("/2010-04-01/Accounts/AC123/IncomingPhoneNumbers.json")
            .query_param("PageToken", "PA1");
        then.status(200).json_body(json!({
            "incoming_phone_numbers": [
                {"sid": "PN4", "phone_number": "+15550000004", "friendly_name": "Stray"},
                {"sid": "PN5", "phone_number": "+15550000005", "friendly_name": "Quiet"},
                {"sid": "PN6", "phone_number": "+442079460000", "friendly_name": "London"}
            ],
            "next_page_uri": null
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/Services/MG1/PhoneNumbers");
        then.status(200).json_body(json!({
            "phone_numbers": [
                {"sid": "PN1", "phone_number": "+15550000001"},
                {"sid": "PN2", "phone_number": "+15550000002"}
            ],
            "meta": {"next_page_url": null}
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/Services/MG2/PhoneNumbers");
        then.status(200).json_body(json!({
            "phone_numbers": [{"sid": "PN3", "phone_number": "+15550000003"}],
            "meta": {"next_page_url": null}
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/Services/MG1/Compliance/Usa2p");
        then.status(200).json_body(json!({
            "compliance": [
                {"sid": "QE1", "messaging_service_sid": "MG1", "campaign_status": "IN_PROGRESS", "us_app_to_person_usecase": "MARKETING", "brand_registration_sid": "BN1"},
                {"sid": "QE2", "messaging_service_sid": "MG1", "campaign_status": "FAILED", "us_app_to_person_usecase": "MIXED", "brand_registration_sid": "BN2"}
            ],
            "meta": {"next_page_url": null}
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/Services/MG2/Compliance/Usa2p");
        then.status(200)
            .json_body(json!({"compliance": [], "meta": {"next_page_url": null}}));
    });

    let history: [(&str, &[&str]); 5] = [
        ("+15550000001", &["Tue, 06 Oct 2026 08:00:00 +0000"]),
        (
            "+15550000002",
            &[
                "Thu, 08 Oct 2026 08:00:00 +0000",
                "Wed, 07 Oct 2026 08:00:00 +0000",
            ],
        ),
        ("+15550000003", &["Fri, 09 Oct 2026 08:00:00 +0000"]),
        ("+15550000004", &["Mon, 05 Oct 2026 08:00:00 +0000"]),
        ("+15550000005", &[]),
    ];
    let message_mocks = history
        .iter()
        .map(|(phone_number, dates)| {
            server.mock(|when, then| {
                when.method(GET)
                    .path("/2010-04-01/Accounts/AC123/Messages.json")
                    .query_param("From", *phone_number);
                then.status(200).json_body(messages_sent_on(dates));
            })
        })
        .collect();

    MountedAccount {
        services,
        numbers_first_page,
        numbers_second_page,
        message_mocks,
    }
}

#[test]
fn integration_pipeline_reconciles_paginated_account_and_classifies_findings() {
    let server = MockServer::start();
    let mounted = mount_account(&server);
    let client = client_for(&server);
    let mut sink = CollectingSink::default();

    let report = collect_dashboard(&client, "AC123", &DashboardOptions::default(), &mut sink)
        .expect("dashboard should be collected");

    mounted.numbers_first_page.assert();
    mounted.numbers_second_page.assert();
    assert_eq!(report.reconcile_stats.services, 2);
    assert_eq!(report.reconcile_stats.member_rows, 3);
    assert_eq!(report.reconcile_stats.campaign_rows, 2);

    let order = report
        .us_numbers
        .iter()
        .map(|row| row.sid.as_str())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["PN3", "PN2", "PN1", "PN4", "PN5"]);

    let alerts_b = &report.us_numbers[1];
    assert_eq!(alerts_b.message_count, 2);
    assert_eq!(alerts_b.campaign_status.as_deref(), Some("IN_PROGRESS"));
    assert_eq!(alerts_b.brand_registration_sid.as_deref(), Some("BN1"));

    let unserviced = report
        .findings
        .unserviced
        .iter()
        .map(|row| row.sid.as_str())
        .collect::<Vec<_>>();
    let unregistered = report
        .findings
        .unregistered
        .iter()
        .map(|row| row.sid.as_str())
        .collect::<Vec<_>>();
    assert_eq!(unserviced, vec!["PN4"]);
    assert_eq!(unregistered, vec!["PN2", "PN1"]);
    assert_eq!(report.findings.unregistered_service_count(), 1);
    assert_eq!(sink.updates.last(), Some(&ProgressUpdate::Finished));

    let lines = render_dashboard_lines(&report, false);
    let headers = lines
        .iter()
        .filter(|line| matches!(line, ReportLine::GroupHeader(_)))
        .collect::<Vec<_>>();
    assert_eq!(headers.len(), 1);
    assert!(headers[0].text().contains("Alerts"));
    assert!(!lines.iter().any(|line| line.text().contains("London")));
}

#[test]
fn integration_cached_fetcher_serves_repeat_runs_without_new_requests() {
    let server = MockServer::start();
    let mounted = mount_account(&server);
    let cached = CachedFetcher::new(client_for(&server));

    let mut first_sink = CollectingSink::default();
    let first = collect_dashboard(&cached, "AC123", &DashboardOptions::default(), &mut first_sink)
        .expect("first run");
    let mut second_sink = CollectingSink::default();
    let second = collect_dashboard(
        &cached,
        "AC123",
        &DashboardOptions::default(),
        &mut second_sink,
    )
    .expect("second run");

    mounted.services.assert_hits(1);
    mounted.numbers_first_page.assert_hits(1);
    for mock in &mounted.message_mocks {
        mock.assert_hits(1);
    }
    assert_eq!(first.us_numbers, second.us_numbers);
    assert_eq!(first.findings, second.findings);
}

#[test]
fn integration_worker_pool_produces_same_report_as_sequential_run() {
    let server = MockServer::start();
    mount_account(&server);
    let client = client_for(&server);

    let mut sink = CollectingSink::default();
    let sequential = collect_dashboard(&client, "AC123", &DashboardOptions::default(), &mut sink)
        .expect("sequential");
    let mut options = DashboardOptions::default();
    options.activity.workers = 4;
    let pooled =
        collect_dashboard(&client, "AC123", &options, &mut sink).expect("pooled");

    assert_eq!(sequential.us_numbers, pooled.us_numbers);
    assert_eq!(sequential.findings, pooled.findings);
}

#[test]
fn integration_report_serializes_to_json_document() {
    let server = MockServer::start();
    mount_account(&server);
    let client = client_for(&server);
    let mut sink = CollectingSink::default();
    let report = collect_dashboard(&client, "AC123", &DashboardOptions::default(), &mut sink)
        .expect("dashboard");

    let document = serde_json::to_value(&report).expect("report should serialize");
    assert_eq!(document["account_sid"], "AC123");
    assert_eq!(document["messaging_services"]["record_kind"], "messaging_service");
    assert_eq!(
        document["messaging_services"]["columns"],
        json!(["friendly_name", "usecase", "us_app_to_person_registered"])
    );
    assert_eq!(document["findings"]["unserviced"][0]["phone_number"], "+15550000004");
    assert_eq!(document["findings"]["unregistered_service_count"], 1);
    assert!(document.get("unregistered_service_count").is_none());
}

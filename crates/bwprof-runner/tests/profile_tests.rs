//! Profile loading and application tests.

use std::path::PathBuf;

use bwprof_firmware::LoopbackConfig;
use bwprof_runner::{metrics_export, run_profile, BwprofProfile, RunnerError};
use scmi_bwprof::{errno, Algorithm};

fn profile_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("profiles")
        .join(name)
}

#[test]
fn test_histogram_profile_applies_in_order() {
    let profile = BwprofProfile::load(profile_path("histogram.yaml")).unwrap();
    let report = run_profile(&profile, LoopbackConfig::default());

    assert!(report.is_success());
    let messages: Vec<&str> = report
        .transactions
        .iter()
        .map(|tx| tx.message.as_str())
        .collect();
    assert_eq!(
        messages,
        vec![
            "SET_LOG_LEVEL",
            "MASTER_LIST",
            "SET_HIST_INFO",
            "SET_SAMPLE_MS",
            "SET_ENABLE"
        ]
    );
    assert_eq!(report.transactions[1].payload, "03010407");
    assert_eq!(report.transactions[3].payload, "016400");

    let state = &report.state;
    assert_eq!(state.log_level, 2);
    assert_eq!(state.masters, vec![1, 4, 7]);
    assert_eq!(state.buckets, [1024, 65536, 1048576]);
    assert_eq!(state.algorithm, Algorithm::Histogram.id());
    assert!(state.enabled);
    assert_eq!(report.transfers.acquired, 5);
    assert_eq!(report.transfers.released, 5);
}

#[test]
fn test_basic_profile() {
    let profile = BwprofProfile::load(profile_path("basic.yaml")).unwrap();
    assert_eq!(profile.command_count(), 3);
    let report = run_profile(&profile, LoopbackConfig::default());

    assert!(report.is_success());
    assert_eq!(report.transactions[0].payload, "01020000");
    assert_eq!(report.transactions[1].payload, "00e803");
    assert_eq!(report.transactions[2].payload, "00");
    assert!(!report.state.histogram());
    assert!(!report.state.enabled);
}

#[test]
fn test_failure_stops_sequence() {
    let profile = BwprofProfile::load(profile_path("histogram.yaml")).unwrap();
    // Too small for the 12-byte bucket record.
    let report = run_profile(
        &profile,
        LoopbackConfig {
            max_msg_size: 8,
            ..Default::default()
        },
    );

    assert!(!report.is_success());
    assert_eq!(report.status, -errno::ERANGE);
    assert_eq!(report.transactions.len(), 2);
    assert!(!report.state.enabled);
    assert_eq!(report.state.sample_ms, 0);
    assert_eq!(report.transfers.acquired, report.transfers.released);
}

#[test]
fn test_missing_profile_file() {
    let err = BwprofProfile::load(profile_path("missing.yaml")).unwrap_err();
    assert!(matches!(err, RunnerError::Io(_)));
}

#[test]
fn test_report_json() {
    let profile = BwprofProfile::from_yaml_str("enable: true").unwrap();
    let report = run_profile(
        &profile,
        LoopbackConfig {
            version: 0x0002_0001,
            ..Default::default()
        },
    );
    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["version"], "2.1");
    assert_eq!(json["status"], 0);
    assert_eq!(json["state"]["enabled"], true);
    assert_eq!(json["transactions"][0]["message_id"], 19);
    assert_eq!(json["transactions"][0]["status"], "success");
    assert!(json.get("error").is_none());
}

#[test]
fn test_metrics_match_transfer_counts() {
    let profile = BwprofProfile::load(profile_path("histogram.yaml")).unwrap();
    let (report, export) = metrics_export::capture(|| {
        run_profile(
            &profile,
            LoopbackConfig {
                max_msg_size: 8,
                ..Default::default()
            },
        )
    });

    assert_eq!(
        export.counter("bwprof.xfer.acquired", &[]),
        report.transfers.acquired
    );
    assert_eq!(
        export.counter("bwprof.xfer.released", &[]),
        report.transfers.released
    );
    assert_eq!(
        export.counter(
            "bwprof.xfer.failed",
            &[("message", "SET_HIST_INFO"), ("stage", "acquire")]
        ),
        1
    );
}

//! Metrics emitted by the loopback transport, captured with a local
//! debugging recorder.

use bwprof_firmware::{LoopbackConfig, LoopbackTransport};
use bwprof_metrics::{metric_defs, metrics};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use scmi_bwprof::{BwprofProtocol, ScmiStatus, TransportError};

/// Counter total across series whose labels include every `(key, value)`.
fn counter(snapshotter: &Snapshotter, name: &str, labels: &[(&str, &str)]) -> u64 {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(composite, ..)| {
            let key = composite.key();
            key.name() == name
                && labels.iter().all(|(k, v)| {
                    key.labels()
                        .any(|label| label.key() == *k && label.value() == *v)
                })
        })
        .map(|(.., value)| match value {
            DebugValue::Counter(value) => value,
            _ => 0,
        })
        .sum()
}

fn gauge(snapshotter: &Snapshotter, name: &str) -> Option<f64> {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .find_map(|(composite, .., value)| match value {
            DebugValue::Gauge(value) if composite.key().name() == name => Some(value.0),
            _ => None,
        })
}

fn record<T>(f: impl FnOnce() -> T) -> (T, Snapshotter) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let result = metrics::with_local_recorder(&recorder, f);
    (result, snapshotter)
}

#[test]
fn test_success_and_submit_fault_balance() {
    let (_, snap) = record(|| {
        let proto = BwprofProtocol::init_instance(LoopbackTransport::default());
        proto.set_log_level(1).unwrap();
        proto.ops().fail_next_submit(TransportError::Timeout);
        assert!(proto.start_activity().is_err());
    });

    let acquired = counter(&snap, metric_defs::XFER_ACQUIRED.name, &[]);
    let released = counter(&snap, metric_defs::XFER_RELEASED.name, &[]);
    assert_eq!(acquired, 2);
    assert_eq!(acquired, released);

    for message in ["SET_LOG_LEVEL", "SET_ENABLE"] {
        let labels = [("message", message)];
        assert_eq!(counter(&snap, metric_defs::XFER_ACQUIRED.name, &labels), 1);
        assert_eq!(counter(&snap, metric_defs::XFER_SUBMITTED.name, &labels), 1);
        assert_eq!(counter(&snap, metric_defs::XFER_RELEASED.name, &labels), 1);
    }
    assert_eq!(
        counter(
            &snap,
            metric_defs::XFER_FAILED.name,
            &[("message", "SET_ENABLE"), ("stage", "submit")]
        ),
        1
    );
    assert_eq!(
        counter(
            &snap,
            metric_defs::XFER_FAILED.name,
            &[("message", "SET_LOG_LEVEL")]
        ),
        0
    );
    assert_eq!(gauge(&snap, metric_defs::XFER_IN_FLIGHT.name), Some(0.0));
}

#[test]
fn test_acquire_failure_counted() {
    let (_, snap) = record(|| {
        let proto = BwprofProtocol::init_instance(LoopbackTransport::new(LoopbackConfig {
            max_in_flight: 0,
            ..Default::default()
        }));
        assert!(proto.set_hist_info(&[1, 2, 3]).is_err());
    });

    assert_eq!(
        counter(
            &snap,
            metric_defs::XFER_FAILED.name,
            &[("message", "SET_HIST_INFO"), ("stage", "acquire")]
        ),
        1
    );
    assert_eq!(counter(&snap, metric_defs::XFER_ACQUIRED.name, &[]), 0);
    assert_eq!(counter(&snap, metric_defs::XFER_RELEASED.name, &[]), 0);
}

#[test]
fn test_firmware_rejection_counted() {
    let not_supported = ScmiStatus::NotSupported.to_string();
    let (_, snap) = record(|| {
        let proto = BwprofProtocol::init_instance(LoopbackTransport::new(LoopbackConfig {
            protocol_id: 0x81,
            ..Default::default()
        }));
        assert!(proto.set_masters_list(&[3]).is_err());
    });

    assert_eq!(
        counter(
            &snap,
            metric_defs::FIRMWARE_REJECTED.name,
            &[("message", "MASTER_LIST"), ("status", not_supported.as_str())]
        ),
        1
    );
    assert_eq!(
        counter(
            &snap,
            metric_defs::XFER_FAILED.name,
            &[("stage", "submit")]
        ),
        1
    );
    assert_eq!(
        counter(&snap, metric_defs::XFER_ACQUIRED.name, &[]),
        counter(&snap, metric_defs::XFER_RELEASED.name, &[])
    );
}

//! Metrics for the BWPROF transfer path.
//!
//! Every metric emitted by the transports and the simulated firmware is
//! declared once in [`metric_defs`]. Call sites use the declaration's name
//! together with the label helpers in this crate so label keys stay
//! consistent. The `metrics` crate is re-exported.
//!
//! ```rust,ignore
//! use bwprof_metrics::{metric_defs, metrics, stage_labels, Stage};
//!
//! bwprof_metrics::describe_metrics();
//! metrics::counter!(metric_defs::XFER_FAILED.name, &stage_labels("SET_ENABLE", Stage::Submit))
//!     .increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// How a metric records values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Monotonic count of events.
    Counter,
    /// Point-in-time level that moves both ways.
    Gauge,
    /// Distribution of recorded samples.
    Histogram,
}

/// A metric declaration.
#[derive(Debug, Clone)]
pub struct Metric {
    /// Dotted metric name, e.g. `bwprof.xfer.acquired`.
    pub name: &'static str,
    /// Recording kind.
    pub kind: MetricKind,
    /// Unit reported to the recorder.
    pub unit: Unit,
    /// One-line description.
    pub help: &'static str,
    /// Label keys every sample carries.
    pub labels: &'static [&'static str],
}

impl Metric {
    /// Declare an unlabelled metric.
    pub const fn new(kind: MetricKind, name: &'static str, unit: Unit, help: &'static str) -> Self {
        Metric {
            name,
            kind,
            unit,
            help,
            labels: &[],
        }
    }

    /// Attach the label keys samples carry.
    pub const fn labelled(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Register the description with the installed recorder.
    pub fn describe(&self) {
        match self.kind {
            MetricKind::Counter => describe_counter!(self.name, self.unit, self.help),
            MetricKind::Gauge => describe_gauge!(self.name, self.unit, self.help),
            MetricKind::Histogram => describe_histogram!(self.name, self.unit, self.help),
        }
    }
}

/// Where in its lifecycle a transfer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// `xfer_get_init` refused the transfer.
    Acquire,
    /// `do_xfer` failed or the firmware rejected the command.
    Submit,
}

impl Stage {
    /// Label value for this stage.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Stage::Acquire => "acquire",
            Stage::Submit => "submit",
        }
    }
}

/// Metric declarations.
pub mod metric_defs {
    use super::{Metric, MetricKind, Unit};

    /// Keys of per-message series.
    pub const MESSAGE: &[&str] = &["message"];
    /// Keys of per-message failure series.
    pub const MESSAGE_STAGE: &[&str] = &["message", "stage"];
    /// Keys of firmware rejection series.
    pub const MESSAGE_STATUS: &[&str] = &["message", "status"];

    /// Transfers acquired.
    pub const XFER_ACQUIRED: Metric = Metric::new(
        MetricKind::Counter,
        "bwprof.xfer.acquired",
        Unit::Count,
        "Transfers acquired from the channel",
    )
    .labelled(MESSAGE);

    /// Transfers released.
    pub const XFER_RELEASED: Metric = Metric::new(
        MetricKind::Counter,
        "bwprof.xfer.released",
        Unit::Count,
        "Transfers released back to the channel",
    )
    .labelled(MESSAGE);

    /// Transfers submitted.
    pub const XFER_SUBMITTED: Metric = Metric::new(
        MetricKind::Counter,
        "bwprof.xfer.submitted",
        Unit::Count,
        "Transfers submitted to the platform",
    )
    .labelled(MESSAGE);

    /// Failed transfers by stage.
    pub const XFER_FAILED: Metric = Metric::new(
        MetricKind::Counter,
        "bwprof.xfer.failed",
        Unit::Count,
        "Transfers that failed to acquire or submit",
    )
    .labelled(MESSAGE_STAGE);

    /// Transmit payload sizes.
    pub const XFER_PAYLOAD_BYTES: Metric = Metric::new(
        MetricKind::Histogram,
        "bwprof.xfer.payload_bytes",
        Unit::Bytes,
        "Transmit payload size per submitted transfer",
    )
    .labelled(MESSAGE);

    /// Outstanding transfers.
    pub const XFER_IN_FLIGHT: Metric = Metric::new(
        MetricKind::Gauge,
        "bwprof.xfer.in_flight",
        Unit::Count,
        "Transfers acquired and not yet released",
    );

    /// Firmware rejections by status.
    pub const FIRMWARE_REJECTED: Metric = Metric::new(
        MetricKind::Counter,
        "bwprof.firmware.rejected",
        Unit::Count,
        "Commands the firmware answered with an error status",
    )
    .labelled(MESSAGE_STATUS);

    /// Every declared metric.
    pub const ALL: &[&Metric] = &[
        &XFER_ACQUIRED,
        &XFER_RELEASED,
        &XFER_SUBMITTED,
        &XFER_FAILED,
        &XFER_PAYLOAD_BYTES,
        &XFER_IN_FLIGHT,
        &FIRMWARE_REJECTED,
    ];
}

/// Label set for per-message metrics.
pub fn message_labels(message: &str) -> Vec<(&'static str, String)> {
    vec![("message", message.to_string())]
}

/// Label set for [`metric_defs::XFER_FAILED`].
pub fn stage_labels(message: &str, stage: Stage) -> Vec<(&'static str, String)> {
    vec![
        ("message", message.to_string()),
        ("stage", stage.as_str().to_string()),
    ]
}

/// Label set for [`metric_defs::FIRMWARE_REJECTED`].
pub fn status_labels(message: &str, status: impl std::fmt::Display) -> Vec<(&'static str, String)> {
    vec![
        ("message", message.to_string()),
        ("status", status.to_string()),
    ]
}

/// Describe every BWPROF metric. Call once after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

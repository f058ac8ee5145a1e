//! Applying profiles to a BWPROF endpoint.

use std::fmt;

use bwprof_firmware::{CapturedXfer, LoopbackConfig, LoopbackTransport, MonitorState};
use scmi_bwprof::{status_code, BwprofOps, BwprofProtocol, BwprofResult};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::profile::BwprofProfile;

/// Send a profile through `ops`.
///
/// Commands go out in a fixed order: log level, masters, histogram buckets,
/// sample interval, enable. The first failure stops the sequence. Returns the
/// number of commands sent.
pub fn apply_profile<P: BwprofOps + ?Sized>(
    ops: &P,
    profile: &BwprofProfile,
) -> BwprofResult<usize> {
    let mut sent = 0;

    if let Some(level) = profile.log_level {
        debug!(level, "setting log level");
        ops.set_log_level(level)?;
        sent += 1;
    }
    if let Some(masters) = &profile.masters {
        debug!(?masters, "setting master list");
        ops.set_masters_list(masters)?;
        sent += 1;
    }
    if let Some(buckets) = &profile.histogram_buckets {
        debug!(?buckets, "setting histogram buckets");
        ops.set_hist_info(buckets)?;
        sent += 1;
    }
    if let Some(sampling) = profile.sampling {
        debug!(
            histogram = sampling.histogram,
            interval_ms = sampling.interval_ms,
            "setting sample interval"
        );
        ops.set_sample_ms(u8::from(sampling.histogram), sampling.interval_ms)?;
        sent += 1;
    }
    if let Some(enable) = profile.enable {
        debug!(enable, "setting sampling enable");
        ops.set_sampling_enable(u8::from(enable))?;
        sent += 1;
    }

    Ok(sent)
}

/// One transaction as seen by the firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub token: u16,
    /// Packed SCMI header word.
    pub header: u32,
    pub message_id: u8,
    pub message: String,
    /// Payload bytes in lowercase hex.
    pub payload: String,
    pub status: String,
}

impl From<&CapturedXfer> for TransactionRecord {
    fn from(xfer: &CapturedXfer) -> Self {
        TransactionRecord {
            token: xfer.header.token,
            header: xfer.header_word,
            message_id: xfer.header.message_id,
            message: xfer.message_name(),
            payload: hex::encode(&xfer.payload),
            status: xfer.status.to_string(),
        }
    }
}

/// Transfer accounting for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferCounts {
    pub acquired: u64,
    pub released: u64,
    pub failed: u64,
}

/// Outcome of applying a profile against the simulated firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Protocol version read at attach, as `major.minor`.
    pub version: Option<String>,
    pub transactions: Vec<TransactionRecord>,
    pub transfers: TransferCounts,
    /// Firmware monitor state after the run.
    pub state: MonitorState,
    /// Integer status of the run: 0, or the negative error number of the
    /// first failure.
    pub status: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApplyReport {
    /// Whether every command succeeded.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(version) = &self.version {
            writeln!(f, "protocol version {}", version)?;
        }
        for tx in &self.transactions {
            writeln!(
                f,
                "[{:>3}] {:<13} (0x{:02X}) payload={} status={}",
                tx.token, tx.message, tx.message_id, tx.payload, tx.status
            )?;
        }
        writeln!(
            f,
            "transfers: acquired={} released={} failed={}",
            self.transfers.acquired, self.transfers.released, self.transfers.failed
        )?;

        let state = &self.state;
        writeln!(f, "log level:  {}", state.log_level)?;
        writeln!(
            f,
            "sampling:   {} every {} ms ({})",
            if state.histogram() { "histogram" } else { "basic" },
            state.sample_ms,
            if state.enabled { "running" } else { "stopped" }
        )?;
        writeln!(f, "masters:    {:?}", state.masters)?;
        writeln!(f, "buckets:    {:?}", state.buckets)?;
        match &self.error {
            Some(error) => write!(f, "error:      {} (status {})", error, self.status),
            None => write!(f, "status:     {}", self.status),
        }
    }
}

/// Apply `profile` to a fresh simulated firmware and report what happened.
///
/// A failing command is recorded in the report rather than returned, so the
/// transactions sent before it stay visible.
pub fn run_profile(profile: &BwprofProfile, config: LoopbackConfig) -> ApplyReport {
    let proto = BwprofProtocol::init_instance(LoopbackTransport::new(config));
    let version = proto.version().map(|v| v.to_string());

    let result = apply_profile(&proto, profile);
    match &result {
        Ok(sent) => info!(sent, "profile applied"),
        Err(err) => warn!(%err, errno = err.errno(), "profile application stopped"),
    }

    let transport = proto.into_inner();
    let stats = transport.stats();
    ApplyReport {
        version,
        transactions: transport.captured().iter().map(TransactionRecord::from).collect(),
        transfers: TransferCounts {
            acquired: stats.acquired,
            released: stats.released,
            failed: stats.failed,
        },
        state: transport.state(),
        status: status_code(&result),
        error: result.err().map(|err| err.to_string()),
    }
}

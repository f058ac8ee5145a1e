//! Firmware-side model of the bandwidth monitor.
//!
//! Decodes BWPROF payloads the way the platform does and keeps the resulting
//! monitor configuration.

use scmi_bwprof::{
    Algorithm, BwprofMessage, BwprofRequest, MessageHeader, ScmiStatus, MAX_BUCKETS,
    PROTOCOL_ID_BWPROF,
};
use serde::{Deserialize, Serialize};

/// Monitor configuration held by the firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorState {
    /// Current log level.
    pub log_level: u8,
    /// Whether sampling is running.
    pub enabled: bool,
    /// Raw histogram flag from the last sample interval update.
    pub hist: u8,
    /// Algorithm context selected by the last sample interval update.
    pub algorithm: u64,
    /// Sampling interval in milliseconds.
    pub sample_ms: u16,
    /// Monitored master ids.
    pub masters: Vec<u8>,
    /// Histogram bucket boundaries.
    pub buckets: [u32; MAX_BUCKETS],
}

impl Default for MonitorState {
    fn default() -> Self {
        MonitorState {
            log_level: 0,
            enabled: false,
            hist: 0,
            algorithm: Algorithm::BasicMonitoring.id(),
            sample_ms: 0,
            masters: Vec::new(),
            buckets: [0; MAX_BUCKETS],
        }
    }
}

impl MonitorState {
    /// Whether histogram collection is selected.
    pub fn histogram(&self) -> bool {
        self.algorithm == Algorithm::Histogram.id()
    }
}

/// Platform endpoint for the BWPROF protocol.
#[derive(Debug, Clone)]
pub struct FirmwareModel {
    protocol_id: u8,
    state: MonitorState,
    accepted: u64,
    rejected: u64,
}

impl Default for FirmwareModel {
    fn default() -> Self {
        Self::new(PROTOCOL_ID_BWPROF)
    }
}

impl FirmwareModel {
    /// Create a model serving `protocol_id`.
    pub fn new(protocol_id: u8) -> Self {
        FirmwareModel {
            protocol_id,
            state: MonitorState::default(),
            accepted: 0,
            rejected: 0,
        }
    }

    /// Current monitor configuration.
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Number of commands applied.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Number of commands rejected.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Handle one command message and return the platform status.
    pub fn handle(&mut self, hdr: &MessageHeader, payload: &[u8]) -> ScmiStatus {
        let status = self.dispatch(hdr, payload);
        if status.is_success() {
            self.accepted += 1;
        } else {
            self.rejected += 1;
            log::debug!(
                "firmware rejected msg 0x{:02X} ({} bytes): {}",
                hdr.message_id,
                payload.len(),
                status
            );
        }
        status
    }

    fn dispatch(&mut self, hdr: &MessageHeader, payload: &[u8]) -> ScmiStatus {
        if hdr.protocol_id != self.protocol_id {
            return ScmiStatus::NotSupported;
        }
        let message = match BwprofMessage::try_from(hdr.message_id) {
            Ok(message) => message,
            Err(_) => return ScmiStatus::NotSupported,
        };
        match BwprofRequest::decode(message, payload) {
            Ok(request) => {
                self.apply(&request);
                ScmiStatus::Success
            }
            Err(_) => ScmiStatus::InvalidParameters,
        }
    }

    fn apply(&mut self, request: &BwprofRequest) {
        match request {
            BwprofRequest::SetLogLevel(level) => self.state.log_level = level.0,
            BwprofRequest::SetSampleMs(sample) => {
                self.state.hist = sample.hist;
                self.state.algorithm = sample.algorithm().id();
                self.state.sample_ms = sample.interval_ms;
            }
            BwprofRequest::MasterList(list) => self.state.masters = list.as_slice().to_vec(),
            BwprofRequest::SetEnable(flag) => self.state.enabled = flag.is_enabled(),
            BwprofRequest::SetHistInfo(buckets) => self.state.buckets = buckets.0,
        }
        log::trace!("firmware applied {}", request.message());
    }
}

//! Commands that can be sent to the BWPROF firmware monitor.

use bytes::BufMut;

use crate::records::*;

/// A single BWPROF parameter update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BwprofRequest {
    /// Set the monitor log level.
    SetLogLevel(LogLevel),
    /// Set the sampling interval and histogram flag.
    SetSampleMs(SampleInterval),
    /// Replace the monitored master list.
    MasterList(MasterList),
    /// Enable or disable sampling.
    SetEnable(EnableFlag),
    /// Set histogram bucket boundaries.
    SetHistInfo(HistBuckets),
}

impl BwprofRequest {
    /// Request that starts sampling.
    pub fn start() -> Self {
        BwprofRequest::SetEnable(EnableFlag::ON)
    }

    /// Request that stops sampling.
    pub fn stop() -> Self {
        BwprofRequest::SetEnable(EnableFlag::OFF)
    }

    /// Get the message this request is sent as.
    pub fn message(&self) -> BwprofMessage {
        match self {
            BwprofRequest::SetLogLevel(_) => LogLevel::MESSAGE,
            BwprofRequest::SetSampleMs(_) => SampleInterval::MESSAGE,
            BwprofRequest::MasterList(_) => MasterList::MESSAGE,
            BwprofRequest::SetEnable(_) => EnableFlag::MESSAGE,
            BwprofRequest::SetHistInfo(_) => HistBuckets::MESSAGE,
        }
    }

    /// Packed payload size.
    pub fn payload_size(&self) -> usize {
        self.message().payload_size()
    }

    /// Algorithm context the request applies to.
    ///
    /// Only the sample interval selects a context; everything else targets
    /// basic monitoring.
    pub fn algorithm(&self) -> Algorithm {
        match self {
            BwprofRequest::SetSampleMs(sample) => sample.algorithm(),
            _ => Algorithm::BasicMonitoring,
        }
    }

    /// Write the payload into `buf`.
    pub fn encode_into<B: BufMut>(&self, buf: &mut B) {
        match self {
            BwprofRequest::SetLogLevel(record) => record.encode_into(buf),
            BwprofRequest::SetSampleMs(record) => record.encode_into(buf),
            BwprofRequest::MasterList(record) => record.encode_into(buf),
            BwprofRequest::SetEnable(record) => record.encode_into(buf),
            BwprofRequest::SetHistInfo(record) => record.encode_into(buf),
        }
    }

    /// Encode the payload to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.payload_size());
        self.encode_into(&mut buf);
        buf
    }

    /// Decode a payload received under `message`.
    pub fn decode(
        message: BwprofMessage,
        payload: &[u8],
    ) -> Result<Self, crate::DecodeError> {
        Ok(match message {
            BwprofMessage::SetLogLevel => BwprofRequest::SetLogLevel(LogLevel::decode(payload)?),
            BwprofMessage::SetSampleMs => {
                BwprofRequest::SetSampleMs(SampleInterval::decode(payload)?)
            }
            BwprofMessage::MasterList => BwprofRequest::MasterList(MasterList::decode(payload)?),
            BwprofMessage::SetEnable => BwprofRequest::SetEnable(EnableFlag::decode(payload)?),
            BwprofMessage::SetHistInfo => {
                BwprofRequest::SetHistInfo(HistBuckets::decode(payload)?)
            }
        })
    }
}

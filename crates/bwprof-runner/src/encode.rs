//! Single-command encoding for the `encode` subcommand.

use std::fmt;

use clap::Subcommand;
use scmi_bwprof::{
    BwprofMessage, BwprofRequest, EnableFlag, HistBuckets, LogLevel, MasterList, SampleInterval,
    MAX_BUCKETS,
};

use crate::error::RunnerError;

/// A BWPROF command given on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum EncodeCommand {
    /// SET_LOG_LEVEL with a raw level byte
    LogLevel { level: u8 },
    /// SET_ENABLE with a raw enable byte
    Enable { value: u8 },
    /// SET_ENABLE 1
    Start,
    /// SET_ENABLE 0
    Stop,
    /// SET_SAMPLE_MS
    SampleMs {
        interval_ms: u16,
        /// Select the histogram algorithm
        #[arg(long)]
        histogram: bool,
    },
    /// MASTER_LIST with up to three master ids
    Masters { ids: Vec<u8> },
    /// SET_HIST_INFO with three bucket boundaries
    Buckets {
        #[arg(num_args = MAX_BUCKETS)]
        bounds: Vec<u32>,
    },
}

impl EncodeCommand {
    /// Build the protocol request for this command.
    pub fn request(&self) -> Result<BwprofRequest, RunnerError> {
        let request = match self {
            EncodeCommand::LogLevel { level } => BwprofRequest::SetLogLevel(LogLevel(*level)),
            EncodeCommand::Enable { value } => BwprofRequest::SetEnable(EnableFlag(*value)),
            EncodeCommand::Start => BwprofRequest::start(),
            EncodeCommand::Stop => BwprofRequest::stop(),
            EncodeCommand::SampleMs {
                interval_ms,
                histogram,
            } => BwprofRequest::SetSampleMs(SampleInterval::new(*histogram, *interval_ms)),
            EncodeCommand::Masters { ids } => BwprofRequest::MasterList(MasterList::new(ids)?),
            EncodeCommand::Buckets { bounds } => {
                let buckets: [u32; MAX_BUCKETS] =
                    bounds.as_slice().try_into().map_err(|_| {
                        RunnerError::InvalidArgument(format!(
                            "expected {} bucket boundaries, got {}",
                            MAX_BUCKETS,
                            bounds.len()
                        ))
                    })?;
                BwprofRequest::SetHistInfo(HistBuckets(buckets))
            }
        };
        Ok(request)
    }

    /// Encode this command.
    pub fn encode(&self) -> Result<EncodedCommand, RunnerError> {
        let request = self.request()?;
        Ok(EncodedCommand {
            message: request.message(),
            payload: request.encode(),
        })
    }
}

/// An encoded command ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCommand {
    pub message: BwprofMessage,
    pub payload: Vec<u8>,
}

impl fmt::Display for EncodedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (0x{:02X}): {}",
            self.message.name(),
            self.message.id(),
            hex::encode(&self.payload)
        )
    }
}

/// Parse a protocol version word in hex (`0x00010002`) or decimal.
pub fn parse_version_word(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid version word '{}': {}", s, e))
}

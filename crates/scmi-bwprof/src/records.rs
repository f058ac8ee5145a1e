//! Fixed-layout wire records.
//!
//! Each BWPROF message carries exactly one byte-packed record. All multi-byte
//! fields are little-endian on the wire.
//!
//! ```text
//! SET_LOG_LEVEL   +-------+
//!                 | level |
//!                 +-------+
//! SET_SAMPLE_MS   +------+--------+--------+
//!                 | hist | ms_lo  | ms_hi  |
//!                 +------+--------+--------+
//! MASTER_LIST     +-----+----+----+----+
//!                 | cnt | m0 | m1 | m2 |
//!                 +-----+----+----+----+
//! SET_ENABLE      +--------+
//!                 | enable |
//!                 +--------+
//! SET_HIST_INFO   +-----------+-----------+-----------+
//!                 | bucket0   | bucket1   | bucket2   |  (u32 LE each)
//!                 +-----------+-----------+-----------+
//! ```

use bytes::{Buf, BufMut};

use crate::constants::*;
use crate::error::{BwprofError, DecodeError};

// ============================================================================
// Message Ids
// ============================================================================

/// The five BWPROF messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BwprofMessage {
    /// Set the monitor log level.
    SetLogLevel = MSG_SET_LOG_LEVEL,
    /// Set the sampling interval.
    SetSampleMs = MSG_SET_SAMPLE_MS,
    /// Set the monitored master list.
    MasterList = MSG_MASTER_LIST,
    /// Enable or disable sampling.
    SetEnable = MSG_SET_ENABLE,
    /// Set histogram bucket boundaries.
    SetHistInfo = MSG_SET_HIST_INFO,
}

impl BwprofMessage {
    /// All messages in message-id order.
    pub const ALL: [BwprofMessage; 5] = [
        BwprofMessage::SetLogLevel,
        BwprofMessage::SetSampleMs,
        BwprofMessage::MasterList,
        BwprofMessage::SetEnable,
        BwprofMessage::SetHistInfo,
    ];

    /// Message id on the wire.
    pub fn id(&self) -> u8 {
        *self as u8
    }

    /// Payload size of the record this message carries.
    pub fn payload_size(&self) -> usize {
        match self {
            BwprofMessage::SetLogLevel => LogLevel::SIZE,
            BwprofMessage::SetSampleMs => SampleInterval::SIZE,
            BwprofMessage::MasterList => MasterList::SIZE,
            BwprofMessage::SetEnable => EnableFlag::SIZE,
            BwprofMessage::SetHistInfo => HistBuckets::SIZE,
        }
    }

    /// Upper-case protocol name.
    pub fn name(&self) -> &'static str {
        match self {
            BwprofMessage::SetLogLevel => "SET_LOG_LEVEL",
            BwprofMessage::SetSampleMs => "SET_SAMPLE_MS",
            BwprofMessage::MasterList => "MASTER_LIST",
            BwprofMessage::SetEnable => "SET_ENABLE",
            BwprofMessage::SetHistInfo => "SET_HIST_INFO",
        }
    }
}

impl std::fmt::Display for BwprofMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for BwprofMessage {
    type Error = DecodeError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            MSG_SET_LOG_LEVEL => Ok(BwprofMessage::SetLogLevel),
            MSG_SET_SAMPLE_MS => Ok(BwprofMessage::SetSampleMs),
            MSG_MASTER_LIST => Ok(BwprofMessage::MasterList),
            MSG_SET_ENABLE => Ok(BwprofMessage::SetEnable),
            MSG_SET_HIST_INFO => Ok(BwprofMessage::SetHistInfo),
            _ => Err(DecodeError::UnknownMessage(id)),
        }
    }
}

// ============================================================================
// Algorithm Context
// ============================================================================

/// Firmware algorithm context a command applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Plain bandwidth monitoring.
    BasicMonitoring,
    /// Histogram collection.
    Histogram,
}

impl Algorithm {
    /// Select the context from a histogram flag byte.
    pub fn from_hist_flag(hist: u8) -> Self {
        if hist != 0 {
            Algorithm::Histogram
        } else {
            Algorithm::BasicMonitoring
        }
    }

    /// Algorithm identifier.
    pub fn id(&self) -> u64 {
        match self {
            Algorithm::BasicMonitoring => ALGO_BASIC_MONITORING,
            Algorithm::Histogram => ALGO_HISTOGRAM,
        }
    }
}

// ============================================================================
// Record Trait
// ============================================================================

/// A fixed-size record carried by exactly one BWPROF message.
pub trait Record: Sized {
    /// Message that carries this record.
    const MESSAGE: BwprofMessage;
    /// Packed size in bytes.
    const SIZE: usize;

    /// Write the packed record. Exactly `SIZE` bytes are written.
    fn encode_into<B: BufMut>(&self, buf: &mut B);

    /// Parse a packed record. The payload must be exactly `SIZE` bytes.
    fn decode(payload: &[u8]) -> Result<Self, DecodeError>;

    /// Encode to a freshly allocated buffer.
    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        self.encode_into(&mut buf);
        buf
    }
}

fn check_len(message: BwprofMessage, expected: usize, payload: &[u8]) -> Result<(), DecodeError> {
    if payload.len() != expected {
        return Err(DecodeError::Length {
            message,
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

// ============================================================================
// Records
// ============================================================================

/// Monitor log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogLevel(pub u8);

impl Record for LogLevel {
    const MESSAGE: BwprofMessage = BwprofMessage::SetLogLevel;
    const SIZE: usize = 1;

    fn encode_into<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.0);
    }

    fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        check_len(Self::MESSAGE, Self::SIZE, payload)?;
        Ok(LogLevel(payload[0]))
    }
}

/// Sampling enable flag.
///
/// The byte is passed through unchanged; firmware treats non-zero as enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnableFlag(pub u8);

impl EnableFlag {
    /// Sampling on.
    pub const ON: EnableFlag = EnableFlag(1);
    /// Sampling off.
    pub const OFF: EnableFlag = EnableFlag(0);

    /// Whether the flag requests sampling.
    pub fn is_enabled(&self) -> bool {
        self.0 != 0
    }
}

impl From<bool> for EnableFlag {
    fn from(enabled: bool) -> Self {
        if enabled {
            EnableFlag::ON
        } else {
            EnableFlag::OFF
        }
    }
}

impl Record for EnableFlag {
    const MESSAGE: BwprofMessage = BwprofMessage::SetEnable;
    const SIZE: usize = 1;

    fn encode_into<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.0);
    }

    fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        check_len(Self::MESSAGE, Self::SIZE, payload)?;
        Ok(EnableFlag(payload[0]))
    }
}

/// Sampling interval and histogram flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleInterval {
    /// Histogram flag byte. Non-zero selects the histogram context.
    pub hist: u8,
    /// Sampling interval in milliseconds.
    pub interval_ms: u16,
}

impl SampleInterval {
    /// Create a sample interval record.
    pub fn new(histogram: bool, interval_ms: u16) -> Self {
        SampleInterval {
            hist: u8::from(histogram),
            interval_ms,
        }
    }

    /// Algorithm context selected by the histogram flag.
    pub fn algorithm(&self) -> Algorithm {
        Algorithm::from_hist_flag(self.hist)
    }
}

impl Record for SampleInterval {
    const MESSAGE: BwprofMessage = BwprofMessage::SetSampleMs;
    const SIZE: usize = 3;

    fn encode_into<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.hist);
        buf.put_u16_le(self.interval_ms);
    }

    fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        check_len(Self::MESSAGE, Self::SIZE, payload)?;
        let mut buf = payload;
        Ok(SampleInterval {
            hist: buf.get_u8(),
            interval_ms: buf.get_u16_le(),
        })
    }
}

/// List of up to [`MAX_MASTERS`] bus master ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MasterList {
    count: u8,
    masters: [u8; MAX_MASTERS],
}

impl MasterList {
    /// Build a master list, rejecting more than [`MAX_MASTERS`] ids.
    pub fn new(masters: &[u8]) -> Result<Self, BwprofError> {
        if masters.len() > MAX_MASTERS {
            return Err(BwprofError::TooManyMasters {
                count: masters.len(),
                max: MAX_MASTERS,
            });
        }
        let mut slots = [0u8; MAX_MASTERS];
        slots[..masters.len()].copy_from_slice(masters);
        Ok(MasterList {
            count: masters.len() as u8,
            masters: slots,
        })
    }

    /// Number of masters in the list.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The populated master ids.
    pub fn as_slice(&self) -> &[u8] {
        &self.masters[..self.len()]
    }
}

impl Record for MasterList {
    const MESSAGE: BwprofMessage = BwprofMessage::MasterList;
    const SIZE: usize = 1 + MAX_MASTERS;

    fn encode_into<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.count);
        buf.put_slice(&self.masters);
    }

    fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        check_len(Self::MESSAGE, Self::SIZE, payload)?;
        let count = payload[0];
        if count as usize > MAX_MASTERS {
            return Err(DecodeError::MasterCount(count));
        }
        let mut masters = [0u8; MAX_MASTERS];
        masters.copy_from_slice(&payload[1..]);
        Ok(MasterList { count, masters })
    }
}

/// Histogram bucket boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistBuckets(pub [u32; MAX_BUCKETS]);

impl Record for HistBuckets {
    const MESSAGE: BwprofMessage = BwprofMessage::SetHistInfo;
    const SIZE: usize = 4 * MAX_BUCKETS;

    fn encode_into<B: BufMut>(&self, buf: &mut B) {
        for bucket in self.0 {
            buf.put_u32_le(bucket);
        }
    }

    fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        check_len(Self::MESSAGE, Self::SIZE, payload)?;
        let mut buf = payload;
        let mut buckets = [0u32; MAX_BUCKETS];
        for bucket in buckets.iter_mut() {
            *bucket = buf.get_u32_le();
        }
        Ok(HistBuckets(buckets))
    }
}

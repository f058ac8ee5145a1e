//! Protocol error types.

use crate::status::{errno, ScmiStatus};
use crate::BwprofMessage;
use thiserror::Error;

/// Result type alias for BWPROF operations.
pub type BwprofResult<T> = Result<T, BwprofError>;

/// Errors reported by a transfer-ops implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No transfer slot could be allocated.
    #[error("no transfer slot available")]
    NoSlot,

    /// Requested payload is larger than the channel supports.
    #[error("message too large: maximum {max} bytes, requested {size}")]
    MessageTooLarge {
        /// Requested size.
        size: usize,
        /// Channel maximum.
        max: usize,
    },

    /// Platform did not complete the exchange in time.
    #[error("timed out waiting for platform")]
    Timeout,

    /// Platform completed the exchange with an error status.
    #[error("platform returned {0}")]
    Platform(ScmiStatus),

    /// Transport specific failure, carried as a negative error number.
    #[error("transport error {0}")]
    Other(i32),
}

impl TransportError {
    /// Negative host error number for this failure.
    pub fn errno(&self) -> i32 {
        match self {
            TransportError::NoSlot => -errno::ENOMEM,
            TransportError::MessageTooLarge { .. } => -errno::ERANGE,
            TransportError::Timeout => -errno::ETIMEDOUT,
            TransportError::Platform(status) => status.to_errno(),
            TransportError::Other(code) => *code,
        }
    }
}

/// Errors that can occur when issuing BWPROF commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BwprofError {
    /// The operation is not provided by this protocol.
    #[error("operation not supported")]
    NotSupported,

    /// Master list exceeds the record capacity.
    #[error("too many masters: maximum {max}, got {count}")]
    TooManyMasters {
        /// Requested master count.
        count: usize,
        /// Record capacity.
        max: usize,
    },

    /// Parameter id does not name a BWPROF message.
    #[error("unknown message id: {0}")]
    UnknownMessage(u32),

    /// Raw payload does not match the record size of its message.
    #[error("payload for {message} must be {expected} bytes, got {actual}")]
    PayloadSize {
        /// Target message.
        message: BwprofMessage,
        /// Record size.
        expected: usize,
        /// Supplied size.
        actual: usize,
    },

    /// The host handed back a transmit buffer of the wrong size.
    #[error("transfer buffer for {message} holds {actual} bytes, expected {expected}")]
    BufferSize {
        /// Target message.
        message: BwprofMessage,
        /// Record size.
        expected: usize,
        /// Buffer size returned by the host.
        actual: usize,
    },

    /// Acquiring a transfer failed.
    #[error("transfer init failed: {0}")]
    Acquire(TransportError),

    /// Submitting the transfer failed.
    #[error("transfer failed: {0}")]
    Transfer(TransportError),
}

impl BwprofError {
    /// Flatten this error to the negative integer status reported to callers.
    pub fn errno(&self) -> i32 {
        match self {
            BwprofError::NotSupported => -errno::EOPNOTSUPP,
            BwprofError::TooManyMasters { .. }
            | BwprofError::UnknownMessage(_)
            | BwprofError::PayloadSize { .. }
            | BwprofError::BufferSize { .. } => -errno::EINVAL,
            BwprofError::Acquire(err) | BwprofError::Transfer(err) => err.errno(),
        }
    }

    /// Whether the error came from argument checks alone, without the
    /// transport being involved.
    pub fn is_local(&self) -> bool {
        !matches!(
            self,
            BwprofError::Acquire(_) | BwprofError::Transfer(_) | BwprofError::BufferSize { .. }
        )
    }
}

impl From<DecodeError> for BwprofError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Length {
                message,
                expected,
                actual,
            } => BwprofError::PayloadSize {
                message,
                expected,
                actual,
            },
            DecodeError::MasterCount(count) => BwprofError::TooManyMasters {
                count: count as usize,
                max: crate::MAX_MASTERS,
            },
            DecodeError::UnknownMessage(id) => BwprofError::UnknownMessage(id as u32),
        }
    }
}

/// Flatten a result to the integer status convention: 0 on success, a
/// negative error number otherwise.
pub fn status_code<T>(result: &BwprofResult<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => err.errno(),
    }
}

/// Errors raised while decoding a BWPROF payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload length does not match the record size.
    #[error("{message} payload must be {expected} bytes, got {actual}")]
    Length {
        /// Message being decoded.
        message: BwprofMessage,
        /// Record size.
        expected: usize,
        /// Received size.
        actual: usize,
    },

    /// Master count byte exceeds the record capacity.
    #[error("master count {0} exceeds capacity")]
    MasterCount(u8),

    /// Message id is not a BWPROF message.
    #[error("unknown message id: 0x{0:02X}")]
    UnknownMessage(u8),
}

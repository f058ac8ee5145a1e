//! SCMI status codes and their host error-number equivalents.

/// Host error numbers used when flattening errors to a single integer status.
pub mod errno {
    /// No such entry.
    pub const ENOENT: i32 = 2;
    /// I/O error.
    pub const EIO: i32 = 5;
    /// Out of memory.
    pub const ENOMEM: i32 = 12;
    /// Permission denied.
    pub const EACCES: i32 = 13;
    /// Device or resource busy.
    pub const EBUSY: i32 = 16;
    /// Invalid argument.
    pub const EINVAL: i32 = 22;
    /// Result out of range.
    pub const ERANGE: i32 = 34;
    /// Communication error on send.
    pub const ECOMM: i32 = 70;
    /// Protocol error.
    pub const EPROTO: i32 = 71;
    /// Operation not supported.
    pub const EOPNOTSUPP: i32 = 95;
    /// Connection timed out.
    pub const ETIMEDOUT: i32 = 110;
    /// Remote I/O error.
    pub const EREMOTEIO: i32 = 121;
}

/// Status returned by the platform in a response message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScmiStatus {
    /// Command completed.
    Success,
    /// Command or protocol not supported.
    NotSupported,
    /// Parameters were malformed or out of range.
    InvalidParameters,
    /// Caller lacks permission.
    Denied,
    /// Target entity not found.
    NotFound,
    /// Requested value out of range.
    OutOfRange,
    /// Platform is busy.
    Busy,
    /// Communication error.
    CommsError,
    /// Unspecified platform error.
    GenericError,
    /// Hardware fault.
    HardwareError,
    /// Protocol violation.
    ProtocolError,
    /// Status value outside the standard range.
    Unknown(i32),
}

impl ScmiStatus {
    /// Whether this status reports success.
    pub fn is_success(&self) -> bool {
        matches!(self, ScmiStatus::Success)
    }

    /// Negative host error number for this status (0 for success).
    pub fn to_errno(&self) -> i32 {
        match self {
            ScmiStatus::Success => 0,
            ScmiStatus::NotSupported => -errno::EOPNOTSUPP,
            ScmiStatus::InvalidParameters => -errno::EINVAL,
            ScmiStatus::Denied => -errno::EACCES,
            ScmiStatus::NotFound => -errno::ENOENT,
            ScmiStatus::OutOfRange => -errno::ERANGE,
            ScmiStatus::Busy => -errno::EBUSY,
            ScmiStatus::CommsError => -errno::ECOMM,
            ScmiStatus::GenericError => -errno::EIO,
            ScmiStatus::HardwareError => -errno::EREMOTEIO,
            ScmiStatus::ProtocolError => -errno::EPROTO,
            ScmiStatus::Unknown(_) => -errno::EIO,
        }
    }
}

impl std::fmt::Display for ScmiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScmiStatus::Success => write!(f, "success"),
            ScmiStatus::NotSupported => write!(f, "not supported"),
            ScmiStatus::InvalidParameters => write!(f, "invalid parameters"),
            ScmiStatus::Denied => write!(f, "denied"),
            ScmiStatus::NotFound => write!(f, "not found"),
            ScmiStatus::OutOfRange => write!(f, "out of range"),
            ScmiStatus::Busy => write!(f, "busy"),
            ScmiStatus::CommsError => write!(f, "communication error"),
            ScmiStatus::GenericError => write!(f, "generic error"),
            ScmiStatus::HardwareError => write!(f, "hardware error"),
            ScmiStatus::ProtocolError => write!(f, "protocol error"),
            ScmiStatus::Unknown(code) => write!(f, "unknown status ({})", code),
        }
    }
}

impl From<i32> for ScmiStatus {
    fn from(code: i32) -> Self {
        match code {
            0 => ScmiStatus::Success,
            -1 => ScmiStatus::NotSupported,
            -2 => ScmiStatus::InvalidParameters,
            -3 => ScmiStatus::Denied,
            -4 => ScmiStatus::NotFound,
            -5 => ScmiStatus::OutOfRange,
            -6 => ScmiStatus::Busy,
            -7 => ScmiStatus::CommsError,
            -8 => ScmiStatus::GenericError,
            -9 => ScmiStatus::HardwareError,
            -10 => ScmiStatus::ProtocolError,
            _ => ScmiStatus::Unknown(code),
        }
    }
}

impl From<ScmiStatus> for i32 {
    fn from(status: ScmiStatus) -> Self {
        match status {
            ScmiStatus::Success => 0,
            ScmiStatus::NotSupported => -1,
            ScmiStatus::InvalidParameters => -2,
            ScmiStatus::Denied => -3,
            ScmiStatus::NotFound => -4,
            ScmiStatus::OutOfRange => -5,
            ScmiStatus::Busy => -6,
            ScmiStatus::CommsError => -7,
            ScmiStatus::GenericError => -8,
            ScmiStatus::HardwareError => -9,
            ScmiStatus::ProtocolError => -10,
            ScmiStatus::Unknown(code) => code,
        }
    }
}

//! Protocol constants
//!
//! Message identifiers, record capacities and algorithm identifiers used by
//! the BWPROF vendor protocol.

// ============================================================================
// Protocol Identity
// ============================================================================

/// SCMI protocol id the vendor protocol is registered under.
pub const PROTOCOL_ID_BWPROF: u8 = 0x80;

/// First message id available to vendor modules.
///
/// Ids below this value are reserved for the standard SCMI protocol
/// messages (version, attributes, message attributes, ...).
pub const VENDOR_MSG_MODULE_START: u8 = 16;

// ============================================================================
// Message Ids (agent → platform)
// ============================================================================

/// Set the firmware monitor's log level.
pub const MSG_SET_LOG_LEVEL: u8 = VENDOR_MSG_MODULE_START;
/// Set the sampling interval and histogram flag.
pub const MSG_SET_SAMPLE_MS: u8 = VENDOR_MSG_MODULE_START + 1;
/// Set the list of monitored bus masters.
pub const MSG_MASTER_LIST: u8 = VENDOR_MSG_MODULE_START + 2;
/// Enable or disable sampling.
pub const MSG_SET_ENABLE: u8 = VENDOR_MSG_MODULE_START + 3;
/// Set the histogram bucket boundaries.
pub const MSG_SET_HIST_INFO: u8 = VENDOR_MSG_MODULE_START + 4;

// ============================================================================
// Record Capacities
// ============================================================================

/// Maximum number of masters in a master list.
pub const MAX_MASTERS: usize = 3;
/// Number of histogram bucket boundaries.
pub const MAX_BUCKETS: usize = 3;

/// Receive size used for every BWPROF transfer. The protocol is write-only.
pub const NO_RESPONSE_PAYLOAD: usize = 0;

// ============================================================================
// Algorithm Identifiers
// ============================================================================

/// Basic bandwidth monitoring algorithm context.
pub const ALGO_BASIC_MONITORING: u64 = 0x01;
/// Histogram algorithm context.
pub const ALGO_HISTOGRAM: u64 = 0x02;

// ============================================================================
// Version Layout
// ============================================================================

/// Mask of the major revision field of a protocol version word.
pub const PROTOCOL_REV_MAJOR_MASK: u32 = 0xFFFF_0000;
/// Mask of the minor revision field of a protocol version word.
pub const PROTOCOL_REV_MINOR_MASK: u32 = 0x0000_FFFF;

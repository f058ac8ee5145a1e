//! SCMI BWPROF Vendor Protocol
//!
//! This crate encodes the bandwidth profiling (BWPROF) vendor extension of
//! SCMI. The OS uses it to configure a firmware-side bandwidth monitor: log
//! level, sampling interval, monitored bus masters, histogram buckets and
//! sampling enable.
//!
//! # Protocol Overview
//!
//! The protocol is write-only. Each operation sends one fixed-size,
//! little-endian record under its own message id and expects no response
//! payload:
//!
//! | Message         | Id | Payload                              |
//! |-----------------|----|--------------------------------------|
//! | `SET_LOG_LEVEL` | 16 | level (1)                            |
//! | `SET_SAMPLE_MS` | 17 | hist flag (1) + interval ms (2, LE)  |
//! | `MASTER_LIST`   | 18 | count (1) + 3 master ids (1 each)    |
//! | `SET_ENABLE`    | 19 | enable (1)                           |
//! | `SET_HIST_INFO` | 20 | 3 bucket boundaries (4 each, LE)     |
//!
//! Reads are not supported. Start and stop are `SET_ENABLE` with 1 and 0.
//!
//! The transport is supplied by the host through [`XferOps`].
//!
//! # Example
//!
//! ```rust,ignore
//! use scmi_bwprof::{BwprofProtocol, BwprofOps};
//!
//! let proto = BwprofProtocol::init_instance(host_xfer_ops);
//! proto.set_masters_list(&[1, 4])?;
//! proto.set_sample_ms(1, 100)?;
//! proto.start_activity()?;
//! ```

mod constants;
mod error;
mod ops;
mod protocol;
mod records;
mod request;
mod status;
mod xfer;

pub use constants::*;
pub use error::*;
pub use ops::*;
pub use protocol::*;
pub use records::*;
pub use request::*;
pub use status::*;
pub use xfer::*;

//! # bwprof-firmware
//!
//! Simulated BWPROF firmware for exercising the protocol without hardware.
//!
//! [`FirmwareModel`] decodes commands the way the platform does and keeps the
//! monitor configuration. [`LoopbackTransport`] implements the host transfer
//! ops on top of it, accounting for every acquire/release pair.
//!
//! ## Usage
//!
//! ```
//! use bwprof_firmware::LoopbackTransport;
//! use scmi_bwprof::BwprofProtocol;
//!
//! let proto = BwprofProtocol::init_instance(LoopbackTransport::default());
//! proto.set_masters_list(&[1, 2])?;
//! proto.start_activity()?;
//!
//! let transport = proto.ops();
//! assert!(transport.state().enabled);
//! assert_eq!(transport.stats().acquired, transport.stats().released);
//! # Ok::<(), scmi_bwprof::BwprofError>(())
//! ```

mod loopback;
mod model;

pub use loopback::{
    CapturedXfer, LoopbackConfig, LoopbackTransport, XferStats, DEFAULT_MAX_IN_FLIGHT,
    DEFAULT_MAX_MSG_SIZE,
};
pub use model::{FirmwareModel, MonitorState};

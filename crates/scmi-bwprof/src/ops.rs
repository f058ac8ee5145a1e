//! Operation tables exposed to other subsystems.
//!
//! Two tables exist. [`VendorOps`] is the generic vendor-protocol surface
//! (raw parameter set/get plus start/stop). [`BwprofOps`] is the typed
//! per-parameter surface. Both are served by [`BwprofProtocol`].

use crate::constants::MAX_BUCKETS;
use crate::error::BwprofResult;
use crate::protocol::BwprofProtocol;
use crate::xfer::XferOps;

/// Generic vendor protocol operations.
pub trait VendorOps {
    /// Send a raw parameter payload for `param_id`.
    fn set_param(&self, algo: u64, param_id: u32, payload: &[u8]) -> BwprofResult<()>;

    /// Read a parameter. Not supported by write-only protocols.
    fn get_param(&self, algo: u64, param_id: u32, tx: &[u8], rx: &mut [u8])
        -> BwprofResult<()>;

    /// Start the activity for `algo`.
    fn start_activity(&self, algo: u64) -> BwprofResult<()>;

    /// Stop the activity for `algo`.
    fn stop_activity(&self, algo: u64) -> BwprofResult<()>;
}

/// Typed BWPROF parameter operations.
pub trait BwprofOps {
    /// Set the monitor log level.
    fn set_log_level(&self, level: u8) -> BwprofResult<()>;

    /// Set the sampling interval and histogram flag.
    fn set_sample_ms(&self, hist: u8, interval_ms: u16) -> BwprofResult<()>;

    /// Replace the monitored master list (at most three ids).
    fn set_masters_list(&self, masters: &[u8]) -> BwprofResult<()>;

    /// Enable or disable sampling.
    fn set_sampling_enable(&self, enable: u8) -> BwprofResult<()>;

    /// Set the histogram bucket boundaries.
    fn set_hist_info(&self, buckets: &[u32; MAX_BUCKETS]) -> BwprofResult<()>;
}

impl<T: XferOps> VendorOps for BwprofProtocol<T> {
    fn set_param(&self, algo: u64, param_id: u32, payload: &[u8]) -> BwprofResult<()> {
        BwprofProtocol::set_param(self, algo, param_id, payload)
    }

    fn get_param(
        &self,
        algo: u64,
        param_id: u32,
        tx: &[u8],
        rx: &mut [u8],
    ) -> BwprofResult<()> {
        BwprofProtocol::get_param(self, algo, param_id, tx, rx)
    }

    // The algorithm id does not reach the wire; enable is global.
    fn start_activity(&self, _algo: u64) -> BwprofResult<()> {
        BwprofProtocol::start_activity(self)
    }

    fn stop_activity(&self, _algo: u64) -> BwprofResult<()> {
        BwprofProtocol::stop_activity(self)
    }
}

impl<T: XferOps> BwprofOps for BwprofProtocol<T> {
    fn set_log_level(&self, level: u8) -> BwprofResult<()> {
        BwprofProtocol::set_log_level(self, level)
    }

    fn set_sample_ms(&self, hist: u8, interval_ms: u16) -> BwprofResult<()> {
        BwprofProtocol::set_sample_ms(self, hist, interval_ms)
    }

    fn set_masters_list(&self, masters: &[u8]) -> BwprofResult<()> {
        BwprofProtocol::set_masters_list(self, masters)
    }

    fn set_sampling_enable(&self, enable: u8) -> BwprofResult<()> {
        BwprofProtocol::set_sampling_enable(self, enable)
    }

    fn set_hist_info(&self, buckets: &[u32; MAX_BUCKETS]) -> BwprofResult<()> {
        BwprofProtocol::set_hist_info(self, buckets)
    }
}

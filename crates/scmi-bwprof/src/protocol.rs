//! The BWPROF protocol instance.
//!
//! Every operation is one synchronous round trip: acquire a transfer sized to
//! the record, write the record, submit, release. The transfer is released on
//! every path once it has been acquired. Nothing is retried.

use log::{debug, trace};

use crate::constants::*;
use crate::error::{BwprofError, BwprofResult};
use crate::records::*;
use crate::request::BwprofRequest;
use crate::xfer::{XferGuard, XferOps};

/// Protocol revision reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion {
    /// Major revision (bits 31..16).
    pub major: u16,
    /// Minor revision (bits 15..0).
    pub minor: u16,
}

impl ProtocolVersion {
    /// Split a version word.
    pub fn from_word(word: u32) -> Self {
        ProtocolVersion {
            major: ((word & PROTOCOL_REV_MAJOR_MASK) >> 16) as u16,
            minor: (word & PROTOCOL_REV_MINOR_MASK) as u16,
        }
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A BWPROF protocol instance bound to one set of transfer ops.
#[derive(Debug)]
pub struct BwprofProtocol<T: XferOps> {
    ops: T,
    version: Option<ProtocolVersion>,
}

impl<T: XferOps> BwprofProtocol<T> {
    /// Attach to the transfer ops and read the platform version.
    ///
    /// The version is informational. A failed readout is logged and leaves
    /// the version unknown; attaching never fails.
    pub fn init_instance(ops: T) -> Self {
        let version = match ops.version_get() {
            Ok(word) => {
                let version = ProtocolVersion::from_word(word);
                debug!("bwprof version {}.{}", version.major, version.minor);
                Some(version)
            }
            Err(err) => {
                debug!("bwprof version unavailable: {}", err);
                None
            }
        };
        BwprofProtocol { ops, version }
    }

    /// Version read at attach time.
    pub fn version(&self) -> Option<ProtocolVersion> {
        self.version
    }

    /// The underlying transfer ops.
    pub fn ops(&self) -> &T {
        &self.ops
    }

    /// Detach and return the transfer ops.
    pub fn into_inner(self) -> T {
        self.ops
    }

    /// Send one request. All typed operations route through here.
    pub fn submit(&self, request: &BwprofRequest) -> BwprofResult<()> {
        trace!(
            "bwprof {} algo=0x{:02X} payload_len={}",
            request.message(),
            request.algorithm().id(),
            request.payload_size()
        );
        let payload = request.encode();
        self.transact(request.message(), &payload)
    }

    fn transact(&self, message: BwprofMessage, payload: &[u8]) -> BwprofResult<()> {
        let mut xfer = XferGuard::acquire(
            &self.ops,
            message.id(),
            payload.len(),
            NO_RESPONSE_PAYLOAD,
        )
        .map_err(BwprofError::Acquire)?;

        let tx = xfer.tx_mut();
        if tx.len() != payload.len() {
            return Err(BwprofError::BufferSize {
                message,
                expected: payload.len(),
                actual: tx.len(),
            });
        }
        tx.copy_from_slice(payload);

        xfer.submit().map_err(BwprofError::Transfer)
    }

    /// Set the monitor log level.
    pub fn set_log_level(&self, level: u8) -> BwprofResult<()> {
        self.submit(&BwprofRequest::SetLogLevel(LogLevel(level)))
    }

    /// Enable (non-zero) or disable (zero) sampling.
    pub fn set_sampling_enable(&self, enable: u8) -> BwprofResult<()> {
        self.submit(&BwprofRequest::SetEnable(EnableFlag(enable)))
    }

    /// Set the histogram bucket boundaries.
    pub fn set_hist_info(&self, buckets: &[u32; MAX_BUCKETS]) -> BwprofResult<()> {
        self.submit(&BwprofRequest::SetHistInfo(HistBuckets(*buckets)))
    }

    /// Replace the monitored master list.
    ///
    /// More than [`MAX_MASTERS`] ids is rejected before any transfer is
    /// acquired.
    pub fn set_masters_list(&self, masters: &[u8]) -> BwprofResult<()> {
        let list = MasterList::new(masters)?;
        self.submit(&BwprofRequest::MasterList(list))
    }

    /// Set the sampling interval. A non-zero `hist` selects the histogram
    /// algorithm context, zero selects basic monitoring.
    pub fn set_sample_ms(&self, hist: u8, interval_ms: u16) -> BwprofResult<()> {
        self.submit(&BwprofRequest::SetSampleMs(SampleInterval {
            hist,
            interval_ms,
        }))
    }

    /// Start sampling. Same transfer as `set_sampling_enable(1)`.
    pub fn start_activity(&self) -> BwprofResult<()> {
        self.submit(&BwprofRequest::start())
    }

    /// Stop sampling. Same transfer as `set_sampling_enable(0)`.
    pub fn stop_activity(&self) -> BwprofResult<()> {
        self.submit(&BwprofRequest::stop())
    }

    /// Send a raw parameter payload.
    ///
    /// `param_id` must name a BWPROF message and `payload` must be exactly
    /// its record size. The payload is validated as that record and sent
    /// verbatim.
    pub fn set_param(&self, algo: u64, param_id: u32, payload: &[u8]) -> BwprofResult<()> {
        let message = u8::try_from(param_id)
            .ok()
            .and_then(|id| BwprofMessage::try_from(id).ok())
            .ok_or(BwprofError::UnknownMessage(param_id))?;
        let request = BwprofRequest::decode(message, payload)?;
        trace!("bwprof set_param {} algo=0x{:02X}", message, algo);
        self.submit(&request)
    }

    /// Read a parameter back from firmware. The protocol is write-only, so
    /// this always fails without touching the transport.
    pub fn get_param(
        &self,
        _algo: u64,
        _param_id: u32,
        _tx: &[u8],
        _rx: &mut [u8],
    ) -> BwprofResult<()> {
        Err(BwprofError::NotSupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::xfer::{MessageHeader, Xfer};
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingOps {
        acquired: Cell<u32>,
        released: Cell<u32>,
        sent: RefCell<Vec<(u8, Vec<u8>, usize)>>,
        fail_acquire: Cell<bool>,
        fail_submit: Cell<bool>,
        short_tx: Cell<bool>,
        version: Option<u32>,
    }

    impl XferOps for RecordingOps {
        fn xfer_get_init(
            &self,
            msg_id: u8,
            tx_size: usize,
            rx_size: usize,
        ) -> Result<Xfer, TransportError> {
            if self.fail_acquire.get() {
                return Err(TransportError::NoSlot);
            }
            self.acquired.set(self.acquired.get() + 1);
            let tx_size = if self.short_tx.get() {
                tx_size.saturating_sub(1)
            } else {
                tx_size
            };
            Ok(Xfer::new(
                MessageHeader::command(PROTOCOL_ID_BWPROF, msg_id, 0),
                tx_size,
                rx_size,
            ))
        }

        fn do_xfer(&self, xfer: &mut Xfer) -> Result<(), TransportError> {
            self.sent.borrow_mut().push((
                xfer.hdr.message_id,
                xfer.tx().to_vec(),
                xfer.rx_size(),
            ));
            if self.fail_submit.get() {
                return Err(TransportError::Timeout);
            }
            Ok(())
        }

        fn xfer_put(&self, _xfer: Xfer) {
            self.released.set(self.released.get() + 1);
        }

        fn version_get(&self) -> Result<u32, TransportError> {
            self.version.ok_or(TransportError::Timeout)
        }
    }

    fn protocol() -> BwprofProtocol<RecordingOps> {
        BwprofProtocol::init_instance(RecordingOps {
            version: Some(0x0002_0001),
            ..Default::default()
        })
    }

    #[test]
    fn test_init_reads_version() {
        let proto = protocol();
        assert_eq!(proto.version(), Some(ProtocolVersion { major: 2, minor: 1 }));
        assert_eq!(proto.version().unwrap().to_string(), "2.1");
    }

    #[test]
    fn test_init_survives_version_failure() {
        let proto = BwprofProtocol::init_instance(RecordingOps::default());
        assert_eq!(proto.version(), None);
        assert!(proto.set_log_level(1).is_ok());
    }

    #[test]
    fn test_version_word() {
        let version = ProtocolVersion::from_word(0xABCD_1234);
        assert_eq!(version.major, 0xABCD);
        assert_eq!(version.minor, 0x1234);
    }

    #[test]
    fn test_set_log_level_transfer() {
        let proto = protocol();
        proto.set_log_level(0xA5).unwrap();
        let sent = proto.ops().sent.borrow();
        assert_eq!(sent.as_slice(), &[(MSG_SET_LOG_LEVEL, vec![0xA5], 0)]);
    }

    #[test]
    fn test_sample_ms_transfer() {
        let proto = protocol();
        proto.set_sample_ms(1, 0x0203).unwrap();
        proto.set_sample_ms(0, 500).unwrap();
        let sent = proto.ops().sent.borrow();
        assert_eq!(sent[0], (MSG_SET_SAMPLE_MS, vec![1, 0x03, 0x02], 0));
        assert_eq!(sent[1], (MSG_SET_SAMPLE_MS, vec![0, 0xF4, 0x01], 0));
    }

    #[test]
    fn test_masters_list_transfer() {
        let proto = protocol();
        proto.set_masters_list(&[10, 20]).unwrap();
        let sent = proto.ops().sent.borrow();
        assert_eq!(sent[0], (MSG_MASTER_LIST, vec![2, 10, 20, 0], 0));
    }

    #[test]
    fn test_masters_list_rejected_before_acquire() {
        let proto = protocol();
        let err = proto.set_masters_list(&[1, 2, 3, 4]).unwrap_err();
        assert_eq!(err, BwprofError::TooManyMasters { count: 4, max: 3 });
        assert_eq!(err.errno(), -22);
        assert_eq!(proto.ops().acquired.get(), 0);
        assert_eq!(proto.ops().released.get(), 0);
    }

    #[test]
    fn test_hist_info_transfer() {
        let proto = protocol();
        proto.set_hist_info(&[1, 256, 0x0100_0000]).unwrap();
        let sent = proto.ops().sent.borrow();
        assert_eq!(
            sent[0].1,
            vec![1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1]
        );
        assert_eq!(sent[0].0, MSG_SET_HIST_INFO);
    }

    #[test]
    fn test_start_stop_match_enable() {
        let proto = protocol();
        proto.start_activity().unwrap();
        proto.set_sampling_enable(1).unwrap();
        proto.stop_activity().unwrap();
        proto.set_sampling_enable(0).unwrap();
        let sent = proto.ops().sent.borrow();
        assert_eq!(sent[0], sent[1]);
        assert_eq!(sent[2], sent[3]);
        assert_eq!(sent[0], (MSG_SET_ENABLE, vec![1], 0));
        assert_eq!(sent[2], (MSG_SET_ENABLE, vec![0], 0));
    }

    #[test]
    fn test_get_param_not_supported() {
        let proto = protocol();
        let mut rx = [0u8; 4];
        let err = proto
            .get_param(ALGO_HISTOGRAM, MSG_SET_SAMPLE_MS as u32, &[], &mut rx)
            .unwrap_err();
        assert_eq!(err, BwprofError::NotSupported);
        assert_eq!(err.errno(), -95);
        assert_eq!(proto.ops().acquired.get(), 0);
    }

    #[test]
    fn test_release_on_submit_failure() {
        let proto = protocol();
        proto.ops().fail_submit.set(true);
        let err = proto.set_log_level(3).unwrap_err();
        assert_eq!(err, BwprofError::Transfer(TransportError::Timeout));
        assert_eq!(err.errno(), -110);
        assert_eq!(proto.ops().acquired.get(), 1);
        assert_eq!(proto.ops().released.get(), 1);
    }

    #[test]
    fn test_acquire_failure_passes_through() {
        let proto = protocol();
        proto.ops().fail_acquire.set(true);
        let err = proto.set_sampling_enable(1).unwrap_err();
        assert_eq!(err, BwprofError::Acquire(TransportError::NoSlot));
        assert_eq!(proto.ops().released.get(), 0);
        assert!(proto.ops().sent.borrow().is_empty());
    }

    #[test]
    fn test_set_param_raw() {
        let proto = protocol();
        proto
            .set_param(ALGO_BASIC_MONITORING, MSG_MASTER_LIST as u32, &[1, 7, 0, 0])
            .unwrap();
        assert_eq!(
            proto.ops().sent.borrow()[0],
            (MSG_MASTER_LIST, vec![1, 7, 0, 0], 0)
        );

        let err = proto
            .set_param(ALGO_BASIC_MONITORING, 0x1_0010, &[1])
            .unwrap_err();
        assert_eq!(err, BwprofError::UnknownMessage(0x1_0010));

        let err = proto
            .set_param(ALGO_BASIC_MONITORING, MSG_SET_HIST_INFO as u32, &[0; 4])
            .unwrap_err();
        assert_eq!(
            err,
            BwprofError::PayloadSize {
                message: BwprofMessage::SetHistInfo,
                expected: 12,
                actual: 4,
            }
        );

        let err = proto
            .set_param(ALGO_BASIC_MONITORING, MSG_MASTER_LIST as u32, &[5, 1, 2, 3])
            .unwrap_err();
        assert_eq!(err, BwprofError::TooManyMasters { count: 5, max: 3 });
        assert_eq!(proto.ops().acquired.get(), 1);
    }

    #[test]
    fn test_short_host_buffer_released() {
        let proto = protocol();
        proto.ops().short_tx.set(true);
        let err = proto.set_sample_ms(1, 100).unwrap_err();
        assert_eq!(
            err,
            BwprofError::BufferSize {
                message: BwprofMessage::SetSampleMs,
                expected: 3,
                actual: 2,
            }
        );
        assert!(!err.is_local());
        assert_eq!(proto.ops().acquired.get(), 1);
        assert_eq!(proto.ops().released.get(), 1);
        assert!(proto.ops().sent.borrow().is_empty());
    }
}

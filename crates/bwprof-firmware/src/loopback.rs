//! Loopback transfer ops delivering straight into a [`FirmwareModel`].
//!
//! Tracks the lifetime of every transfer (acquire, submit, release), captures
//! delivered transactions and supports one-shot fault injection at either
//! stage.

use bwprof_metrics::{
    message_labels, metric_defs, metrics, stage_labels, status_labels, Stage,
};
use parking_lot::Mutex;
use scmi_bwprof::{
    BwprofMessage, MessageHeader, ScmiStatus, TransportError, Xfer, XferOps, MSG_TOKEN_MAX,
    PROTOCOL_ID_BWPROF,
};

use crate::model::{FirmwareModel, MonitorState};

/// Default maximum payload size of the channel.
pub const DEFAULT_MAX_MSG_SIZE: usize = 128;

/// Default number of transfers that may be outstanding at once.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// Loopback channel configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopbackConfig {
    /// Protocol id stamped into every header. The firmware always serves
    /// [`PROTOCOL_ID_BWPROF`], so any other value is rejected on delivery.
    pub protocol_id: u8,
    /// Version word reported by `version_get`.
    pub version: u32,
    /// Largest transmit or receive payload accepted.
    pub max_msg_size: usize,
    /// Maximum outstanding transfers.
    pub max_in_flight: usize,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        LoopbackConfig {
            protocol_id: PROTOCOL_ID_BWPROF,
            version: 0x0001_0000,
            max_msg_size: DEFAULT_MAX_MSG_SIZE,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Transfer lifecycle counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XferStats {
    /// Successful `xfer_get_init` calls.
    pub acquired: u64,
    /// `xfer_put` calls.
    pub released: u64,
    /// `do_xfer` calls.
    pub submitted: u64,
    /// Failed acquisitions and submissions.
    pub failed: u64,
}

impl XferStats {
    /// Whether every acquired transfer has been released.
    pub fn balanced(&self) -> bool {
        self.acquired == self.released
    }
}

/// A transaction delivered to the firmware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedXfer {
    /// Header as decoded by the firmware.
    pub header: MessageHeader,
    /// Packed header word on the channel.
    pub header_word: u32,
    /// Transmit payload as sent.
    pub payload: Vec<u8>,
    /// Receive size requested at acquisition.
    pub rx_size: usize,
    /// Status returned by the firmware.
    pub status: ScmiStatus,
}

impl CapturedXfer {
    /// The BWPROF message, if the id names one.
    pub fn message(&self) -> Option<BwprofMessage> {
        BwprofMessage::try_from(self.header.message_id).ok()
    }

    /// Protocol name of the message, or its id in hex.
    pub fn message_name(&self) -> String {
        message_label(self.header.message_id)
    }
}

fn message_label(message_id: u8) -> String {
    match BwprofMessage::try_from(message_id) {
        Ok(message) => message.name().to_string(),
        Err(_) => format!("0x{:02X}", message_id),
    }
}

#[derive(Debug)]
struct Inner {
    firmware: FirmwareModel,
    next_token: u16,
    in_flight: usize,
    stats: XferStats,
    captured: Vec<CapturedXfer>,
    acquire_fault: Option<TransportError>,
    submit_fault: Option<TransportError>,
}

/// Transfer ops backed by an in-process firmware model.
#[derive(Debug)]
pub struct LoopbackTransport {
    config: LoopbackConfig,
    inner: Mutex<Inner>,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new(LoopbackConfig::default())
    }
}

impl LoopbackTransport {
    /// Create a loopback channel.
    pub fn new(config: LoopbackConfig) -> Self {
        LoopbackTransport {
            config,
            inner: Mutex::new(Inner {
                firmware: FirmwareModel::default(),
                next_token: 0,
                in_flight: 0,
                stats: XferStats::default(),
                captured: Vec::new(),
                acquire_fault: None,
                submit_fault: None,
            }),
        }
    }

    /// Channel configuration.
    pub fn config(&self) -> &LoopbackConfig {
        &self.config
    }

    /// Fail the next `xfer_get_init` with `err`.
    pub fn fail_next_acquire(&self, err: TransportError) {
        self.inner.lock().acquire_fault = Some(err);
    }

    /// Fail the next `do_xfer` with `err` before delivery.
    pub fn fail_next_submit(&self, err: TransportError) {
        self.inner.lock().submit_fault = Some(err);
    }

    /// Snapshot of the lifecycle counters.
    pub fn stats(&self) -> XferStats {
        self.inner.lock().stats
    }

    /// Transfers currently outstanding.
    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight
    }

    /// Transactions delivered so far.
    pub fn captured(&self) -> Vec<CapturedXfer> {
        self.inner.lock().captured.clone()
    }

    /// Drain the captured transactions.
    pub fn take_captured(&self) -> Vec<CapturedXfer> {
        std::mem::take(&mut self.inner.lock().captured)
    }

    /// Current firmware monitor state.
    pub fn state(&self) -> MonitorState {
        self.inner.lock().firmware.state().clone()
    }
}

impl XferOps for LoopbackTransport {
    fn xfer_get_init(
        &self,
        msg_id: u8,
        tx_size: usize,
        rx_size: usize,
    ) -> Result<Xfer, TransportError> {
        let mut inner = self.inner.lock();
        let label = message_label(msg_id);

        let result = if let Some(err) = inner.acquire_fault.take() {
            Err(err)
        } else if tx_size > self.config.max_msg_size || rx_size > self.config.max_msg_size {
            Err(TransportError::MessageTooLarge {
                size: tx_size.max(rx_size),
                max: self.config.max_msg_size,
            })
        } else if inner.in_flight >= self.config.max_in_flight {
            Err(TransportError::NoSlot)
        } else {
            Ok(())
        };

        if let Err(err) = result {
            inner.stats.failed += 1;
            metrics::counter!(metric_defs::XFER_FAILED.name, &stage_labels(&label, Stage::Acquire))
                .increment(1);
            return Err(err);
        }

        let token = inner.next_token;
        inner.next_token = (token + 1) & MSG_TOKEN_MAX;
        inner.in_flight += 1;
        inner.stats.acquired += 1;
        metrics::counter!(metric_defs::XFER_ACQUIRED.name, &message_labels(&label)).increment(1);
        metrics::gauge!(metric_defs::XFER_IN_FLIGHT.name).set(inner.in_flight as f64);

        let hdr = MessageHeader::command(self.config.protocol_id, msg_id, token);
        Ok(Xfer::new(hdr, tx_size, rx_size))
    }

    fn do_xfer(&self, xfer: &mut Xfer) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        let label = message_label(xfer.hdr.message_id);
        inner.stats.submitted += 1;
        let labels = message_labels(&label);
        metrics::counter!(metric_defs::XFER_SUBMITTED.name, &labels).increment(1);
        metrics::histogram!(metric_defs::XFER_PAYLOAD_BYTES.name, &labels)
            .record(xfer.tx().len() as f64);

        if let Some(err) = inner.submit_fault.take() {
            inner.stats.failed += 1;
            metrics::counter!(metric_defs::XFER_FAILED.name, &stage_labels(&label, Stage::Submit))
                .increment(1);
            return Err(err);
        }

        // The firmware only sees the packed header word.
        let header_word = xfer.hdr.pack();
        let header = MessageHeader::unpack(header_word);
        let status = inner.firmware.handle(&header, xfer.tx());
        xfer.status = status;
        log::trace!(
            "loopback {} hdr=0x{:08X} status={}",
            label,
            header_word,
            status
        );
        inner.captured.push(CapturedXfer {
            header,
            header_word,
            payload: xfer.tx().to_vec(),
            rx_size: xfer.rx_size(),
            status,
        });

        if status.is_success() {
            return Ok(());
        }
        inner.stats.failed += 1;
        metrics::counter!(metric_defs::FIRMWARE_REJECTED.name, &status_labels(&label, status))
            .increment(1);
        metrics::counter!(metric_defs::XFER_FAILED.name, &stage_labels(&label, Stage::Submit))
            .increment(1);
        Err(TransportError::Platform(status))
    }

    fn xfer_put(&self, xfer: Xfer) {
        let mut inner = self.inner.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        inner.stats.released += 1;
        let labels = message_labels(&message_label(xfer.hdr.message_id));
        metrics::counter!(metric_defs::XFER_RELEASED.name, &labels).increment(1);
        metrics::gauge!(metric_defs::XFER_IN_FLIGHT.name).set(inner.in_flight as f64);
    }

    fn version_get(&self) -> Result<u32, TransportError> {
        Ok(self.config.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_increment() {
        let transport = LoopbackTransport::default();
        let first = transport.xfer_get_init(16, 1, 0).unwrap();
        let second = transport.xfer_get_init(16, 1, 0).unwrap();
        assert_eq!(first.hdr.token, 0);
        assert_eq!(second.hdr.token, 1);
        assert_eq!(first.hdr.protocol_id, PROTOCOL_ID_BWPROF);
        assert_eq!(transport.in_flight(), 2);
        transport.xfer_put(first);
        transport.xfer_put(second);
        assert_eq!(transport.in_flight(), 0);
        assert!(transport.stats().balanced());
    }

    #[test]
    fn test_rejects_oversized_message() {
        let transport = LoopbackTransport::default();
        let err = transport.xfer_get_init(16, 129, 0).unwrap_err();
        assert_eq!(
            err,
            TransportError::MessageTooLarge {
                size: 129,
                max: 128
            }
        );
        assert_eq!(transport.stats().acquired, 0);
        assert_eq!(transport.stats().failed, 1);
    }

    #[test]
    fn test_slot_exhaustion() {
        let transport = LoopbackTransport::new(LoopbackConfig {
            max_in_flight: 1,
            ..Default::default()
        });
        let held = transport.xfer_get_init(16, 1, 0).unwrap();
        assert_eq!(
            transport.xfer_get_init(17, 3, 0).unwrap_err(),
            TransportError::NoSlot
        );
        transport.xfer_put(held);
        assert!(transport.xfer_get_init(17, 3, 0).is_ok());
    }

    #[test]
    fn test_header_word_delivered() {
        let transport = LoopbackTransport::default();
        let _ = transport.xfer_get_init(16, 1, 0).map(|x| transport.xfer_put(x));
        let mut xfer = transport.xfer_get_init(0x13, 1, 0).unwrap();
        xfer.tx_mut()[0] = 1;
        transport.do_xfer(&mut xfer).unwrap();
        transport.xfer_put(xfer);

        let captured = transport.take_captured();
        // msg 0x13, type 0, protocol 0x80, token 1
        assert_eq!(captured[0].header_word, 0x0004_0000 | 0x0002_0000 | 0x13);
        assert_eq!(captured[0].header.token, 1);
        assert!(transport.state().enabled);
    }

    #[test]
    fn test_faults_are_one_shot() {
        let transport = LoopbackTransport::default();
        transport.fail_next_acquire(TransportError::Other(-5));
        assert_eq!(
            transport.xfer_get_init(16, 1, 0).unwrap_err(),
            TransportError::Other(-5)
        );
        let mut xfer = transport.xfer_get_init(16, 1, 0).unwrap();

        transport.fail_next_submit(TransportError::Timeout);
        assert_eq!(transport.do_xfer(&mut xfer), Err(TransportError::Timeout));
        assert!(transport.captured().is_empty());
        assert_eq!(transport.do_xfer(&mut xfer), Ok(()));
        assert_eq!(transport.captured().len(), 1);
        transport.xfer_put(xfer);
    }

    #[test]
    fn test_platform_status_reported() {
        let transport = LoopbackTransport::default();
        let mut xfer = transport.xfer_get_init(0x40, 1, 0).unwrap();
        assert_eq!(
            transport.do_xfer(&mut xfer),
            Err(TransportError::Platform(ScmiStatus::NotSupported))
        );
        assert_eq!(xfer.status, ScmiStatus::NotSupported);
        let captured = transport.take_captured();
        assert_eq!(captured[0].message(), None);
        assert_eq!(captured[0].message_name(), "0x40");
        assert_eq!(captured[0].header_word, xfer.hdr.pack());
        assert!(transport.captured().is_empty());
        transport.xfer_put(xfer);
    }
}

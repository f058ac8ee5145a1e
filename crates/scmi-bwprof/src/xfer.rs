//! Transfer primitives supplied by the host SCMI core.
//!
//! A transfer is acquired with [`XferOps::xfer_get_init`], filled, submitted
//! with [`XferOps::do_xfer`] and handed back with [`XferOps::xfer_put`].
//! [`XferGuard`] ties the release to scope so it happens exactly once on
//! every path.
//!
//! The message header packs into one 32-bit word:
//!
//! ```text
//! 31      28 27          18 17          10 9    8 7            0
//! +---------+--------------+--------------+------+--------------+
//! | rsvd    | token        | protocol_id  | type | message_id   |
//! +---------+--------------+--------------+------+--------------+
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use bytes::BytesMut;

use crate::error::TransportError;
use crate::status::ScmiStatus;

const MSG_ID_MASK: u32 = 0xFF;
const MSG_TYPE_SHIFT: u32 = 8;
const MSG_TYPE_MASK: u32 = 0x3;
const MSG_PROTOCOL_ID_SHIFT: u32 = 10;
const MSG_PROTOCOL_ID_MASK: u32 = 0xFF;
const MSG_TOKEN_ID_SHIFT: u32 = 18;
const MSG_TOKEN_ID_MASK: u32 = 0x3FF;

/// Largest token value that fits the header.
pub const MSG_TOKEN_MAX: u16 = MSG_TOKEN_ID_MASK as u16;

// ============================================================================
// Header
// ============================================================================

/// Message type field of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageType {
    /// Synchronous command.
    #[default]
    Command,
    /// Reserved encoding.
    Reserved,
    /// Delayed response to an asynchronous command.
    DelayedResponse,
    /// Platform notification.
    Notification,
}

impl MessageType {
    fn bits(&self) -> u32 {
        match self {
            MessageType::Command => 0,
            MessageType::Reserved => 1,
            MessageType::DelayedResponse => 2,
            MessageType::Notification => 3,
        }
    }

    fn from_bits(bits: u32) -> Self {
        match bits & MSG_TYPE_MASK {
            0 => MessageType::Command,
            1 => MessageType::Reserved,
            2 => MessageType::DelayedResponse,
            _ => MessageType::Notification,
        }
    }
}

/// Header of one SCMI message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageHeader {
    /// Message id within the protocol.
    pub message_id: u8,
    /// Message type.
    pub message_type: MessageType,
    /// Protocol id.
    pub protocol_id: u8,
    /// Sequence token, 10 bits.
    pub token: u16,
}

impl MessageHeader {
    /// Create a command header.
    pub fn command(protocol_id: u8, message_id: u8, token: u16) -> Self {
        MessageHeader {
            message_id,
            message_type: MessageType::Command,
            protocol_id,
            token: token & MSG_TOKEN_MAX,
        }
    }

    /// Pack into the 32-bit wire word.
    pub fn pack(&self) -> u32 {
        (self.message_id as u32 & MSG_ID_MASK)
            | (self.message_type.bits() << MSG_TYPE_SHIFT)
            | ((self.protocol_id as u32 & MSG_PROTOCOL_ID_MASK) << MSG_PROTOCOL_ID_SHIFT)
            | ((self.token as u32 & MSG_TOKEN_ID_MASK) << MSG_TOKEN_ID_SHIFT)
    }

    /// Unpack from the 32-bit wire word.
    pub fn unpack(word: u32) -> Self {
        MessageHeader {
            message_id: (word & MSG_ID_MASK) as u8,
            message_type: MessageType::from_bits(word >> MSG_TYPE_SHIFT),
            protocol_id: ((word >> MSG_PROTOCOL_ID_SHIFT) & MSG_PROTOCOL_ID_MASK) as u8,
            token: ((word >> MSG_TOKEN_ID_SHIFT) & MSG_TOKEN_ID_MASK) as u16,
        }
    }
}

// ============================================================================
// Transfer
// ============================================================================

/// One command exchange.
#[derive(Debug, Clone)]
pub struct Xfer {
    /// Message header.
    pub hdr: MessageHeader,
    /// Status reported by the platform once the exchange completes.
    pub status: ScmiStatus,
    tx: BytesMut,
    rx_size: usize,
}

impl Xfer {
    /// Create a transfer with a zeroed transmit buffer of `tx_size` bytes.
    pub fn new(hdr: MessageHeader, tx_size: usize, rx_size: usize) -> Self {
        Xfer {
            hdr,
            status: ScmiStatus::Success,
            tx: BytesMut::zeroed(tx_size),
            rx_size,
        }
    }

    fn detached() -> Self {
        Xfer::new(MessageHeader::default(), 0, 0)
    }

    /// Transmit payload.
    pub fn tx(&self) -> &[u8] {
        &self.tx
    }

    /// Mutable transmit payload. Its length is fixed at acquisition.
    pub fn tx_mut(&mut self) -> &mut [u8] {
        &mut self.tx
    }

    /// Expected response payload size.
    pub fn rx_size(&self) -> usize {
        self.rx_size
    }
}

// ============================================================================
// Transfer Operations
// ============================================================================

/// Transfer primitives of one protocol instance.
///
/// Implementations own message framing, completion and delivery. Every
/// successful `xfer_get_init` must be paired with exactly one `xfer_put`.
pub trait XferOps {
    /// Acquire a transfer for `msg_id` with the given payload sizes.
    fn xfer_get_init(
        &self,
        msg_id: u8,
        tx_size: usize,
        rx_size: usize,
    ) -> Result<Xfer, TransportError>;

    /// Send the transfer and block until it completes.
    fn do_xfer(&self, xfer: &mut Xfer) -> Result<(), TransportError>;

    /// Release a transfer.
    fn xfer_put(&self, xfer: Xfer);

    /// Read the protocol version word reported by the platform.
    fn version_get(&self) -> Result<u32, TransportError>;
}

impl<T: XferOps + ?Sized> XferOps for &T {
    fn xfer_get_init(
        &self,
        msg_id: u8,
        tx_size: usize,
        rx_size: usize,
    ) -> Result<Xfer, TransportError> {
        (**self).xfer_get_init(msg_id, tx_size, rx_size)
    }

    fn do_xfer(&self, xfer: &mut Xfer) -> Result<(), TransportError> {
        (**self).do_xfer(xfer)
    }

    fn xfer_put(&self, xfer: Xfer) {
        (**self).xfer_put(xfer)
    }

    fn version_get(&self) -> Result<u32, TransportError> {
        (**self).version_get()
    }
}

impl<T: XferOps + ?Sized> XferOps for Arc<T> {
    fn xfer_get_init(
        &self,
        msg_id: u8,
        tx_size: usize,
        rx_size: usize,
    ) -> Result<Xfer, TransportError> {
        (**self).xfer_get_init(msg_id, tx_size, rx_size)
    }

    fn do_xfer(&self, xfer: &mut Xfer) -> Result<(), TransportError> {
        (**self).do_xfer(xfer)
    }

    fn xfer_put(&self, xfer: Xfer) {
        (**self).xfer_put(xfer)
    }

    fn version_get(&self) -> Result<u32, TransportError> {
        (**self).version_get()
    }
}

/// An acquired transfer that is released when dropped.
pub struct XferGuard<'a, T: XferOps + ?Sized> {
    ops: &'a T,
    xfer: Xfer,
}

impl<'a, T: XferOps + ?Sized> XferGuard<'a, T> {
    /// Acquire a transfer and wrap it.
    pub fn acquire(
        ops: &'a T,
        msg_id: u8,
        tx_size: usize,
        rx_size: usize,
    ) -> Result<Self, TransportError> {
        let xfer = ops.xfer_get_init(msg_id, tx_size, rx_size)?;
        Ok(XferGuard { ops, xfer })
    }

    /// Submit the transfer and wait for completion.
    pub fn submit(&mut self) -> Result<(), TransportError> {
        self.ops.do_xfer(&mut self.xfer)
    }
}

impl<T: XferOps + ?Sized> Deref for XferGuard<'_, T> {
    type Target = Xfer;

    fn deref(&self) -> &Xfer {
        &self.xfer
    }
}

impl<T: XferOps + ?Sized> DerefMut for XferGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Xfer {
        &mut self.xfer
    }
}

impl<T: XferOps + ?Sized> Drop for XferGuard<'_, T> {
    fn drop(&mut self) {
        let xfer = std::mem::replace(&mut self.xfer, Xfer::detached());
        self.ops.xfer_put(xfer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_header_pack_layout() {
        let hdr = MessageHeader::command(0x80, 0x11, 0x2A5);
        let word = hdr.pack();
        assert_eq!(word & 0xFF, 0x11);
        assert_eq!((word >> 8) & 0x3, 0);
        assert_eq!((word >> 10) & 0xFF, 0x80);
        assert_eq!((word >> 18) & 0x3FF, 0x2A5);
        assert_eq!(MessageHeader::unpack(word), hdr);
    }

    #[test]
    fn test_header_token_truncated() {
        let hdr = MessageHeader::command(0x80, 0x10, 0xFFFF);
        assert_eq!(hdr.token, MSG_TOKEN_MAX);
        assert_eq!(hdr.pack() >> 28, 0);
    }

    #[test]
    fn test_xfer_buffers() {
        let mut xfer = Xfer::new(MessageHeader::default(), 4, 2);
        assert_eq!(xfer.tx(), &[0, 0, 0, 0]);
        xfer.tx_mut()[1] = 7;
        assert_eq!(xfer.tx(), &[0, 7, 0, 0]);
        assert_eq!(xfer.rx_size(), 2);
    }

    struct CountingOps {
        puts: Cell<u32>,
    }

    impl XferOps for CountingOps {
        fn xfer_get_init(
            &self,
            msg_id: u8,
            tx_size: usize,
            rx_size: usize,
        ) -> Result<Xfer, TransportError> {
            Ok(Xfer::new(
                MessageHeader::command(0x80, msg_id, 0),
                tx_size,
                rx_size,
            ))
        }

        fn do_xfer(&self, _xfer: &mut Xfer) -> Result<(), TransportError> {
            Err(TransportError::Timeout)
        }

        fn xfer_put(&self, xfer: Xfer) {
            assert_eq!(xfer.hdr.message_id, 0x12);
            self.puts.set(self.puts.get() + 1);
        }

        fn version_get(&self) -> Result<u32, TransportError> {
            Ok(0)
        }
    }

    #[test]
    fn test_guard_releases_once() {
        let ops = CountingOps { puts: Cell::new(0) };
        {
            let mut guard = XferGuard::acquire(&ops, 0x12, 4, 0).unwrap();
            assert_eq!(guard.tx().len(), 4);
            assert_eq!(guard.submit(), Err(TransportError::Timeout));
        }
        assert_eq!(ops.puts.get(), 1);
    }
}

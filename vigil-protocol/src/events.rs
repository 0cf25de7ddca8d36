//! Transport events delivered to the application
//!
//! Every event the link raises carries either the packet it concerns or the
//! reason reception failed. Failures are informational: the receiver has
//! already resynchronized by the time the event is seen.

use crate::packet::Packet;

// Compact status flags (diagnostics)
pub const FLAG_RX: u8 = 1 << 0;
pub const FLAG_TX: u8 = 1 << 1;
pub const FLAG_OK: u8 = 1 << 2;
pub const FLAG_FAIL: u8 = 1 << 3;
pub const FLAG_FULL: u8 = 1 << 4;
pub const FLAG_PARITY: u8 = 1 << 5;
pub const FLAG_OVERRUN: u8 = 1 << 6;
pub const FLAG_FRAMING: u8 = 1 << 7;

/// Why a frame was not delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxFailure {
    /// Frame was not usable
    ///
    /// Raised for a postamble mismatch and also for an intact frame whose
    /// payload does not unpack into a [`Packet`] (unknown type or content).
    Framing,
    /// Receive queue had no room; the packet was dropped
    BufferFull,
    /// UART reported a parity error
    Parity,
    /// UART reported a receiver overrun
    Overrun,
}

impl RxFailure {
    /// Status flag bit for this failure kind
    pub fn flag(self) -> u8 {
        match self {
            RxFailure::Framing => FLAG_FRAMING,
            RxFailure::BufferFull => FLAG_FULL,
            RxFailure::Parity => FLAG_PARITY,
            RxFailure::Overrun => FLAG_OVERRUN,
        }
    }
}

/// Event raised by the serial transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialEvent {
    /// A packet was received
    Received(Packet),
    /// A packet finished transmitting
    Transmitted(Packet),
    /// A frame was lost
    ReceiveFailed(RxFailure),
}

impl SerialEvent {
    /// Packet carried by this event, if any
    pub fn packet(&self) -> Option<&Packet> {
        match self {
            SerialEvent::Received(p) | SerialEvent::Transmitted(p) => Some(p),
            SerialEvent::ReceiveFailed(_) => None,
        }
    }

    /// Compact status byte (`FLAG_*` bits)
    pub fn flags(&self) -> u8 {
        match self {
            SerialEvent::Received(_) => FLAG_RX | FLAG_OK,
            SerialEvent::Transmitted(_) => FLAG_TX | FLAG_OK,
            SerialEvent::ReceiveFailed(kind) => FLAG_RX | FLAG_FAIL | kind.flag(),
        }
    }
}

//! Board-agnostic core of the Vigil alarm controller
//!
//! Everything here runs the same on the RP2040 node and on the host:
//!
//! - Bounded ring buffer shared by all queues
//! - Event queue, handler table and drain loop
//! - Interrupt-driven framed serial transport
//! - System-wide configuration constants
//!
//! Hardware is reached only through [`vigil_hal::SerialPort`]. Shared state is
//! guarded by `embassy_sync` blocking mutexes, so the raw mutex type decides
//! whether a value may be touched from interrupt context.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

#[macro_use]
mod fmt;

pub mod config;
pub mod event;
pub mod ring;
pub mod serial;

pub use event::{Dispatch, Event, EventCode, EventLoop, Handler, HandlerId, HandlerTable};
pub use ring::{RingBuffer, SharedRing};
pub use serial::{EventSink, SerialSink, SerialTransport};

/// A bounded queue had no room; the offered item was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueFull;

impl core::fmt::Display for QueueFull {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("queue full")
    }
}

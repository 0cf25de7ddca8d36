//! Inter-task communication
//!
//! The buffered UART driver owns the real interrupts; the tasks in
//! [`crate::tasks`] play the transport's interrupt handlers and talk to it
//! through these statics.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicBool;
use vigil_protocol::FRAME_SIZE;

/// Wakes the foreground loop after an event was queued
pub static WAKE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Bytes loaded by the transport, drained by the transmit task
pub static TX_BYTES: Channel<CriticalSectionRawMutex, u8, FRAME_SIZE> = Channel::new();

/// Emulated data-register-empty interrupt enable
pub static TX_READY_IRQ: AtomicBool = AtomicBool::new(false);

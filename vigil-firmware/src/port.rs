//! Transport port backed by the transmit task

use defmt::*;
use portable_atomic::Ordering;
use vigil_hal::SerialPort;

use crate::channels::{TX_BYTES, TX_READY_IRQ};

/// Hands each byte to [`crate::tasks::serial_tx_task`]
pub struct ChannelPort;

impl SerialPort for ChannelPort {
    fn write_byte(&mut self, byte: u8) {
        if TX_BYTES.try_send(byte).is_err() {
            warn!("TX byte channel full, dropping byte");
        }
    }

    fn set_tx_interrupt(&mut self, enabled: bool) {
        TX_READY_IRQ.store(enabled, Ordering::Release);
    }
}

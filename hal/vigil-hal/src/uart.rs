//! UART serial port abstraction
//!
//! The link transport drives a UART one byte at a time from interrupt
//! context: it loads the data register, then waits for the
//! "data register empty" interrupt before loading the next byte.

/// Byte-level, interrupt-driven serial transmitter
///
/// Implementations must not block. `write_byte` is only called when the
/// data register is known to be free (first byte of a frame, or from the
/// data-register-empty interrupt).
pub trait SerialPort {
    /// Load the next byte into the transmit data register
    fn write_byte(&mut self, byte: u8);

    /// Enable or disable the data-register-empty interrupt
    fn set_tx_interrupt(&mut self, enabled: bool);
}

impl<T: SerialPort + ?Sized> SerialPort for &mut T {
    fn write_byte(&mut self, byte: u8) {
        (**self).write_byte(byte)
    }

    fn set_tx_interrupt(&mut self, enabled: bool) {
        (**self).set_tx_interrupt(enabled)
    }
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

/// Link baud rate between the two nodes
pub const LINK_BAUDRATE: u32 = 500_000;

impl Default for UartConfig {
    /// Link settings: 500 kbit/s, 8 data bits, even parity, 1 stop bit
    fn default() -> Self {
        Self {
            baudrate: LINK_BAUDRATE,
            data_bits: DataBits::Eight,
            parity: Parity::Even,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// Same settings with a different baud rate
    pub const fn with_baudrate(mut self, baudrate: u32) -> Self {
        self.baudrate = baudrate;
        self
    }

    /// Bits on the wire per transmitted byte (start + data + parity + stop)
    pub const fn bits_per_byte(&self) -> u32 {
        let data = match self.data_bits {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
            DataBits::Nine => 9,
        };
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        1 + data + parity + stop
    }

    /// Approximate time to shift `bytes` out of the port, in microseconds
    pub const fn transfer_time_us(&self, bytes: u32) -> u32 {
        if self.baudrate == 0 {
            return 0;
        }
        let bits = bytes as u64 * self.bits_per_byte() as u64;
        (bits * 1_000_000 / self.baudrate as u64) as u32
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

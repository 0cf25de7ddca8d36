//! Embassy async tasks
//!
//! These stand in for the link interrupts and the tick timer; all of them
//! feed the event loop and never run handlers themselves.

pub mod serial_rx;
pub mod serial_tx;
pub mod tick;

pub use serial_rx::serial_rx_task;
pub use serial_tx::serial_tx_task;
pub use tick::tick_task;

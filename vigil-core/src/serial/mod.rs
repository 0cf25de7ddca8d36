//! Framed serial link
//!
//! [`SerialTransport`] turns UART interrupts into packet-level events and
//! paces their delivery with one-shot [`Gate`]s on each direction.

pub mod gate;
pub mod transport;

pub use gate::Gate;
pub use transport::{EventSink, SerialSink, SerialTransport};

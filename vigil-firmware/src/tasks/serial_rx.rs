//! Link UART receive task
//!
//! Plays the byte-received interrupt: every byte goes straight into the
//! transport's frame parser.

use defmt::*;
use embassy_rp::uart::{BufferedUartRx, Error};
use embedded_io_async::Read;
use vigil_protocol::RxFailure;

use crate::node::Link;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

#[embassy_executor::task]
pub async fn serial_rx_task(mut rx: BufferedUartRx, link: &'static Link) {
    info!("Serial RX task started");

    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) => {
                trace!("RX: {} bytes", n);
                for &byte in &buf[..n] {
                    link.on_byte_received(byte);
                }
            }
            Err(e) => {
                let kind = match e {
                    Error::Parity => RxFailure::Parity,
                    Error::Overrun => RxFailure::Overrun,
                    _ => RxFailure::Framing,
                };
                link.report_line_error(kind);
            }
        }
    }
}

//! Link UART transmit task
//!
//! Plays the data-register-empty interrupt: once a byte is handed to the
//! UART, asks the transport for the next one while the interrupt is
//! enabled.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;
use portable_atomic::Ordering;

use crate::channels::{TX_BYTES, TX_READY_IRQ};
use crate::node::Link;

#[embassy_executor::task]
pub async fn serial_tx_task(mut tx: BufferedUartTx, link: &'static Link) {
    info!("Serial TX task started");

    loop {
        let byte = TX_BYTES.receive().await;

        if let Err(e) = tx.write_all(&[byte]).await {
            warn!("UART write error: {:?}", e);
        }

        if TX_READY_IRQ.load(Ordering::Acquire) {
            link.on_tx_ready();
        }
    }
}

//! Vigil - Alarm Controller Node Firmware
//!
//! One binary for both ends of the link; the role comes from node.toml.
//! Interrupt-side tasks feed a single event queue, and the foreground loop
//! drains it through the handler table, sleeping whenever it comes up empty.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{self, BufferedInterruptHandler, Uart};
use static_cell::StaticCell;
use vigil_core::{Dispatch, EventLoop, EventSink, SerialTransport};
use vigil_hal::{DataBits, Parity, StopBits, UartConfig};
use vigil_protocol::FRAME_SIZE;
use {defmt_rtt as _, panic_probe as _};

use crate::channels::WAKE;
use crate::node::{App, Events, Link, Waking, EV_BOOT, EV_SERIAL};
use crate::port::ChannelPort;

mod channels;
mod config;
mod node;
mod port;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

// Event loop and link are shared by every task
static EVENTS: StaticCell<Events> = StaticCell::new();
static LINK: StaticCell<Link> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Vigil {} node starting...", config::ROLE);

    let p = embassy_rp::init(Default::default());

    let table = unwrap!(node::handler_table());
    let events: &'static Events = EVENTS.init(EventLoop::new(table));
    let waking = Waking(events);
    let link: &'static Link = LINK.init(SerialTransport::new(
        ChannelPort,
        EventSink::new(waking, EV_SERIAL, node::serial_arg),
    ));

    let link_config = config::link_uart();
    info!(
        "Link UART: {} baud, {:?} parity, {} us per frame",
        link_config.baudrate,
        link_config.parity,
        link_config.transfer_time_us(FRAME_SIZE as u32)
    );

    let tx_buf = TX_BUF.init([0u8; 64]);
    let rx_buf = RX_BUF.init([0u8; 64]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, rp_uart_config(&link_config));
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    // Status LED (Pico onboard LED)
    let led = Output::new(p.PIN_25, Level::Low);

    spawner.spawn(tasks::serial_rx_task(rx, link)).unwrap();
    spawner.spawn(tasks::serial_tx_task(tx, link)).unwrap();
    spawner.spawn(tasks::tick_task(waking)).unwrap();

    unwrap!(waking.dispatch(EV_BOOT, None));
    info!("All tasks spawned, entering event loop");

    let mut app = App::new(events, link, led);
    loop {
        if events.run(&mut app) == 0 {
            WAKE.wait().await;
        }
    }
}

/// Map link settings onto the RP2040 UART driver config
fn rp_uart_config(link: &UartConfig) -> uart::Config {
    let mut cfg = uart::Config::default();
    cfg.baudrate = link.baudrate;
    cfg.data_bits = match link.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
        DataBits::Nine => {
            warn!("9 data bits not supported, using 8");
            uart::DataBits::DataBits8
        }
    };
    cfg.parity = match link.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    cfg.stop_bits = match link.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    cfg
}

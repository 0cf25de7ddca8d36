//! Application glue: event codes, handler table and handlers
//!
//! Every handler runs in the foreground loop with the [`App`] context.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use vigil_core::event::TableError;
use vigil_core::{
    Dispatch, EventCode, EventLoop, EventSink, Handler, HandlerId, HandlerTable, QueueFull,
    SerialTransport,
};
use vigil_protocol::{Packet, SerialEvent, SharedState};

use crate::channels::WAKE;
use crate::config::{Role, PROBE_TICKS, ROLE};
use crate::port::ChannelPort;

/// Posted once at startup
pub const EV_BOOT: EventCode = 0;
/// Global tick
pub const EV_TICK: EventCode = 1;
/// Link transport event (argument: [`SerialEvent`])
pub const EV_SERIAL: EventCode = 2;

pub const ID_BOOT: HandlerId = 0;
pub const ID_TICK_LED: HandlerId = 1;
pub const ID_SERIAL: HandlerId = 2;
pub const ID_PROBE: HandlerId = 3;

pub type Events = EventLoop<CriticalSectionRawMutex, App, SerialEvent>;
pub type Link =
    SerialTransport<CriticalSectionRawMutex, ChannelPort, EventSink<Waking, SerialEvent>>;

/// Dispatch handle that also wakes the foreground loop
#[derive(Clone, Copy)]
pub struct Waking(pub &'static Events);

impl Dispatch<SerialEvent> for Waking {
    fn dispatch(&self, code: EventCode, arg: Option<SerialEvent>) -> Result<(), QueueFull> {
        let result = self.0.dispatch(code, arg);
        WAKE.signal(());
        result
    }
}

/// Transport events are the loop's argument type as-is
pub fn serial_arg(event: SerialEvent) -> SerialEvent {
    event
}

/// Handler context
pub struct App {
    pub events: &'static Events,
    pub link: &'static Link,
    pub led: Output<'static>,
    /// This node's shared state
    pub state: SharedState,
    /// Last state reported by the peer
    pub peer: SharedState,
    /// Ticks since the last link probe
    pub probe_ticks: u8,
}

impl App {
    pub fn new(events: &'static Events, link: &'static Link, led: Output<'static>) -> Self {
        Self {
            events,
            link,
            led,
            state: SharedState::Init,
            peer: SharedState::Init,
            probe_ticks: 0,
        }
    }
}

/// Build the handler table for this node's role
pub fn handler_table() -> Result<HandlerTable<App, SerialEvent>, TableError> {
    let table = HandlerTable::new()
        .register(Handler::new(ID_BOOT, EV_BOOT, on_boot))?
        .register(Handler::new(ID_TICK_LED, EV_TICK, on_tick_led))?
        .register(Handler::new(ID_SERIAL, EV_SERIAL, on_serial))?;

    match ROLE {
        Role::Frontend => table.register(Handler::new(ID_PROBE, EV_TICK, on_probe)),
        Role::Backend => Ok(table),
    }
}

/// Open both link gates, then retire
fn on_boot(app: &mut App, id: HandlerId, _: EventCode, _: Option<&SerialEvent>) -> bool {
    info!("{} node up", ROLE);
    app.link.rx_next();
    app.link.tx_next();
    app.events.set_enabled(id, false);
    true
}

/// Heartbeat LED; leaves the tick to later handlers
fn on_tick_led(app: &mut App, _: HandlerId, _: EventCode, _: Option<&SerialEvent>) -> bool {
    app.led.toggle();
    false
}

fn on_probe(app: &mut App, _: HandlerId, _: EventCode, _: Option<&SerialEvent>) -> bool {
    app.probe_ticks += 1;
    if app.probe_ticks < PROBE_TICKS {
        return true;
    }
    app.probe_ticks = 0;

    if app.link.tx(Packet::Sync { now: app.state }).is_err() {
        warn!("Link busy, probe skipped");
    }
    true
}

fn on_serial(app: &mut App, _: HandlerId, _: EventCode, arg: Option<&SerialEvent>) -> bool {
    let Some(event) = arg else {
        return true;
    };

    match *event {
        SerialEvent::Transmitted(packet) => {
            trace!("Sent {:?}", packet);
            app.link.tx_next();
        }
        SerialEvent::Received(packet) => {
            on_packet(app, packet);
            app.link.rx_next();
        }
        SerialEvent::ReceiveFailed(kind) => {
            warn!("Link receive failed: {:?} (flags {=u8:#x})", kind, event.flags());
        }
    }
    true
}

fn on_packet(app: &mut App, packet: Packet) {
    match (ROLE, packet) {
        (Role::Backend, Packet::Sync { .. }) => {
            if app.link.tx(Packet::Sync { now: app.state }).is_err() {
                warn!("Link busy, sync reply dropped");
            }
        }
        (Role::Frontend, Packet::Sync { now }) | (Role::Frontend, Packet::Change { now, .. }) => {
            if app.peer != now {
                info!("Peer state {:?} -> {:?}", app.peer, now);
            }
            app.peer = now;
        }
        (_, other) => debug!("Unhandled packet {:?}", other),
    }
}

//! Two nodes linked back-to-back over an in-memory wire
//!
//! Each node's transport writes into its own wire; a pump stands in for the
//! UART interrupts, moving bytes to the peer and servicing the transmit
//! interrupt while it is enabled.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use vigil_core::serial::{EventSink, SerialTransport};
use vigil_core::{Dispatch, EventCode, EventLoop, Handler, HandlerId, HandlerTable, QueueFull};
use vigil_hal::SerialPort;
use vigil_protocol::{AckStatus, Packet, RxFailure, SerialEvent, SharedState};

const EV_FRONT: EventCode = 1;
const EV_BACK: EventCode = 2;

const ID_FRONT: HandlerId = 0;
const ID_BACK: HandlerId = 1;

const UNLOCK_CODE: u16 = (4 << 6) | (3 << 4) | (2 << 2) | 1;

#[derive(Default)]
struct Wire {
    bytes: StdMutex<VecDeque<u8>>,
    tx_irq: AtomicBool,
}

impl Wire {
    fn take(&self) -> Option<u8> {
        self.bytes.lock().unwrap().pop_front()
    }
}

struct WirePort<'w>(&'w Wire);

impl SerialPort for WirePort<'_> {
    fn write_byte(&mut self, byte: u8) {
        self.0.bytes.lock().unwrap().push_back(byte);
    }

    fn set_tx_interrupt(&mut self, enabled: bool) {
        self.0.tx_irq.store(enabled, Ordering::SeqCst);
    }
}

type Sink<'a> = EventSink<&'a (dyn Dispatch<SerialEvent> + Sync), SerialEvent>;
type Transport<'a> = SerialTransport<CriticalSectionRawMutex, WirePort<'a>, Sink<'a>>;
type Loop<'a> = EventLoop<CriticalSectionRawMutex, Nodes<'a>, SerialEvent>;

/// Application context: both ends plus what each has seen
struct Nodes<'a> {
    front: &'a Transport<'a>,
    back: &'a Transport<'a>,
    front_rx: Vec<Packet>,
    front_sent: usize,
    back_rx: Vec<Packet>,
    back_failures: Vec<RxFailure>,
}

impl<'a> Nodes<'a> {
    fn new(front: &'a Transport<'a>, back: &'a Transport<'a>) -> Self {
        Self {
            front,
            back,
            front_rx: Vec::new(),
            front_sent: 0,
            back_rx: Vec::new(),
            back_failures: Vec::new(),
        }
    }
}

fn front_handler(
    cx: &mut Nodes<'_>,
    _: HandlerId,
    _: EventCode,
    arg: Option<&SerialEvent>,
) -> bool {
    match arg {
        Some(SerialEvent::Received(packet)) => {
            cx.front_rx.push(*packet);
            cx.front.rx_next();
        }
        Some(SerialEvent::Transmitted(_)) => {
            cx.front_sent += 1;
            cx.front.tx_next();
        }
        Some(SerialEvent::ReceiveFailed(_)) | None => {}
    }
    true
}

/// Backend: answer code checks, mirror state syncs
fn back_handler(
    cx: &mut Nodes<'_>,
    _: HandlerId,
    _: EventCode,
    arg: Option<&SerialEvent>,
) -> bool {
    match arg {
        Some(SerialEvent::Received(packet)) => {
            cx.back_rx.push(*packet);
            let reply = match *packet {
                Packet::CheckCode { code } if code == UNLOCK_CODE => {
                    Some(Packet::Ack(AckStatus::Ok))
                }
                Packet::CheckCode { .. } => Some(Packet::Ack(AckStatus::Error)),
                Packet::Sync { now } => Some(Packet::Sync { now }),
                _ => None,
            };
            if let Some(reply) = reply {
                cx.back.tx(reply).unwrap();
            }
            cx.back.rx_next();
        }
        Some(SerialEvent::Transmitted(_)) => cx.back.tx_next(),
        Some(SerialEvent::ReceiveFailed(kind)) => cx.back_failures.push(*kind),
        None => {}
    }
    true
}

fn wrap(event: SerialEvent) -> SerialEvent {
    event
}

fn make_loop<'a>() -> Loop<'a> {
    let table = HandlerTable::new()
        .register(Handler::new(ID_FRONT, EV_FRONT, front_handler))
        .unwrap()
        .register(Handler::new(ID_BACK, EV_BACK, back_handler))
        .unwrap();
    EventLoop::new(table)
}

/// One pass of interrupt activity for one direction
fn pump(from: &Wire, sender: &Transport<'_>, receiver: &Transport<'_>) -> bool {
    let mut active = false;
    if from.tx_irq.load(Ordering::SeqCst) {
        sender.on_tx_ready();
        active = true;
    }
    while let Some(byte) = from.take() {
        receiver.on_byte_received(byte);
        active = true;
    }
    active
}

#[test]
fn test_code_check_round_trip() {
    let front_wire = Wire::default();
    let back_wire = Wire::default();
    let events = make_loop();
    let dispatch: &(dyn Dispatch<SerialEvent> + Sync) = &events;
    let front: Transport<'_> =
        SerialTransport::new(WirePort(&front_wire), EventSink::new(dispatch, EV_FRONT, wrap));
    let back: Transport<'_> =
        SerialTransport::new(WirePort(&back_wire), EventSink::new(dispatch, EV_BACK, wrap));
    let mut nodes = Nodes::new(&front, &back);

    front.rx_next();
    front.tx_next();
    back.rx_next();
    back.tx_next();

    front.tx(Packet::CheckCode { code: UNLOCK_CODE }).unwrap();
    front.tx(Packet::CheckCode { code: 0x0001 }).unwrap();
    front.tx(Packet::Sync { now: SharedState::Armed }).unwrap();

    for _ in 0..1000 {
        let moved = pump(&front_wire, &front, &back) | pump(&back_wire, &back, &front);
        let handled = events.run(&mut nodes);
        if !moved && handled == 0 {
            break;
        }
    }

    assert_eq!(
        nodes.back_rx,
        vec![
            Packet::CheckCode { code: UNLOCK_CODE },
            Packet::CheckCode { code: 0x0001 },
            Packet::Sync { now: SharedState::Armed },
        ]
    );
    assert_eq!(
        nodes.front_rx,
        vec![
            Packet::Ack(AckStatus::Ok),
            Packet::Ack(AckStatus::Error),
            Packet::Sync { now: SharedState::Armed },
        ]
    );
    assert_eq!(nodes.front_sent, 3);
    assert!(nodes.back_failures.is_empty());
    assert!(!front.is_transmitting());
    assert!(!back.is_transmitting());
}

#[test]
fn test_unarmed_receiver_overflows_then_recovers() {
    let front_wire = Wire::default();
    let back_wire = Wire::default();
    let events = make_loop();
    let dispatch: &(dyn Dispatch<SerialEvent> + Sync) = &events;
    let front: Transport<'_> =
        SerialTransport::new(WirePort(&front_wire), EventSink::new(dispatch, EV_FRONT, wrap));
    let back: Transport<'_> =
        SerialTransport::new(WirePort(&back_wire), EventSink::new(dispatch, EV_BACK, wrap));
    let mut nodes = Nodes::new(&front, &back);

    // One frame in flight plus a full transmit queue
    front.tx_next();
    let mut accepted = 0;
    while front.tx(Packet::Sync { now: SharedState::Alert }).is_ok() {
        accepted += 1;
    }
    assert_eq!(accepted, 9);
    assert_eq!(front.tx(Packet::Sync { now: SharedState::Alert }), Err(QueueFull));

    // Backend never armed: packets pile up until its receive queue is full
    for _ in 0..1000 {
        let moved = pump(&front_wire, &front, &back);
        let handled = events.run(&mut nodes);
        if !moved && handled == 0 {
            break;
        }
    }
    assert_eq!(nodes.front_sent, 9);
    assert_eq!(back.pending_rx(), 8);
    assert_eq!(nodes.back_failures, vec![RxFailure::BufferFull]);
    assert!(nodes.back_rx.is_empty());

    // Arming drains one queued packet per delivery
    back.tx_next();
    back.rx_next();
    events.run(&mut nodes);
    assert_eq!(nodes.back_rx.len(), 8);
    assert_eq!(back.pending_rx(), 0);
}

#[test]
fn test_interrupts_on_another_thread() {
    const ROUNDS: u16 = 64;

    let front_wire = Wire::default();
    let back_wire = Wire::default();
    let events = make_loop();
    let dispatch: &(dyn Dispatch<SerialEvent> + Sync) = &events;
    let front: Transport<'_> =
        SerialTransport::new(WirePort(&front_wire), EventSink::new(dispatch, EV_FRONT, wrap));
    let back: Transport<'_> =
        SerialTransport::new(WirePort(&back_wire), EventSink::new(dispatch, EV_BACK, wrap));
    let mut nodes = Nodes::new(&front, &back);
    let stop = AtomicBool::new(false);

    front.rx_next();
    front.tx_next();
    back.rx_next();
    back.tx_next();

    std::thread::scope(|s| {
        s.spawn(|| {
            while !stop.load(Ordering::SeqCst) {
                let moved = pump(&front_wire, &front, &back) | pump(&back_wire, &back, &front);
                if !moved {
                    std::thread::yield_now();
                }
            }
        });

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut sent = 0u16;
        while nodes.front_rx.len() < usize::from(ROUNDS) && Instant::now() < deadline {
            if sent < ROUNDS && front.tx(Packet::CheckCode { code: sent }).is_ok() {
                sent += 1;
            }
            if events.run(&mut nodes) == 0 {
                std::thread::yield_now();
            }
        }
        stop.store(true, Ordering::SeqCst);
    });

    let expected: Vec<Packet> = (0..ROUNDS)
        .map(|code| {
            if code == UNLOCK_CODE {
                Packet::Ack(AckStatus::Ok)
            } else {
                Packet::Ack(AckStatus::Error)
            }
        })
        .collect();
    assert_eq!(nodes.front_rx, expected);
    let codes: Vec<Packet> = (0..ROUNDS).map(|code| Packet::CheckCode { code }).collect();
    assert_eq!(nodes.back_rx, codes);
    assert!(nodes.back_failures.is_empty());
}

//! Interrupt-driven framed serial transport
//!
//! Receive side: the byte-received interrupt feeds [`SerialTransport::on_byte_received`].
//! Completed packets go into a small receive queue; one is delivered per
//! [`SerialTransport::rx_next`] call. Framing and queue-full failures are
//! delivered immediately and do not consume the arm.
//!
//! Transmit side: [`SerialTransport::tx`] starts a frame or queues the packet;
//! the data-register-empty interrupt calls [`SerialTransport::on_tx_ready`]
//! for each following byte. A finished frame is reported only if
//! [`SerialTransport::tx_next`] armed the gate; otherwise the transmitter
//! parks the completion and stops until the next `tx_next`.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use vigil_hal::SerialPort;
use vigil_protocol::{Frame, FrameParser, Packet, RxFailure, SerialEvent, FRAME_SIZE};

use super::gate::Gate;
use crate::config::SERIAL_QUEUE_DEPTH;
use crate::event::{Dispatch, EventCode};
use crate::ring::RingBuffer;
use crate::QueueFull;

/// Receiver of transport events
///
/// Called with the transport locked, possibly from interrupt context.
/// Must not call back into the transport.
pub trait SerialSink {
    fn deliver(&self, event: SerialEvent) -> Result<(), QueueFull>;
}

impl<S: SerialSink + ?Sized> SerialSink for &S {
    fn deliver(&self, event: SerialEvent) -> Result<(), QueueFull> {
        (**self).deliver(event)
    }
}

/// Posts transport events to an event loop under a fixed code
pub struct EventSink<D, A> {
    target: D,
    code: EventCode,
    wrap: fn(SerialEvent) -> A,
}

impl<D: Dispatch<A>, A> EventSink<D, A> {
    /// `wrap` converts the transport event into the loop's argument type
    pub const fn new(target: D, code: EventCode, wrap: fn(SerialEvent) -> A) -> Self {
        Self { target, code, wrap }
    }
}

impl<D: Dispatch<A>, A> SerialSink for EventSink<D, A> {
    fn deliver(&self, event: SerialEvent) -> Result<(), QueueFull> {
        self.target.dispatch(self.code, Some((self.wrap)(event)))
    }
}

/// Link state guarded by the transport lock
struct Link<P, const N: usize> {
    port: P,

    parser: FrameParser,
    rx_queue: RingBuffer<Packet, N>,
    rx_gate: Gate<Packet>,

    tx_frame: [u8; FRAME_SIZE],
    tx_cursor: usize,
    /// Packet whose frame is being shifted out
    tx_packet: Option<Packet>,
    /// Transmitter owned by a frame (shifting out or parked in the gate)
    tx_busy: bool,
    tx_queue: RingBuffer<Packet, N>,
    tx_gate: Gate<Packet>,
}

impl<P: SerialPort, const N: usize> Link<P, N> {
    const fn new(port: P) -> Self {
        Self {
            port,
            parser: FrameParser::new(),
            rx_queue: RingBuffer::new(),
            rx_gate: Gate::new(),
            tx_frame: [0; FRAME_SIZE],
            tx_cursor: 0,
            tx_packet: None,
            tx_busy: false,
            tx_queue: RingBuffer::new(),
            tx_gate: Gate::new(),
        }
    }

    /// Load a frame and push its first byte
    fn start(&mut self, packet: Packet) {
        self.tx_frame = Frame::new(packet).to_bytes();
        self.tx_packet = Some(packet);
        self.tx_busy = true;
        self.tx_cursor = 1;
        self.port.write_byte(self.tx_frame[0]);
        self.port.set_tx_interrupt(true);
    }

    /// Start the next queued packet or go idle
    fn advance(&mut self) {
        match self.tx_queue.pop() {
            Some(next) => self.start(next),
            None => {
                self.tx_busy = false;
                self.port.set_tx_interrupt(false);
            }
        }
    }

    fn transmit(&mut self, packet: Packet) -> Result<(), QueueFull> {
        if self.tx_busy {
            return self.tx_queue.put(packet).map_err(|_| QueueFull);
        }
        self.start(packet);
        Ok(())
    }

    fn tx_ready(&mut self) -> Option<SerialEvent> {
        let Some(sent) = self.tx_packet else {
            // Nothing to shift out (idle or parked)
            self.port.set_tx_interrupt(false);
            return None;
        };

        if self.tx_cursor < FRAME_SIZE {
            self.port.write_byte(self.tx_frame[self.tx_cursor]);
            self.tx_cursor += 1;
        }
        if self.tx_cursor < FRAME_SIZE {
            return None;
        }

        self.tx_packet = None;
        if self.tx_gate.pass() {
            self.advance();
            return Some(SerialEvent::Transmitted(sent));
        }

        // Not armed: park the completion and stop transmitting
        let parked = self.tx_gate.hold(sent);
        debug_assert!(parked.is_ok());
        self.port.set_tx_interrupt(false);
        None
    }

    fn tx_next(&mut self) -> Option<SerialEvent> {
        let sent = self.tx_gate.arm()?;
        self.advance();
        Some(SerialEvent::Transmitted(sent))
    }

    fn rx_byte(&mut self, byte: u8) -> Option<SerialEvent> {
        let packet = match self.parser.feed(byte) {
            Ok(None) => return None,
            Ok(Some(packet)) => packet,
            Err(_) => return Some(SerialEvent::ReceiveFailed(RxFailure::Framing)),
        };

        if self.rx_queue.put(packet).is_err() {
            return Some(SerialEvent::ReceiveFailed(RxFailure::BufferFull));
        }
        if self.rx_gate.pass() {
            return self.rx_queue.pop().map(SerialEvent::Received);
        }
        None
    }

    fn rx_next(&mut self) -> Option<SerialEvent> {
        if let Some(packet) = self.rx_queue.pop() {
            return Some(SerialEvent::Received(packet));
        }
        let parked = self.rx_gate.arm();
        debug_assert!(parked.is_none());
        None
    }

    fn line_error(&mut self, kind: RxFailure) -> Option<SerialEvent> {
        self.parser.reset();
        Some(SerialEvent::ReceiveFailed(kind))
    }
}

/// Framed serial transport
///
/// - `R`: raw mutex guarding the link state (`CriticalSectionRawMutex` on target)
/// - `P`: UART transmit seam
/// - `S`: where transport events go
/// - `N`: packets buffered per direction (power of two)
pub struct SerialTransport<R: RawMutex, P, S, const N: usize = SERIAL_QUEUE_DEPTH> {
    link: Mutex<R, RefCell<Link<P, N>>>,
    sink: S,
}

impl<R, P, S, const N: usize> SerialTransport<R, P, S, N>
where
    R: RawMutex,
    P: SerialPort,
    S: SerialSink,
{
    /// Create an idle transport with both gates closed
    pub const fn new(port: P, sink: S) -> Self {
        Self {
            link: Mutex::new(RefCell::new(Link::new(port))),
            sink,
        }
    }

    /// Send a packet
    ///
    /// Starts transmitting immediately when idle, otherwise queues the
    /// packet. Returns `QueueFull` (queue unchanged) when no room is left.
    pub fn tx(&self, packet: Packet) -> Result<(), QueueFull> {
        let result = self.link.lock(|link| link.borrow_mut().transmit(packet));
        if result.is_err() {
            warn!("tx queue full, rejecting {:?}", packet);
        }
        result
    }

    /// Allow the next transmit completion to be delivered
    ///
    /// Delivers a parked completion right away, if there is one.
    pub fn tx_next(&self) {
        self.step(|link| link.tx_next());
    }

    /// Allow the next received packet to be delivered
    ///
    /// Delivers the oldest queued packet right away, if there is one.
    pub fn rx_next(&self) {
        self.step(|link| link.rx_next());
    }

    /// Byte-received interrupt
    pub fn on_byte_received(&self, byte: u8) {
        self.step(|link| link.rx_byte(byte));
    }

    /// Data-register-empty interrupt
    pub fn on_tx_ready(&self) {
        self.step(|link| link.tx_ready());
    }

    /// UART line error (parity, overrun) reported by the driver
    ///
    /// Drops the partial frame and delivers the failure directly.
    pub fn report_line_error(&self, kind: RxFailure) {
        debug!("line error: {:?}", kind);
        self.step(|link| link.line_error(kind));
    }

    /// Received packets waiting for `rx_next`
    pub fn pending_rx(&self) -> usize {
        self.link.lock(|link| link.borrow().rx_queue.len())
    }

    /// Packets queued behind the current transmission
    pub fn pending_tx(&self) -> usize {
        self.link.lock(|link| link.borrow().tx_queue.len())
    }

    /// Returns true while a frame is being sent or its completion is parked
    pub fn is_transmitting(&self) -> bool {
        self.link.lock(|link| link.borrow().tx_busy)
    }

    /// Run one state transition and deliver its event, all under the lock
    fn step(&self, f: impl FnOnce(&mut Link<P, N>) -> Option<SerialEvent>) {
        self.link.lock(|link| {
            let event = f(&mut link.borrow_mut());
            if let Some(event) = event {
                if self.sink.deliver(event).is_err() {
                    warn!("transport event dropped: {:?}", event);
                }
            }
        });
    }
}

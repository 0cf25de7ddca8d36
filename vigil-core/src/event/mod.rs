//! Event dispatch core
//!
//! Interrupt handlers and application code post [`Event`]s into a single
//! queue; the foreground drain loop pops them in FIFO order and hands each
//! to every enabled table entry registered for its code, in table order,
//! until one of them claims it.

pub mod event_loop;
pub mod handler;

pub use event_loop::EventLoop;
pub use handler::{Handler, HandlerFn, HandlerTable, TableError};

use crate::QueueFull;

/// Event code (non-unique across table entries)
pub type EventCode = u8;

/// Handler entry id (unique within a table)
pub type HandlerId = u8;

/// A queued notification
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Event<A> {
    pub code: EventCode,
    pub arg: Option<A>,
}

impl<A> Event<A> {
    /// Event with an argument
    pub const fn new(code: EventCode, arg: A) -> Self {
        Self {
            code,
            arg: Some(arg),
        }
    }

    /// Event without an argument
    pub const fn bare(code: EventCode) -> Self {
        Self { code, arg: None }
    }
}

/// Anything events can be posted to
///
/// Producers that must not know the full event loop type (interrupt-side
/// code, the serial transport) hold a `&dyn Dispatch<A>`.
pub trait Dispatch<A> {
    /// Queue an event; never blocks, drops the event when the queue is full
    fn dispatch(&self, code: EventCode, arg: Option<A>) -> Result<(), QueueFull>;
}

impl<A, D: Dispatch<A> + ?Sized> Dispatch<A> for &D {
    fn dispatch(&self, code: EventCode, arg: Option<A>) -> Result<(), QueueFull> {
        (**self).dispatch(code, arg)
    }
}

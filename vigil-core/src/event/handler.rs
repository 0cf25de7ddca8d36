//! Handler table
//!
//! The table is assembled once at startup and is read-only afterwards,
//! except for each entry's enabled flag. Entry order is both registration
//! order and dispatch priority among entries sharing a code.

use portable_atomic::{AtomicBool, Ordering};

use super::{EventCode, HandlerId};
use crate::config::MAX_HANDLERS;

/// Handler function
///
/// Receives the application context, the entry's id, the event code and the
/// event argument. Returning `true` claims the event: remaining entries for
/// the same code are skipped for this event.
pub type HandlerFn<C, A> = fn(&mut C, HandlerId, EventCode, Option<&A>) -> bool;

/// Errors while assembling a handler table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TableError {
    /// Table capacity exhausted
    Full,
    /// An entry with this id is already registered
    DuplicateId(HandlerId),
}

/// One table entry
pub struct Handler<C, A> {
    id: HandlerId,
    code: EventCode,
    func: HandlerFn<C, A>,
    enabled: AtomicBool,
}

impl<C, A> Handler<C, A> {
    /// Entry that starts enabled
    pub const fn new(id: HandlerId, code: EventCode, func: HandlerFn<C, A>) -> Self {
        Self {
            id,
            code,
            func,
            enabled: AtomicBool::new(true),
        }
    }

    /// Entry that starts disabled
    pub const fn disabled(id: HandlerId, code: EventCode, func: HandlerFn<C, A>) -> Self {
        Self {
            id,
            code,
            func,
            enabled: AtomicBool::new(false),
        }
    }

    /// Entry id
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Event code this entry handles
    pub fn code(&self) -> EventCode {
        self.code
    }

    /// Returns true if the entry is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub(crate) fn call(&self, cx: &mut C, code: EventCode, arg: Option<&A>) -> bool {
        (self.func)(cx, self.id, code, arg)
    }
}

impl<C, A> core::fmt::Debug for Handler<C, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.id)
            .field("code", &self.code)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Ordered, fixed-capacity list of handler entries
///
/// Backed by a plain array so a table may hold handlers whose context
/// borrows the event loop that owns the table.
pub struct HandlerTable<C, A, const H: usize = MAX_HANDLERS> {
    entries: [Option<Handler<C, A>>; H],
    len: usize,
}

impl<C, A, const H: usize> Default for HandlerTable<C, A, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, A, const H: usize> HandlerTable<C, A, H> {
    const EMPTY: Option<Handler<C, A>> = None;

    /// Create an empty table
    pub const fn new() -> Self {
        Self {
            entries: [Self::EMPTY; H],
            len: 0,
        }
    }

    /// Append an entry
    ///
    /// Ids must be unique; appending a duplicate id is rejected.
    pub fn register(mut self, handler: Handler<C, A>) -> Result<Self, TableError> {
        if self.find(handler.id).is_some() {
            return Err(TableError::DuplicateId(handler.id));
        }
        let slot = self.entries.get_mut(self.len).ok_or(TableError::Full)?;
        *slot = Some(handler);
        self.len += 1;
        Ok(self)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entries in dispatch order
    pub fn iter(&self) -> impl Iterator<Item = &Handler<C, A>> {
        self.entries[..self.len].iter().flatten()
    }

    /// Entry with the given id
    pub fn find(&self, id: HandlerId) -> Option<&Handler<C, A>> {
        self.iter().find(|h| h.id == id)
    }
}

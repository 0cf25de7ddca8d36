//! The drain loop
//!
//! Owns the global event queue and the handler table. Producers may run in
//! interrupt context and call [`EventLoop::dispatch`] at any time; the
//! foreground calls [`EventLoop::run`] once per idle cycle.

use embassy_sync::blocking_mutex::raw::RawMutex;

use super::handler::HandlerTable;
use super::{Dispatch, Event, EventCode, HandlerId};
use crate::config::{EVENT_QUEUE_DEPTH, MAX_HANDLERS};
use crate::ring::SharedRing;
use crate::QueueFull;

/// Event queue plus handler table
///
/// - `R`: raw mutex guarding the queue (`CriticalSectionRawMutex` on target)
/// - `C`: application context handed to every handler
/// - `A`: event argument type
/// - `Q`: queue capacity (power of two)
/// - `H`: handler table capacity
pub struct EventLoop<
    R: RawMutex,
    C,
    A,
    const Q: usize = EVENT_QUEUE_DEPTH,
    const H: usize = MAX_HANDLERS,
> {
    queue: SharedRing<R, Event<A>, Q>,
    table: HandlerTable<C, A, H>,
}

impl<R: RawMutex, C, A, const Q: usize, const H: usize> EventLoop<R, C, A, Q, H> {
    /// Create an event loop over a fully assembled handler table
    pub const fn new(table: HandlerTable<C, A, H>) -> Self {
        Self {
            queue: SharedRing::new(),
            table,
        }
    }

    /// Queue an event
    ///
    /// Never blocks. When the queue is full the event is dropped and
    /// `QueueFull` is returned; callers in interrupt context typically
    /// ignore it.
    pub fn dispatch(&self, code: EventCode, arg: Option<A>) -> Result<(), QueueFull> {
        self.queue.put(Event { code, arg }).map_err(|event| {
            warn!("event queue full, dropping code {}", event.code);
            QueueFull
        })
    }

    /// Enable or disable the entry with `id`
    ///
    /// Returns false if no entry has that id.
    pub fn set_enabled(&self, id: HandlerId, enabled: bool) -> bool {
        match self.table.find(id) {
            Some(handler) => {
                handler.set_enabled(enabled);
                true
            }
            None => {
                debug!("set_enabled: no handler with id {}", id);
                false
            }
        }
    }

    /// Enable or disable every entry registered for `code`
    pub fn set_enabled_by_code(&self, code: EventCode, enabled: bool) {
        self.table
            .iter()
            .filter(|h| h.code() == code)
            .for_each(|h| h.set_enabled(enabled));
    }

    /// Returns the enabled flag of the entry with `id`
    pub fn is_enabled(&self, id: HandlerId) -> Option<bool> {
        self.table.find(id).map(|h| h.is_enabled())
    }

    /// Number of queued events
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drain the queue
    ///
    /// Pops events until the queue is empty, including events queued by the
    /// handlers themselves or by interrupts while draining. For each event,
    /// every enabled entry with a matching code is called in table order
    /// until one returns `true`.
    ///
    /// Handlers run with the queue unlocked. Returns the number of events
    /// processed (saturating); zero means the caller may sleep.
    pub fn run(&self, cx: &mut C) -> u8 {
        let mut processed: u8 = 0;

        while let Some(event) = self.queue.pop() {
            let arg = event.arg.as_ref();

            for handler in self.table.iter() {
                if !handler.is_enabled() || handler.code() != event.code {
                    continue;
                }
                if handler.call(cx, event.code, arg) {
                    trace!("event {} claimed by {}", event.code, handler.id());
                    break;
                }
            }

            processed = processed.saturating_add(1);
        }

        processed
    }
}

impl<R: RawMutex, C, A, const Q: usize, const H: usize> Dispatch<A>
    for EventLoop<R, C, A, Q, H>
{
    fn dispatch(&self, code: EventCode, arg: Option<A>) -> Result<(), QueueFull> {
        EventLoop::dispatch(self, code, arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Handler;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use heapless::Vec;

    const CODE_X: EventCode = 1;
    const CODE_Y: EventCode = 2;

    const ID_A: HandlerId = 10;
    const ID_B: HandlerId = 11;
    const ID_C: HandlerId = 12;

    /// Records (id, code, arg) of every call
    #[derive(Default)]
    struct Recorder {
        calls: Vec<(HandlerId, EventCode, Option<u8>), 32>,
        a_claims: bool,
    }

    fn record(cx: &mut Recorder, id: HandlerId, code: EventCode, arg: Option<&u8>) {
        cx.calls.push((id, code, arg.copied())).unwrap();
    }

    fn handler_a(cx: &mut Recorder, id: HandlerId, code: EventCode, arg: Option<&u8>) -> bool {
        record(cx, id, code, arg);
        cx.a_claims
    }

    fn handler_passive(
        cx: &mut Recorder,
        id: HandlerId,
        code: EventCode,
        arg: Option<&u8>,
    ) -> bool {
        record(cx, id, code, arg);
        false
    }

    type TestLoop = EventLoop<NoopRawMutex, Recorder, u8, 4, 4>;

    fn make_loop() -> TestLoop {
        let table = HandlerTable::new()
            .register(Handler::new(ID_A, CODE_X, handler_a))
            .unwrap()
            .register(Handler::new(ID_B, CODE_X, handler_passive))
            .unwrap()
            .register(Handler::new(ID_C, CODE_Y, handler_passive))
            .unwrap();
        EventLoop::new(table)
    }

    #[test]
    fn test_claiming_handler_stops_scan() {
        let el = make_loop();
        let mut cx = Recorder {
            a_claims: true,
            ..Default::default()
        };

        el.dispatch(CODE_X, Some(5)).unwrap();
        assert_eq!(el.run(&mut cx), 1);
        assert_eq!(cx.calls.as_slice(), &[(ID_A, CODE_X, Some(5))]);
    }

    #[test]
    fn test_non_claiming_handlers_run_in_table_order() {
        let el = make_loop();
        let mut cx = Recorder::default();

        el.dispatch(CODE_X, None).unwrap();
        assert_eq!(el.run(&mut cx), 1);
        assert_eq!(
            cx.calls.as_slice(),
            &[(ID_A, CODE_X, None), (ID_B, CODE_X, None)]
        );
    }

    #[test]
    fn test_claim_only_affects_current_event() {
        let el = make_loop();
        let mut cx = Recorder {
            a_claims: true,
            ..Default::default()
        };

        el.dispatch(CODE_X, Some(1)).unwrap();
        el.dispatch(CODE_Y, Some(2)).unwrap();
        assert_eq!(el.run(&mut cx), 2);
        assert_eq!(
            cx.calls.as_slice(),
            &[(ID_A, CODE_X, Some(1)), (ID_C, CODE_Y, Some(2))]
        );
    }

    #[test]
    fn test_disable_by_id() {
        let el = make_loop();
        let mut cx = Recorder {
            a_claims: true,
            ..Default::default()
        };

        assert!(el.set_enabled(ID_A, false));
        assert_eq!(el.is_enabled(ID_A), Some(false));
        assert_eq!(el.is_enabled(ID_B), Some(true));

        el.dispatch(CODE_X, None).unwrap();
        el.run(&mut cx);
        assert_eq!(cx.calls.as_slice(), &[(ID_B, CODE_X, None)]);

        assert!(el.set_enabled(ID_A, true));
        cx.calls.clear();
        el.dispatch(CODE_X, None).unwrap();
        el.run(&mut cx);
        assert_eq!(cx.calls.as_slice(), &[(ID_A, CODE_X, None)]);
    }

    #[test]
    fn test_set_enabled_unknown_id() {
        let el = make_loop();
        assert!(!el.set_enabled(99, false));
        assert_eq!(el.is_enabled(99), None);
    }

    #[test]
    fn test_disable_by_code() {
        let el = make_loop();
        let mut cx = Recorder::default();

        el.set_enabled_by_code(CODE_X, false);
        assert_eq!(el.is_enabled(ID_C), Some(true));

        el.dispatch(CODE_X, None).unwrap();
        el.dispatch(CODE_Y, None).unwrap();
        assert_eq!(el.run(&mut cx), 2);
        assert_eq!(cx.calls.as_slice(), &[(ID_C, CODE_Y, None)]);

        el.set_enabled_by_code(CODE_X, true);
        assert_eq!(el.is_enabled(ID_A), Some(true));
        assert_eq!(el.is_enabled(ID_B), Some(true));
    }

    #[test]
    fn test_unmatched_event_still_counts() {
        let el = make_loop();
        let mut cx = Recorder::default();

        el.dispatch(42, None).unwrap();
        assert_eq!(el.run(&mut cx), 1);
        assert!(cx.calls.is_empty());
        assert_eq!(el.run(&mut cx), 0);
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let el = make_loop();
        let mut cx = Recorder::default();

        for arg in 0..4 {
            el.dispatch(CODE_Y, Some(arg)).unwrap();
        }
        assert_eq!(el.dispatch(CODE_Y, Some(4)), Err(QueueFull));
        assert_eq!(el.pending(), 4);

        assert_eq!(el.run(&mut cx), 4);
        let args: Vec<Option<u8>, 8> = cx.calls.iter().map(|c| c.2).collect();
        assert_eq!(args.as_slice(), &[Some(0), Some(1), Some(2), Some(3)]);
    }

    /// Context for handlers that post further events while running
    struct Chained<'a> {
        events: &'a dyn Dispatch<u8>,
        seen: Vec<u8, 16>,
    }

    fn chain(cx: &mut Chained<'_>, _: HandlerId, code: EventCode, arg: Option<&u8>) -> bool {
        let n = arg.copied().unwrap_or(0);
        cx.seen.push(n).unwrap();
        if n < 5 {
            let _ = cx.events.dispatch(code, Some(n + 1));
        }
        true
    }

    #[test]
    fn test_events_posted_by_handlers_are_drained() {
        let proxy: EventLoop<NoopRawMutex, Chained<'_>, u8, 4, 1> =
            EventLoop::new(HandlerTable::new().register(Handler::new(0, CODE_X, chain)).unwrap());
        let mut cx = Chained {
            events: &proxy,
            seen: Vec::new(),
        };

        proxy.dispatch(CODE_X, Some(0)).unwrap();
        assert_eq!(proxy.run(&mut cx), 6);
        assert_eq!(cx.seen.as_slice(), &[0, 1, 2, 3, 4, 5]);
    }
}

//! Build-time sizing
//!
//! Every queue in the core is a fixed-capacity ring; these are the default
//! capacities used by both nodes. Ring capacities must be powers of two.

/// Global event queue capacity (2^5)
pub const EVENT_QUEUE_DEPTH: usize = 1 << 5;

/// Packets buffered per link direction (2^3)
pub const SERIAL_QUEUE_DEPTH: usize = 1 << 3;

/// Maximum entries in a handler table
pub const MAX_HANDLERS: usize = 16;

//! One-shot delivery gate
//!
//! Paces transport events to the application: each arm call authorizes
//! exactly one delivery. A completion that finds the gate closed is either
//! left queued by the caller or parked in the gate itself ([`Gate::hold`])
//! until the next arm call collects it.
//!
//! ```text
//!            arm()                 pass()
//!   Idle ───────────▶ Armed ───────────────▶ Idle
//!    │                  │ arm() (no-op)
//!    │ hold(x)          ▼
//!    └──────────▶ Blocked(x) ── arm() → x ──▶ Idle
//! ```

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gate<T> {
    /// Closed, nothing held
    #[default]
    Idle,
    /// Next completion may be delivered
    Armed,
    /// A completion is parked awaiting the next arm call
    Blocked(T),
}

impl<T> Gate<T> {
    /// Closed gate
    pub const fn new() -> Self {
        Gate::Idle
    }

    /// Returns true if the next completion may be delivered
    pub fn is_armed(&self) -> bool {
        matches!(self, Gate::Armed)
    }

    /// Returns true if a completion is parked
    pub fn is_blocked(&self) -> bool {
        matches!(self, Gate::Blocked(_))
    }

    /// Application arm call
    ///
    /// If a completion is parked, hands it out and closes the gate (the arm
    /// is consumed by that delivery). Otherwise opens the gate.
    pub fn arm(&mut self) -> Option<T> {
        match core::mem::replace(self, Gate::Idle) {
            Gate::Blocked(item) => Some(item),
            Gate::Idle | Gate::Armed => {
                *self = Gate::Armed;
                None
            }
        }
    }

    /// Consume the arm for one delivery
    ///
    /// Returns false (and leaves the gate unchanged) if not armed.
    pub fn pass(&mut self) -> bool {
        if self.is_armed() {
            *self = Gate::Idle;
            true
        } else {
            false
        }
    }

    /// Park a completion that could not be delivered
    ///
    /// Only valid while the gate is idle; a parked item is never replaced.
    pub fn hold(&mut self, item: T) -> Result<(), T> {
        match self {
            Gate::Idle => {
                *self = Gate::Blocked(item);
                Ok(())
            }
            Gate::Armed | Gate::Blocked(_) => Err(item),
        }
    }
}

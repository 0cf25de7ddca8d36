//! Node configuration
//!
//! Values come from node.toml, validated and turned into constants by
//! build.rs.

use vigil_hal::UartConfig;

/// Which end of the link this node is
#[derive(Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Role {
    /// Sensors and actuators; answers link probes
    Backend,
    /// Keypad and display; probes the backend
    Frontend,
}

include!(concat!(env!("OUT_DIR"), "/node_config.rs"));

/// Tick period in milliseconds
pub const TICK_PERIOD_MS: u64 = 1000 / TICK_HZ;

/// Link UART settings (8E1 at the configured rate)
pub fn link_uart() -> UartConfig {
    UartConfig::default().with_baudrate(BAUDRATE)
}

//! Vigil Hardware Abstraction Layer
//!
//! This crate defines the hardware seams the link core is written against.
//! Chip-specific code implements these traits; the core never touches
//! registers directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  vigil-firmware (tasks, handlers)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  vigil-core (event loop, transport)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  vigil-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::SerialPort`] - Interrupt-driven byte transmission

#![no_std]
#![deny(unsafe_code)]

pub mod uart;

pub use uart::{DataBits, Parity, SerialPort, StopBits, UartConfig};

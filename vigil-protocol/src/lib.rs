//! Vigil Link Protocol
//!
//! This crate defines the point-to-point serial protocol between the
//! backend node (sensors, siren) and the frontend node (keypad, display).
//! Both nodes run the same link code; only the packets they act on differ.
//!
//! # Protocol Overview
//!
//! Every packet travels in a fixed-size frame:
//! ```text
//! ┌──────────┬─────────────────────┬───────────┐
//! │ PREAMBLE │ PACKET              │ POSTAMBLE │
//! │ 4B       │ 1B type + 4B content│ 4B        │
//! └──────────┴─────────────────────┴───────────┘
//! ```
//!
//! The receiver realigns itself after line noise by sliding over the
//! incoming bytes until the preamble matches.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod events;
pub mod frame;
pub mod packet;

pub use events::{RxFailure, SerialEvent};
pub use frame::{Frame, FrameError, FrameParser, FRAME_SIZE, POSTAMBLE, PREAMBLE};
pub use packet::{AckStatus, Packet, PacketError, SharedState, PACKET_SIZE};

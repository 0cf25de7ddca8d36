//! Frame encoding and decoding for the node-to-node link.
//!
//! Frame format:
//! - PREAMBLE (4 bytes): fixed 32-bit pattern, little-endian
//! - PACKET (5 bytes): fixed-size packet, see [`crate::packet`]
//! - POSTAMBLE (4 bytes): fixed 32-bit pattern, little-endian
//!
//! There is no length field or checksum; alignment is recovered by sliding
//! the receive window one byte at a time until the preamble matches.

use crate::packet::{Packet, PacketError, PACKET_SIZE};

/// Frame preamble (low self-correlation bit pattern)
pub const PREAMBLE: u32 = 0b1100_1100_1100_1010_1010_1101_0011_0110;

/// Frame postamble
pub const POSTAMBLE: u32 = 0b0110_0011_0011_0101_0101_0011_0011_0011;

/// Preamble length in bytes
pub const PREAMBLE_LEN: usize = 4;

/// Postamble length in bytes
pub const POSTAMBLE_LEN: usize = 4;

/// Complete frame size (PREAMBLE + PACKET + POSTAMBLE)
pub const FRAME_SIZE: usize = PREAMBLE_LEN + PACKET_SIZE + POSTAMBLE_LEN;

const PREAMBLE_BYTES: [u8; PREAMBLE_LEN] = PREAMBLE.to_le_bytes();
const POSTAMBLE_BYTES: [u8; POSTAMBLE_LEN] = POSTAMBLE.to_le_bytes();
const POSTAMBLE_AT: usize = PREAMBLE_LEN + PACKET_SIZE;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Leading bytes are not the preamble
    InvalidPreamble,
    /// Trailing bytes are not the postamble
    InvalidPostamble,
    /// Framing was intact but the payload is not a valid packet
    InvalidPacket(PacketError),
    /// Input shorter than a frame
    Incomplete,
    /// Buffer too small for encoding
    BufferTooSmall,
}

impl From<PacketError> for FrameError {
    fn from(err: PacketError) -> Self {
        FrameError::InvalidPacket(err)
    }
}

/// A packet wrapped for the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    pub packet: Packet,
}

impl Frame {
    /// Wrap a packet
    pub const fn new(packet: Packet) -> Self {
        Self { packet }
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let out = buffer
            .get_mut(..FRAME_SIZE)
            .ok_or(FrameError::BufferTooSmall)?;

        out[..PREAMBLE_LEN].copy_from_slice(&PREAMBLE_BYTES);
        out[PREAMBLE_LEN..POSTAMBLE_AT].copy_from_slice(&self.packet.encode());
        out[POSTAMBLE_AT..].copy_from_slice(&POSTAMBLE_BYTES);

        Ok(FRAME_SIZE)
    }

    /// Encode this frame into a fixed-size array
    pub fn to_bytes(&self) -> [u8; FRAME_SIZE] {
        let mut bytes = [0u8; FRAME_SIZE];
        // Cannot fail: the array is exactly one frame long
        let _ = self.encode(&mut bytes);
        bytes
    }

    /// Decode one complete, aligned frame
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        let bytes = bytes.get(..FRAME_SIZE).ok_or(FrameError::Incomplete)?;

        if bytes[..PREAMBLE_LEN] != PREAMBLE_BYTES {
            return Err(FrameError::InvalidPreamble);
        }
        unpack(bytes).map(Frame::new)
    }
}

/// Check the postamble and unpack the packet of an aligned frame
fn unpack(bytes: &[u8]) -> Result<Packet, FrameError> {
    if bytes[POSTAMBLE_AT..FRAME_SIZE] != POSTAMBLE_BYTES {
        return Err(FrameError::InvalidPostamble);
    }

    let mut payload = [0u8; PACKET_SIZE];
    payload.copy_from_slice(&bytes[PREAMBLE_LEN..POSTAMBLE_AT]);
    Ok(Packet::decode(&payload)?)
}

/// Byte-at-a-time frame receiver
///
/// Fed from the byte-received interrupt. Once four bytes are buffered they
/// must equal the preamble; otherwise the oldest byte is discarded and the
/// window slides forward by one. A full frame yields either a packet or an
/// error, and the receiver starts over either way.
#[derive(Debug, Clone)]
pub struct FrameParser {
    buffer: [u8; FRAME_SIZE],
    cursor: usize,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub const fn new() -> Self {
        Self {
            buffer: [0; FRAME_SIZE],
            cursor: 0,
        }
    }

    /// Drop any partially received frame
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Number of bytes currently buffered
    pub fn buffered(&self) -> usize {
        self.cursor
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(packet))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` when a complete frame
    /// failed its postamble or packet check.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Packet>, FrameError> {
        if self.cursor < FRAME_SIZE {
            self.buffer[self.cursor] = byte;
            self.cursor += 1;

            // Slide the window until the preamble lines up
            if self.cursor == PREAMBLE_LEN && self.buffer[..PREAMBLE_LEN] != PREAMBLE_BYTES {
                self.buffer.copy_within(1..PREAMBLE_LEN, 0);
                self.cursor -= 1;
            }
        }

        if self.cursor < FRAME_SIZE {
            return Ok(None);
        }

        self.cursor = 0;
        unpack(&self.buffer).map(Some)
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame result, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Packet>, FrameError> {
        for &byte in bytes {
            if let Some(packet) = self.feed(byte)? {
                return Ok(Some(packet));
            }
        }
        Ok(None)
    }
}

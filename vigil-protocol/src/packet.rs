//! Packets exchanged between the backend and frontend nodes
//!
//! A packet is a fixed-size tagged union: one type byte followed by a
//! content area sized for the largest variant. Unused content bytes are
//! zero on encode and ignored on decode.

/// Size of the content area (largest variant: two u16 codes)
pub const CONTENT_SIZE: usize = 4;

/// Encoded packet size (type byte + content)
pub const PACKET_SIZE: usize = 1 + CONTENT_SIZE;

// Packet type tags
pub const PKT_ACK: u8 = 0;
pub const PKT_SYNC: u8 = 1;
pub const PKT_CHANGE: u8 = 2;
pub const PKT_CHKCODE: u8 = 3;
pub const PKT_NEWCODE: u8 = 4;

/// Errors from decoding a packet payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// Unknown packet type tag
    UnknownType(u8),
    /// Content byte is not a valid enumeration value
    InvalidContent,
}

/// Alarm state shared (and kept in sync) between both nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SharedState {
    /// Uninitialized
    #[default]
    Init,
    /// Waiting for motion
    Armed,
    /// Motion detected, alarm timeout running
    Alert,
    /// Alarm sounding
    Alarm,
    /// Unlocked, alarm off
    Unlocked,
}

impl SharedState {
    /// Parse a state from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(SharedState::Init),
            1 => Some(SharedState::Armed),
            2 => Some(SharedState::Alert),
            3 => Some(SharedState::Alarm),
            4 => Some(SharedState::Unlocked),
            _ => None,
        }
    }

    /// Convert to wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            SharedState::Init => 0,
            SharedState::Armed => 1,
            SharedState::Alert => 2,
            SharedState::Alarm => 3,
            SharedState::Unlocked => 4,
        }
    }
}

/// Acknowledgement status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckStatus {
    Ok,
    Error,
}

/// Packet sent between frontend and backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Packet {
    /// Acknowledge the previous transmission
    Ack(AckStatus),
    /// Synchronize shared state
    Sync { now: SharedState },
    /// Shared state change
    Change { old: SharedState, now: SharedState },
    /// Unlock with code
    CheckCode { code: u16 },
    /// Change the unlock code
    NewCode { old_code: u16, new_code: u16 },
}

impl Packet {
    /// Wire type tag of this packet
    pub fn type_tag(&self) -> u8 {
        match self {
            Packet::Ack(_) => PKT_ACK,
            Packet::Sync { .. } => PKT_SYNC,
            Packet::Change { .. } => PKT_CHANGE,
            Packet::CheckCode { .. } => PKT_CHKCODE,
            Packet::NewCode { .. } => PKT_NEWCODE,
        }
    }

    /// Pack this packet into its fixed-size wire form
    pub fn encode(&self) -> [u8; PACKET_SIZE] {
        let mut out = [0u8; PACKET_SIZE];
        out[0] = self.type_tag();
        let content = &mut out[1..];

        match *self {
            Packet::Ack(status) => {
                content[0] = match status {
                    AckStatus::Ok => 0,
                    AckStatus::Error => 1,
                };
            }
            Packet::Sync { now } => content[0] = now.to_byte(),
            Packet::Change { old, now } => {
                content[0] = old.to_byte();
                content[1] = now.to_byte();
            }
            Packet::CheckCode { code } => content[..2].copy_from_slice(&code.to_le_bytes()),
            Packet::NewCode { old_code, new_code } => {
                content[..2].copy_from_slice(&old_code.to_le_bytes());
                content[2..4].copy_from_slice(&new_code.to_le_bytes());
            }
        }

        out
    }

    /// Unpack a packet from its fixed-size wire form
    pub fn decode(bytes: &[u8; PACKET_SIZE]) -> Result<Self, PacketError> {
        let content = &bytes[1..];
        let state = |b: u8| SharedState::from_byte(b).ok_or(PacketError::InvalidContent);
        let word = |i: usize| u16::from_le_bytes([content[i], content[i + 1]]);

        match bytes[0] {
            PKT_ACK => match content[0] {
                0 => Ok(Packet::Ack(AckStatus::Ok)),
                1 => Ok(Packet::Ack(AckStatus::Error)),
                _ => Err(PacketError::InvalidContent),
            },
            PKT_SYNC => Ok(Packet::Sync {
                now: state(content[0])?,
            }),
            PKT_CHANGE => Ok(Packet::Change {
                old: state(content[0])?,
                now: state(content[1])?,
            }),
            PKT_CHKCODE => Ok(Packet::CheckCode { code: word(0) }),
            PKT_NEWCODE => Ok(Packet::NewCode {
                old_code: word(0),
                new_code: word(2),
            }),
            other => Err(PacketError::UnknownType(other)),
        }
    }
}

//! Header value objects untuk twoway dan control message
//!
//! Twoway layout (60 bytes, big-endian):
//! ┌─────┬───────┬───────┬─────────┬──────┬───────┬────────┬────────┬─────┐
//! │ ver │ mtype │ label │   tag   │ ver2 │ rcode │ ttl+3  │ tos+3  │ inc │
//! │  1  │   1   │   2   │    4    │  1   │   1   │   4    │   4    │  2  │
//! ├─────┴───────┴───┬───┴─────────┴──────┴───────┴────────┴────────┴─────┤
//! │ seq0 (4) seq1(4)│ t0 (8) │ t1 (8) │ t2 (8) │ t3 (8, reserved)         │
//! └─────────────────┴────────┴────────┴────────┴──────────────────────────┘
//!
//! Control layout (8 bytes): ver, mtype, pad1, pad2, tag2 (u32).
//! Keduanya boleh diikuti satu null-terminated text payload.

use super::timestamp::Timeval;

/// Tag protokol twoway (diwarisi dari pt twoway)
pub const TWOWAY_TAG: u32 = 0xcf30e506;
/// Versi protokol outer envelope
pub const PROTO_VERSION: u8 = 4;

/// Fixed region twoway header
pub const TWOWAY_HEADER_SIZE: usize = 60;
/// Fixed region control header
pub const CONTROL_HEADER_SIZE: usize = 8;

/// Offset setelah seq1 + t0; bagian ini selalu ditulis tanpa truncation
pub const TWOWAY_MIN_ENCODE_SIZE: usize = 36;

/// Tipe pesan (byte ke-2 di kedua header)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Control message, lihat [`ControlHeader`]
    Control = 0,
    /// Twoway data/measurement message, lihat [`TwowayHeader`]
    Twoway = 8,
}

impl MessageType {
    #[inline(always)]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Control),
            8 => Some(Self::Twoway),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Intip message type dari raw packet tanpa decode penuh.
///
/// Dipakai transport untuk memilih codec.
#[inline(always)]
pub fn peek_message_type(buf: &[u8]) -> Option<MessageType> {
    buf.get(1).copied().and_then(MessageType::from_u8)
}

/// Twoway measurement header
///
/// `t3` ada di wire tapi encoder tidak pernah menulisnya; isinya
/// adalah apa pun yang sudah ada di buffer pengirim. Decoder tetap
/// mengisinya supaya simetris, jangan dipakai untuk perhitungan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TwowayHeader {
    pub version: u8,
    /// Raw message type; lihat [`TwowayHeader::kind`]
    pub message_type: u8,
    pub label: u16,
    pub tag: u32,
    /// Versi inner (measurement) protocol
    pub version2: u8,
    /// Status code dari reflector
    pub rcode: u8,
    pub ttl: u8,
    pub tos: u8,
    /// Sequence increment counter
    pub inc: u16,
    /// Sender (upstream) sequence number
    pub seq0: u32,
    /// Reflector (downstream) sequence number
    pub seq1: u32,
    /// Sender transmit
    pub t0: Timeval,
    /// Reflector receive
    pub t1: Timeval,
    /// Reflector transmit
    pub t2: Timeval,
    /// Sender receive (reserved on the wire)
    pub t3: Timeval,
}

impl TwowayHeader {
    /// Header request baru dari sender dengan default protocol constants
    pub fn request(seq0: u32, t0: Timeval) -> Self {
        Self {
            version: PROTO_VERSION,
            message_type: MessageType::Twoway.as_u8(),
            tag: TWOWAY_TAG,
            version2: PROTO_VERSION,
            seq0,
            t0,
            ..Default::default()
        }
    }

    #[inline(always)]
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::from_u8(self.message_type)
    }

    /// Validasi tag dan message type
    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        self.tag == TWOWAY_TAG && self.kind() == Some(MessageType::Twoway)
    }
}

/// Control envelope header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlHeader {
    pub version: u8,
    pub message_type: u8,
    /// Reserved, dikirim apa adanya
    pub pad1: u8,
    /// Reserved, dikirim apa adanya
    pub pad2: u8,
    pub tag2: u32,
}

impl ControlHeader {
    pub fn new(tag2: u32) -> Self {
        Self {
            version: PROTO_VERSION,
            message_type: MessageType::Control.as_u8(),
            tag2,
            ..Default::default()
        }
    }

    #[inline(always)]
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::from_u8(self.message_type)
    }
}

//! Protocol Layer: Bit-exact twoway/control wire codec
//!
//! Prinsip desain:
//! - Big-endian untuk semua multi-byte field
//! - Fixed-size headers: 60 bytes (twoway), 8 bytes (control)
//! - No allocation: encode ke caller buffer, decode meminjam payload

mod control;
mod cursor;
mod dump;
mod error;
mod message;
mod timestamp;
mod twoway;

pub use control::{
    decode as decode_control, encode as encode_control, ControlFrame,
};
pub use cursor::{ReadCursor, WriteCursor};
pub use dump::{msg_dump, msg_dump_string};
pub use error::CodecError;
pub use message::{
    peek_message_type, ControlHeader, MessageType, TwowayHeader, CONTROL_HEADER_SIZE,
    PROTO_VERSION, TWOWAY_HEADER_SIZE, TWOWAY_MIN_ENCODE_SIZE, TWOWAY_TAG,
};
pub use timestamp::{from_fixed_point, to_fixed_point, TimeDelta, Timeval};
pub use twoway::{
    decode as decode_twoway, encode_best_effort as encode_twoway_best_effort, TwowayEncoded,
    TwowayFrame,
};

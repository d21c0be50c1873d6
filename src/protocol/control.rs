//! Control codec: 8-byte envelope + null-terminated config text
//!
//! Tidak ada padding: panjang message = envelope + payload (termasuk
//! terminator), jadi caller tahu persis berapa byte yang dikirim.

use tracing::debug;

use super::cursor::{text_bytes, ReadCursor, WriteCursor};
use super::error::CodecError;
use super::message::{ControlHeader, CONTROL_HEADER_SIZE};

/// Hasil decode control message (zero-copy untuk payload)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlFrame<'a> {
    pub header: ControlHeader,
    /// Payload tanpa null terminator
    pub payload: Option<&'a [u8]>,
    pub consumed: usize,
}

impl<'a> ControlFrame<'a> {
    pub fn payload_str(&self) -> Option<&'a str> {
        self.payload.and_then(|p| std::str::from_utf8(p).ok())
    }
}

/// Encode control header dan optional text ke `buf`.
///
/// Returns jumlah byte yang ditulis (envelope + text + terminator).
///
/// # Errors
///
/// [`CodecError::BufferTooSmall`] jika envelope atau text tidak muat.
/// Tidak ada truncation policy untuk control message.
pub fn encode(
    header: &ControlHeader,
    text: Option<&str>,
    buf: &mut [u8],
) -> Result<usize, CodecError> {
    if buf.len() < CONTROL_HEADER_SIZE {
        return Err(CodecError::BufferTooSmall {
            needed: CONTROL_HEADER_SIZE,
            available: buf.len(),
        });
    }

    let mut w = WriteCursor::new(buf);
    w.put_u8(header.version)?;
    w.put_u8(header.message_type)?;
    w.put_u8(header.pad1)?;
    w.put_u8(header.pad2)?;
    w.put_u32(header.tag2)?;

    if let Some(text) = text {
        let bytes = text_bytes(text);
        debug!(len = bytes.len(), "encode control payload");
        if bytes.len() + 1 > w.remaining() {
            return Err(CodecError::BufferTooSmall {
                needed: CONTROL_HEADER_SIZE + bytes.len() + 1,
                available: w.capacity(),
            });
        }
        w.put_bytes(bytes)?;
        w.put_u8(0)?;
    }

    Ok(w.position())
}

/// Decode control message.
///
/// # Errors
///
/// - [`CodecError::TooShort`] jika buffer < 8 bytes.
/// - [`CodecError::PayloadOverrun`] jika payload tidak punya terminator.
pub fn decode(buf: &[u8]) -> Result<ControlFrame<'_>, CodecError> {
    if buf.len() < CONTROL_HEADER_SIZE {
        return Err(CodecError::TooShort {
            expected: CONTROL_HEADER_SIZE,
            actual: buf.len(),
        });
    }

    let mut r = ReadCursor::new(buf);
    let header = ControlHeader {
        version: r.get_u8()?,
        message_type: r.get_u8()?,
        pad1: r.get_u8()?,
        pad2: r.get_u8()?,
        tag2: r.get_u32()?,
    };
    let payload = r.get_cstr()?;

    Ok(ControlFrame {
        header,
        payload,
        consumed: r.position(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout_and_length() {
        let header = ControlHeader {
            version: 4,
            message_type: 8,
            pad1: 0xA1,
            pad2: 0xA2,
            tag2: 0x1234ABCD,
        };
        let mut buf = [0xFFu8; 32];
        let n = encode(&header, Some("<config/>"), &mut buf).unwrap();
        assert_eq!(n, 8 + 9 + 1);
        assert_eq!(&buf[..8], &[4, 8, 0xA1, 0xA2, 0x12, 0x34, 0xAB, 0xCD]);
        assert_eq!(&buf[8..18], b"<config/>\0");
        // Tidak ada padding setelah payload
        assert_eq!(buf[18], 0xFF);
    }

    #[test]
    fn test_encode_without_text() {
        let mut buf = [0u8; 8];
        assert_eq!(encode(&ControlHeader::new(7), None, &mut buf), Ok(8));
    }

    #[test]
    fn test_encode_text_too_long() {
        let mut buf = [0u8; 12];
        assert_eq!(
            encode(&ControlHeader::new(7), Some("abcd"), &mut buf),
            Err(CodecError::BufferTooSmall {
                needed: 13,
                available: 12
            })
        );
        // Pas muat
        assert_eq!(encode(&ControlHeader::new(7), Some("abc"), &mut buf), Ok(12));
    }

    #[test]
    fn test_roundtrip() {
        let header = ControlHeader {
            version: 4,
            message_type: 8,
            pad1: 0,
            pad2: 0,
            tag2: 0x1234ABCD,
        };
        let mut buf = [0u8; 64];
        let n = encode(&header, Some("<config/>"), &mut buf).unwrap();
        let frame = decode(&buf[..n]).unwrap();
        assert_eq!(frame.header, header);
        assert_eq!(frame.payload_str(), Some("<config/>"));
        assert_eq!(frame.consumed, n);
    }

    #[test]
    fn test_decode_short_buffer() {
        assert_eq!(
            decode(&[4, 0, 0]),
            Err(CodecError::TooShort {
                expected: 8,
                actual: 3
            })
        );
    }

    #[test]
    fn test_decode_no_payload() {
        let buf = [4, 0, 0, 0, 0, 0, 0, 1, 0, b'x', 0];
        let frame = decode(&buf).unwrap();
        assert_eq!(frame.header.tag2, 1);
        assert_eq!(frame.payload, None);
        assert_eq!(frame.consumed, 8);
    }

    #[test]
    fn test_decode_unterminated_payload() {
        let buf = [4, 0, 0, 0, 0, 0, 0, 1, b'a', b'b'];
        assert!(matches!(
            decode(&buf),
            Err(CodecError::PayloadOverrun { .. })
        ));
    }
}

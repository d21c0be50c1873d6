//! Twoway codec: 60-byte measurement header + optional text payload
//!
//! Encode bersifat best-effort: buffer yang lebih kecil dari header
//! tidak menyebabkan error, field timestamp yang tidak muat dilewati
//! dan sisanya di-zero-fill. Hasil degrade dilaporkan lewat
//! [`TwowayEncoded`], bukan lewat `Err`.

use tracing::warn;

use super::cursor::{text_bytes, ReadCursor, WriteCursor};
use super::error::CodecError;
use super::message::{TwowayHeader, TWOWAY_HEADER_SIZE, TWOWAY_MIN_ENCODE_SIZE};
use super::timestamp::Timeval;

/// Ringkasan hasil best-effort encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwowayEncoded {
    /// Bytes yang diisi (selalu panjang buffer: header, payload, padding)
    pub written: usize,
    /// Fixed region terpotong (t1/t2 tidak lengkap atau t3 tidak muat)
    pub header_truncated: bool,
    /// Payload terpotong; byte terakhir buffer dipaksa jadi terminator
    pub payload_truncated: bool,
}

impl TwowayEncoded {
    #[inline(always)]
    pub fn is_complete(&self) -> bool {
        !self.header_truncated && !self.payload_truncated
    }
}

/// Hasil decode (zero-copy untuk payload)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwowayFrame<'a> {
    pub header: TwowayHeader,
    /// Payload tanpa null terminator, meminjam dari input buffer
    pub payload: Option<&'a [u8]>,
    /// Bytes yang dikonsumsi: 60, atau melewati terminator payload
    pub consumed: usize,
}

impl<'a> TwowayFrame<'a> {
    /// Payload sebagai UTF-8 text, `None` jika kosong atau bukan UTF-8
    pub fn payload_str(&self) -> Option<&'a str> {
        self.payload.and_then(|p| std::str::from_utf8(p).ok())
    }
}

/// Best-effort encode twoway header ke `buf`.
///
/// Urutan:
/// 1. Field tetap sampai t0 (36 bytes) selalu ditulis.
/// 2. t1.sec, t1.usec, t2.sec, t2.usec masing-masing hanya ditulis jika
///    4 byte berikutnya masih muat; begitu ada yang tidak muat, lompat
///    ke zero-fill.
/// 3. Slot t3 dilewati tanpa ditulis (isi buffer lama tetap ada).
/// 4. Payload + terminator disalin; jika tidak muat dipotong dan byte
///    terakhir buffer di-set 0.
/// 5. Sisa buffer di-zero-fill.
///
/// # Errors
///
/// [`CodecError::BufferTooSmall`] hanya jika buffer bahkan tidak muat
/// 36 byte pertama. Payload yang kebesaran cuma di-log sebagai warning.
pub fn encode_best_effort(
    header: &TwowayHeader,
    payload: Option<&str>,
    buf: &mut [u8],
) -> Result<TwowayEncoded, CodecError> {
    let pktlen = buf.len();
    if pktlen < TWOWAY_MIN_ENCODE_SIZE {
        return Err(CodecError::BufferTooSmall {
            needed: TWOWAY_MIN_ENCODE_SIZE,
            available: pktlen,
        });
    }

    let text = payload.map(text_bytes).unwrap_or_default();
    if !text.is_empty() && TWOWAY_HEADER_SIZE + text.len() + 1 > pktlen {
        warn!(
            pktlen,
            header = TWOWAY_HEADER_SIZE,
            payload = text.len() + 1,
            "packet too short for twoway header and payload, truncating"
        );
    }

    let mut w = WriteCursor::new(buf);
    w.put_u8(header.version)?;
    w.put_u8(header.message_type)?;
    w.put_u16(header.label)?;
    w.put_u32(header.tag)?;
    w.put_u8(header.version2)?;
    w.put_u8(header.rcode)?;
    w.put_u8(header.ttl)?;
    w.skip(3);
    w.put_u8(header.tos)?;
    w.skip(3);
    w.put_u16(header.inc)?;
    w.put_u32(header.seq0)?;
    w.put_u32(header.seq1)?;
    w.put_u32(header.t0.sec)?;
    w.put_u32(header.t0.usec)?;
    debug_assert_eq!(w.position(), TWOWAY_MIN_ENCODE_SIZE);

    let mut report = TwowayEncoded {
        written: pktlen,
        header_truncated: false,
        payload_truncated: false,
    };

    let tail = [header.t1.sec, header.t1.usec, header.t2.sec, header.t2.usec];
    for v in tail {
        if !w.fits(4) {
            report.header_truncated = true;
            w.zero_fill();
            return Ok(report);
        }
        w.put_u32(v)?;
    }

    // t3: reserved, tidak pernah ditulis
    w.skip(8);
    debug_assert_eq!(w.position(), TWOWAY_HEADER_SIZE);
    if !w.fits(0) {
        // Buffer 52..59 bytes: t3 tidak muat, tidak ada tempat untuk payload
        report.header_truncated = true;
        return Ok(report);
    }

    if !text.is_empty() {
        let room = w.remaining();
        if text.len() + 1 > room {
            report.payload_truncated = true;
            if room > 0 {
                w.put_bytes(&text[..room])?;
                w.set_last(0);
            }
        } else {
            w.put_bytes(text)?;
            w.put_u8(0)?;
        }
    }

    w.zero_fill();
    Ok(report)
}

/// Decode twoway header dari received packet.
///
/// # Errors
///
/// - [`CodecError::TooShort`] jika buffer < 60 bytes.
/// - [`CodecError::PayloadOverrun`] jika ada payload tapi terminator-nya
///   tidak ditemukan di dalam buffer.
pub fn decode(buf: &[u8]) -> Result<TwowayFrame<'_>, CodecError> {
    if buf.len() < TWOWAY_HEADER_SIZE {
        return Err(CodecError::TooShort {
            expected: TWOWAY_HEADER_SIZE,
            actual: buf.len(),
        });
    }

    let mut r = ReadCursor::new(buf);
    let version = r.get_u8()?;
    let message_type = r.get_u8()?;
    let label = r.get_u16()?;
    let tag = r.get_u32()?;
    let version2 = r.get_u8()?;
    let rcode = r.get_u8()?;
    let ttl = r.get_u8()?;
    r.skip(3)?;
    let tos = r.get_u8()?;
    r.skip(3)?;
    let inc = r.get_u16()?;
    let seq0 = r.get_u32()?;
    let seq1 = r.get_u32()?;
    let t0 = read_timeval(&mut r)?;
    let t1 = read_timeval(&mut r)?;
    let t2 = read_timeval(&mut r)?;
    let t3 = read_timeval(&mut r)?;

    let payload = r.get_cstr()?;

    Ok(TwowayFrame {
        header: TwowayHeader {
            version,
            message_type,
            label,
            tag,
            version2,
            rcode,
            ttl,
            tos,
            inc,
            seq0,
            seq1,
            t0,
            t1,
            t2,
            t3,
        },
        payload,
        consumed: r.position(),
    })
}

#[inline(always)]
fn read_timeval(r: &mut ReadCursor<'_>) -> Result<Timeval, CodecError> {
    Ok(Timeval::new(r.get_u32()?, r.get_u32()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::{MessageType, PROTO_VERSION, TWOWAY_TAG};

    fn sample() -> TwowayHeader {
        TwowayHeader {
            version: PROTO_VERSION,
            message_type: MessageType::Twoway.as_u8(),
            label: 0x0102,
            tag: TWOWAY_TAG,
            version2: 3,
            rcode: 9,
            ttl: 64,
            tos: 0x10,
            inc: 2,
            seq0: 1,
            seq1: 0,
            t0: Timeval::new(1_700_000_000, 500_000),
            t1: Timeval::new(1_700_000_001, 1),
            t2: Timeval::new(1_700_000_001, 2),
            t3: Timeval::default(),
        }
    }

    #[test]
    fn test_encode_exact_layout() {
        let mut buf = [0u8; 60];
        let report = encode_best_effort(&sample(), None, &mut buf).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.written, 60);

        assert_eq!(&buf[0..4], &[4, 8, 0x01, 0x02]);
        assert_eq!(&buf[4..8], &[0xcf, 0x30, 0xe5, 0x06]);
        assert_eq!(&buf[8..14], &[3, 9, 64, 0, 0, 0]);
        assert_eq!(&buf[14..18], &[0x10, 0, 0, 0]);
        assert_eq!(&buf[18..20], &[0, 2]);
        assert_eq!(&buf[20..24], &1u32.to_be_bytes());
        assert_eq!(&buf[24..28], &0u32.to_be_bytes());
        assert_eq!(&buf[28..32], &1_700_000_000u32.to_be_bytes());
        assert_eq!(&buf[32..36], &500_000u32.to_be_bytes());
        assert_eq!(&buf[36..40], &1_700_000_001u32.to_be_bytes());
        assert_eq!(&buf[40..44], &1u32.to_be_bytes());
        assert_eq!(&buf[44..48], &1_700_000_001u32.to_be_bytes());
        assert_eq!(&buf[48..52], &2u32.to_be_bytes());
    }

    #[test]
    fn test_roundtrip_no_payload() {
        let mut buf = [0u8; 60];
        encode_best_effort(&sample(), None, &mut buf).unwrap();
        let frame = decode(&buf).unwrap();
        assert_eq!(frame.header, sample());
        assert_eq!(frame.payload, None);
        assert_eq!(frame.consumed, 60);
    }

    #[test]
    fn test_t3_passes_through() {
        let mut buf = [0xEEu8; 60];
        encode_best_effort(&sample(), None, &mut buf).unwrap();
        assert_eq!(&buf[52..60], &[0xEE; 8]);
        let frame = decode(&buf).unwrap();
        assert_eq!(frame.header.t3, Timeval::new(0xEEEE_EEEE, 0xEEEE_EEEE));
    }

    #[test]
    fn test_truncated_header_zero_fill() {
        let mut buf = [0xFFu8; 40];
        let report = encode_best_effort(&sample(), None, &mut buf).unwrap();
        assert!(report.header_truncated);
        // Hanya t1.sec yang muat
        assert_eq!(&buf[32..36], &500_000u32.to_be_bytes());
        assert_eq!(&buf[36..40], &1_700_000_001u32.to_be_bytes());

        let mut buf = [0xFFu8; 42];
        encode_best_effort(&sample(), None, &mut buf).unwrap();
        assert_eq!(&buf[36..40], &1_700_000_001u32.to_be_bytes());
        assert_eq!(&buf[40..42], &[0, 0]);
    }

    #[test]
    fn test_buffer_between_52_and_60() {
        let mut buf = [0xAAu8; 55];
        let report = encode_best_effort(&sample(), Some("x"), &mut buf).unwrap();
        assert!(report.header_truncated);
        assert_eq!(&buf[44..48], &1_700_000_001u32.to_be_bytes());
        assert_eq!(&buf[48..52], &2u32.to_be_bytes());
        // t3 area tidak disentuh
        assert_eq!(&buf[52..55], &[0xAA; 3]);
    }

    #[test]
    fn test_too_small_for_prefix() {
        let mut buf = [0u8; 35];
        assert_eq!(
            encode_best_effort(&sample(), None, &mut buf),
            Err(CodecError::BufferTooSmall {
                needed: 36,
                available: 35
            })
        );
    }

    #[test]
    fn test_payload_and_padding() {
        let mut buf = [0xFFu8; 80];
        let report = encode_best_effort(&sample(), Some("<r>1</r>"), &mut buf).unwrap();
        assert!(report.is_complete());
        assert_eq!(&buf[60..68], b"<r>1</r>");
        assert!(buf[68..].iter().all(|&b| b == 0));

        let frame = decode(&buf).unwrap();
        assert_eq!(frame.payload_str(), Some("<r>1</r>"));
        assert_eq!(frame.consumed, 69);
    }

    #[test]
    fn test_payload_truncated_keeps_terminator() {
        let mut buf = [0xFFu8; 64];
        let report = encode_best_effort(&sample(), Some("abcdefgh"), &mut buf).unwrap();
        assert!(report.payload_truncated);
        assert!(!report.header_truncated);
        assert_eq!(&buf[60..64], b"abc\0");

        let frame = decode(&buf).unwrap();
        assert_eq!(frame.payload, Some(&b"abc"[..]));
    }

    #[test]
    fn test_decode_too_short() {
        let buf = [0u8; 59];
        assert_eq!(
            decode(&buf),
            Err(CodecError::TooShort {
                expected: 60,
                actual: 59
            })
        );
    }

    #[test]
    fn test_decode_payload_overrun() {
        let mut buf = [0u8; 64];
        encode_best_effort(&sample(), None, &mut buf).unwrap();
        buf[60..64].copy_from_slice(b"abcd");
        assert_eq!(
            decode(&buf),
            Err(CodecError::PayloadOverrun {
                declared: 5,
                available: 4
            })
        );
    }

    #[test]
    fn test_decode_zero_after_header_means_no_payload() {
        let mut buf = [0u8; 70];
        encode_best_effort(&sample(), None, &mut buf).unwrap();
        buf[65] = b'z';
        let frame = decode(&buf).unwrap();
        assert_eq!(frame.payload, None);
        assert_eq!(frame.consumed, 60);
    }
}

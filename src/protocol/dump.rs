//! Hex dump untuk debugging raw packet

use std::io::{self, Write};

/// Tulis hex dump `buf` ke `out`.
///
/// Format: 2 hex digit per byte, spasi setiap 4 byte, newline setiap
/// 32 byte, selalu diakhiri newline.
pub fn msg_dump<W: Write>(out: &mut W, buf: &[u8]) -> io::Result<()> {
    for (i, b) in buf.iter().enumerate() {
        write!(out, "{:02x}", b)?;
        if (i + 1) % 32 == 0 {
            writeln!(out)?;
        } else if (i + 1) % 4 == 0 {
            write!(out, " ")?;
        }
    }
    writeln!(out)
}

/// Hex dump sebagai String (untuk tracing field)
pub fn msg_dump_string(buf: &[u8]) -> String {
    let mut out = Vec::with_capacity(buf.len() * 2 + buf.len() / 4 + 2);
    // Write ke Vec tidak pernah gagal
    let _ = msg_dump(&mut out, buf);
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_grouping() {
        assert_eq!(msg_dump_string(&[0xcf, 0x30, 0xe5, 0x06, 0x04]), "cf30e506 04\n");
        assert_eq!(msg_dump_string(&[]), "\n");
    }

    #[test]
    fn test_dump_line_break() {
        let buf = [0u8; 33];
        let s = msg_dump_string(&buf);
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "00000000 ".repeat(7) + "00000000");
        assert_eq!(lines[1], "00");
    }
}

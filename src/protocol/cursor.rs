//! Byte-order primitives dengan explicit cursor
//!
//! Semua multi-byte integer di wire adalah big-endian (network byte order).
//! Setiap operasi mengembalikan posisi cursor yang baru, tidak ada
//! pointer arithmetic di luar modul ini.

use super::error::CodecError;

/// Write cursor di atas caller-owned buffer.
///
/// Tidak ada alokasi; cursor hanya meminjam buffer selama encode.
pub struct WriteCursor<'a> {
    buffer: &'a mut [u8],
    write_pos: usize,
}

impl<'a> WriteCursor<'a> {
    #[inline(always)]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            write_pos: 0,
        }
    }

    /// Posisi cursor saat ini
    #[inline(always)]
    pub fn position(&self) -> usize {
        self.write_pos
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Sisa byte antara cursor dan akhir buffer (0 jika cursor sudah lewat)
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.write_pos)
    }

    /// True jika `n` byte berikutnya masih muat di buffer
    #[inline(always)]
    pub fn fits(&self, n: usize) -> bool {
        self.write_pos + n <= self.buffer.len()
    }

    #[inline(always)]
    fn reserve(&mut self, n: usize) -> Result<&mut [u8], CodecError> {
        if !self.fits(n) {
            return Err(CodecError::BufferTooSmall {
                needed: self.write_pos + n,
                available: self.buffer.len(),
            });
        }
        let start = self.write_pos;
        self.write_pos += n;
        Ok(&mut self.buffer[start..start + n])
    }

    #[inline(always)]
    pub fn put_u8(&mut self, v: u8) -> Result<usize, CodecError> {
        self.reserve(1)?[0] = v;
        Ok(self.write_pos)
    }

    #[inline(always)]
    pub fn put_u16(&mut self, v: u16) -> Result<usize, CodecError> {
        self.reserve(2)?.copy_from_slice(&v.to_be_bytes());
        Ok(self.write_pos)
    }

    #[inline(always)]
    pub fn put_u32(&mut self, v: u32) -> Result<usize, CodecError> {
        self.reserve(4)?.copy_from_slice(&v.to_be_bytes());
        Ok(self.write_pos)
    }

    #[inline(always)]
    pub fn put_bytes(&mut self, data: &[u8]) -> Result<usize, CodecError> {
        self.reserve(data.len())?.copy_from_slice(data);
        Ok(self.write_pos)
    }

    /// Maju `n` byte tanpa menyentuh isi buffer (padding / reserved slot).
    ///
    /// Boleh melewati akhir buffer; caller yang cek via [`fits`](Self::fits).
    #[inline(always)]
    pub fn skip(&mut self, n: usize) -> usize {
        self.write_pos += n;
        self.write_pos
    }

    /// Zero-fill dari cursor sampai akhir buffer, cursor pindah ke akhir.
    #[inline(always)]
    pub fn zero_fill(&mut self) -> usize {
        if self.write_pos < self.buffer.len() {
            self.buffer[self.write_pos..].fill(0);
        }
        self.write_pos = self.buffer.len();
        self.write_pos
    }

    /// Set byte terakhir buffer (dipakai untuk memaksa null terminator)
    #[inline(always)]
    pub fn set_last(&mut self, v: u8) {
        if let Some(last) = self.buffer.last_mut() {
            *last = v;
        }
    }
}

/// Read cursor (zero-copy) di atas received buffer.
pub struct ReadCursor<'a> {
    buffer: &'a [u8],
    read_pos: usize,
}

impl<'a> ReadCursor<'a> {
    #[inline(always)]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            read_pos: 0,
        }
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.read_pos
    }

    /// Remaining bytes
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.read_pos)
    }

    #[inline(always)]
    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.read_pos + n > self.buffer.len() {
            return Err(CodecError::TooShort {
                expected: self.read_pos + n,
                actual: self.buffer.len(),
            });
        }
        let start = self.read_pos;
        self.read_pos += n;
        Ok(&self.buffer[start..start + n])
    }

    #[inline(always)]
    pub fn get_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    #[inline(always)]
    pub fn get_u16(&mut self) -> Result<u16, CodecError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    #[inline(always)]
    pub fn get_u32(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    #[inline(always)]
    pub fn skip(&mut self, n: usize) -> Result<usize, CodecError> {
        self.take(n)?;
        Ok(self.read_pos)
    }

    /// Baca null-terminated string di posisi cursor (zero-copy).
    ///
    /// Returns `None` jika tidak ada byte tersisa atau byte pertama adalah 0.
    /// Slice yang dikembalikan tidak termasuk terminator; cursor maju
    /// melewati terminator.
    pub fn get_cstr(&mut self) -> Result<Option<&'a [u8]>, CodecError> {
        let rest = &self.buffer[self.read_pos.min(self.buffer.len())..];
        match rest.first() {
            None | Some(0) => return Ok(None),
            Some(_) => {}
        }
        match rest.iter().position(|&b| b == 0) {
            Some(len) => {
                self.read_pos += len + 1;
                Ok(Some(&rest[..len]))
            }
            // Tanpa terminator: string "melewati" akhir buffer
            None => Err(CodecError::PayloadOverrun {
                declared: rest.len() + 1,
                available: rest.len(),
            }),
        }
    }
}

/// Panjang string sampai null pertama (strlen semantics)
#[inline(always)]
pub fn text_bytes(text: &str) -> &[u8] {
    let bytes = text.as_bytes();
    match bytes.iter().position(|&b| b == 0) {
        Some(n) => &bytes[..n],
        None => bytes,
    }
}

//! Error taxonomy untuk codec twoway/control.

use thiserror::Error;

/// Errors yang bisa terjadi saat encode/decode header.
///
/// Semua error bersifat fatal untuk satu panggilan saja; codec tidak
/// pernah retry. Caller yang memutuskan packet di-drop atau tidak.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input buffer lebih pendek dari fixed region.
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum byte count untuk fixed region.
        expected: usize,
        /// Actual byte count received.
        actual: usize,
    },
    /// Payload string (termasuk terminator) melewati akhir buffer.
    #[error("payload overrun: string needs {declared} bytes, only {available} remain")]
    PayloadOverrun {
        /// Panjang string termasuk null terminator.
        declared: usize,
        /// Sisa byte setelah fixed region.
        available: usize,
    },
    /// Output buffer tidak cukup untuk header dan/atau payload.
    #[error("output buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes available in the destination.
        available: usize,
    },
}

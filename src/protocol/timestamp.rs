//! Timestamp: wall-clock timeval ↔ 64-bit fixed-point time
//!
//! Format fixed-point:
//! ┌────────────────────────────┬────────────────────────────┐
//! │ seconds (32 bit, no epoch) │ fraction (32 bit, 2^-32 s) │
//! └────────────────────────────┴────────────────────────────┘
//!
//! Seconds diambil apa adanya dari clock source (tidak ada offset 1900).
//! Hanya resolusi mikrodetik yang masuk, jadi round-trip bisa kehilangan
//! beberapa nanodetik di fraction.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

const NANOS_PER_SEC: u64 = 1_000_000_000;
const MICROS_PER_SEC: u64 = 1_000_000;
const FRACTION_MASK: u64 = 0xFFFF_FFFF;

/// Convert (seconds, microseconds) ke 64-bit fixed-point.
///
/// Microseconds diharapkan di `[0, 999_999]`; nilai di atasnya di-carry
/// ke seconds supaya fraction tidak overflow ke 32 bit atas.
#[inline(always)]
pub fn to_fixed_point(seconds: u32, microseconds: u32) -> u64 {
    let carry = microseconds as u64 / MICROS_PER_SEC;
    let micros = microseconds as u64 % MICROS_PER_SEC;
    let sec = (seconds as u64).wrapping_add(carry) & FRACTION_MASK;
    // micros * 1000 < 2^30, shift 32 masih muat di u64
    let fraction = ((micros * 1000) << 32) / NANOS_PER_SEC;
    (sec << 32) | fraction
}

/// Convert 64-bit fixed-point ke (seconds, microseconds).
#[inline(always)]
pub fn from_fixed_point(value: u64) -> (u32, u32) {
    let fraction = value & FRACTION_MASK;
    let nanos = (fraction * NANOS_PER_SEC) >> 32;
    ((value >> 32) as u32, (nanos / 1000) as u32)
}

/// Wall-clock time seperti `struct timeval`, unsigned 32-bit per field.
///
/// Ini juga representasi wire untuk t0..t3 di twoway header
/// (dua u32 big-endian: seconds lalu microseconds).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timeval {
    pub sec: u32,
    pub usec: u32,
}

impl Timeval {
    #[inline(always)]
    pub const fn new(sec: u32, usec: u32) -> Self {
        Self { sec, usec }
    }

    /// Waktu sekarang (gettimeofday)
    #[inline(always)]
    pub fn now() -> Self {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| Self::new(d.as_secs() as u32, d.subsec_micros()))
            .unwrap_or_default()
    }

    #[inline(always)]
    pub fn to_fixed_point(self) -> u64 {
        to_fixed_point(self.sec, self.usec)
    }

    #[inline(always)]
    pub fn from_fixed_point(value: u64) -> Self {
        let (sec, usec) = from_fixed_point(value);
        Self { sec, usec }
    }

    /// Total microseconds sejak epoch clock source
    #[inline(always)]
    pub fn as_micros(self) -> u64 {
        self.sec as u64 * MICROS_PER_SEC + self.usec as u64
    }

    pub fn is_zero(self) -> bool {
        self.sec == 0 && self.usec == 0
    }

    /// `self - earlier`, `None` jika `earlier` lebih baru
    pub fn checked_sub(self, earlier: Timeval) -> Option<Timeval> {
        let micros = self.as_micros().checked_sub(earlier.as_micros())?;
        Some(Self::new(
            (micros / MICROS_PER_SEC) as u32,
            (micros % MICROS_PER_SEC) as u32,
        ))
    }

    pub fn saturating_sub(self, earlier: Timeval) -> Timeval {
        self.checked_sub(earlier).unwrap_or_default()
    }

    /// Signed selisih `self - earlier`
    #[inline(always)]
    pub fn since(self, earlier: Timeval) -> TimeDelta {
        TimeDelta::from_micros(self.as_micros() as i64 - earlier.as_micros() as i64)
    }
}

impl fmt::Display for Timeval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.sec, self.usec)
    }
}

/// Selisih waktu signed dengan resolusi mikrodetik (delay, RTT).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeDelta {
    micros: i64,
}

impl TimeDelta {
    #[inline(always)]
    pub const fn from_micros(micros: i64) -> Self {
        Self { micros }
    }

    #[inline(always)]
    pub const fn as_micros(self) -> i64 {
        self.micros
    }

    pub fn as_secs_f64(self) -> f64 {
        self.micros as f64 / MICROS_PER_SEC as f64
    }

    pub fn is_negative(self) -> bool {
        self.micros < 0
    }
}

impl std::ops::Sub for TimeDelta {
    type Output = TimeDelta;

    fn sub(self, rhs: TimeDelta) -> TimeDelta {
        TimeDelta::from_micros(self.micros - rhs.micros)
    }
}

impl fmt::Display for TimeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.micros < 0 { "-" } else { "" };
        let abs = self.micros.unsigned_abs();
        write!(
            f,
            "{}{}.{:06}",
            sign,
            abs / MICROS_PER_SEC,
            abs % MICROS_PER_SEC
        )
    }
}

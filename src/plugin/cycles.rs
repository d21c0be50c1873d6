//! Cycles plugin: BogoMips-style CPU test
//!
//! Menjalankan busy loop dengan jumlah iterasi tetap dan mengukur
//! process CPU time-nya. Beberapa prosesor perlu warmup dulu sebelum
//! hasilnya stabil, jadi saat init dilakukan kalibrasi: ulangi test
//! sampai selisih dua run berturut-turut < 2%.

use std::hint::black_box;

use tracing::debug;

use super::{Plugin, PluginError, PluginVersion};

/// Default iterasi busy loop
pub const DEFAULT_LOOPS: u64 = 10_000_000;
const MAX_CALIBRATION_RUNS: usize = 25;
const STABLE_PERCENT: u64 = 2;

pub struct CyclesPlugin {
    loops: u64,
    warmup: usize,
}

impl CyclesPlugin {
    /// Plugin tanpa kalibrasi (warmup = 0)
    pub fn with_loops(loops: u64) -> Self {
        Self { loops, warmup: 0 }
    }

    /// Plugin dengan default loop count, warmup hasil kalibrasi
    pub fn calibrated() -> Self {
        let mut plugin = Self::with_loops(DEFAULT_LOOPS);
        plugin.calibrate();
        plugin
    }

    pub fn warmup(&self) -> usize {
        self.warmup
    }

    /// Hitung jumlah warmup run yang dibutuhkan
    pub fn calibrate(&mut self) -> usize {
        let warmup = warmup_runs(|| self.measure_us());
        self.warmup = warmup;
        debug!(warmup = self.warmup, "cycles calibrated");
        self.warmup
    }

    fn busy_loop(&self) {
        let mut acc = 0u64;
        for i in 0..self.loops {
            acc = black_box(acc.wrapping_add(i));
        }
        black_box(acc);
    }

    /// CPU time satu busy loop dalam microseconds
    fn measure_us(&self) -> u64 {
        let t0 = process_cpu_time_ns();
        self.busy_loop();
        let t1 = process_cpu_time_ns();
        t1.saturating_sub(t0) / 1000
    }
}

impl Plugin for CyclesPlugin {
    fn name(&self) -> &str {
        "cycles"
    }

    fn api_version(&self) -> PluginVersion {
        PluginVersion::V1
    }

    fn run(&mut self, _input: &str) -> Result<String, PluginError> {
        for _ in 0..self.warmup {
            self.busy_loop();
        }
        Ok(format!("<tcyc>{}</tcyc>", self.measure_us()))
    }
}

/// Ulangi `measure` sampai dua run berturut-turut turun < 2%.
///
/// Stabil setelah `runs` run: warmup = runs - 2. Tidak pernah stabil
/// dalam MAX_CALIBRATION_RUNS: warmup = runs - 1.
fn warmup_runs<F: FnMut() -> u64>(mut measure: F) -> usize {
    let mut prev = measure();
    let mut runs = 1;
    while runs < MAX_CALIBRATION_RUNS {
        let t = measure().max(1);
        runs += 1;
        // Run yang lebih lambat dari sebelumnya dianggap sudah stabil
        let drop_percent = 100 * prev.saturating_sub(t) / t;
        if drop_percent < STABLE_PERCENT {
            return runs - 2;
        }
        prev = t;
    }
    runs - 1
}

/// Process CPU time (CLOCK_PROCESS_CPUTIME_ID)
#[cfg(unix)]
fn process_cpu_time_ns() -> u64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: ts adalah timespec valid milik stack frame ini
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) };
    if rc != 0 {
        return 0;
    }
    ts.tv_sec as u64 * 1_000_000_000 + ts.tv_nsec as u64
}

/// Fallback: wall-clock monotonic
#[cfg(not(unix))]
fn process_cpu_time_ns() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format() {
        let mut plugin = CyclesPlugin::with_loops(1000);
        let out = plugin.run("").unwrap();
        assert!(out.starts_with("<tcyc>"));
        assert!(out.ends_with("</tcyc>"));
        let inner = &out["<tcyc>".len()..out.len() - "</tcyc>".len()];
        assert!(inner.parse::<u64>().is_ok());
    }

    #[test]
    fn test_v1_rejects_options() {
        let mut plugin = CyclesPlugin::with_loops(10);
        assert_eq!(plugin.api_version(), PluginVersion::V1);
        assert!(plugin.configure("loops", "5").is_err());
    }

    #[test]
    fn test_warmup_when_stable_immediately() {
        let mut samples = [1000u64, 995].into_iter();
        assert_eq!(warmup_runs(|| samples.next().unwrap_or(0)), 0);
    }

    #[test]
    fn test_warmup_after_two_fast_drops() {
        let mut samples = [1000u64, 800, 600, 599].into_iter();
        assert_eq!(warmup_runs(|| samples.next().unwrap_or(0)), 2);
    }

    #[test]
    fn test_warmup_never_stable() {
        // Setiap run 10% lebih cepat, kalibrasi habis tanpa break
        let mut t = 1_000_000u64;
        let warmup = warmup_runs(|| {
            t = t * 9 / 10;
            t
        });
        assert_eq!(warmup, MAX_CALIBRATION_RUNS - 1);
    }

    #[test]
    fn test_calibration_bounded() {
        let mut plugin = CyclesPlugin::with_loops(1000);
        assert!(plugin.calibrate() < MAX_CALIBRATION_RUNS);
    }
}

//! Plugin Layer: measurement producers
//!
//! Setiap plugin menghasilkan satu result string pendek (biasanya
//! fragmen XML) yang dibawa di payload twoway reply.
//!
//! Dua generasi API:
//! - V1: tidak ada option, `run` mengabaikan input
//! - V2: generic `configure(option, value)` + string input

mod cycles;
mod registry;
#[cfg(target_os = "linux")]
mod sysinfo;

pub use cycles::CyclesPlugin;
pub use registry::PluginRegistry;
#[cfg(target_os = "linux")]
pub use sysinfo::SysinfoPlugin;

use thiserror::Error;

/// Versi API plugin (capability tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PluginVersion {
    V1 = 1,
    V2 = 2,
}

impl PluginVersion {
    /// True jika plugin menerima `configure`
    #[inline(always)]
    pub fn supports_options(self) -> bool {
        self >= PluginVersion::V2
    }
}

/// Errors dari plugin
#[derive(Debug, Error)]
pub enum PluginError {
    /// Option tidak dikenal (atau plugin V1 yang tidak punya option)
    #[error("plugin {plugin}: unknown option '{option}'")]
    UnknownOption { plugin: String, option: String },
    /// Value untuk option tidak valid
    #[error("plugin {plugin}: invalid value '{value}' for option '{option}'")]
    InvalidValue {
        plugin: String,
        option: String,
        value: String,
    },
    /// Plugin tidak terdaftar
    #[error("no plugin named '{0}'")]
    NotFound(String),
    /// Measurement gagal dijalankan
    #[error("plugin {0} unavailable on this host")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Measurement producer.
///
/// `run` dipanggil sekali per probe; hasilnya langsung dipakai sebagai
/// payload, jadi harus pendek dan tanpa null byte.
pub trait Plugin: Send {
    fn name(&self) -> &str;

    fn api_version(&self) -> PluginVersion;

    /// Format output: "xml", "csv", "json"
    fn output_format(&self) -> &str {
        "xml"
    }

    /// Set option (V2). Default: semua option ditolak.
    fn configure(&mut self, option: &str, _value: &str) -> Result<(), PluginError> {
        Err(PluginError::UnknownOption {
            plugin: self.name().to_string(),
            option: option.to_string(),
        })
    }

    /// Jalankan satu measurement
    fn run(&mut self, input: &str) -> Result<String, PluginError>;

    fn shutdown(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}

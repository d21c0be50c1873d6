//! Registry plugin berdasarkan nama

use std::collections::HashMap;

use tracing::{debug, warn};

use super::{Plugin, PluginError};

/// Kumpulan plugin yang sudah di-init, di-lookup by name
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Box<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry dengan semua built-in plugin untuk host ini
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(super::CyclesPlugin::calibrated()));
        #[cfg(target_os = "linux")]
        registry.register(Box::new(super::SysinfoPlugin::new()));
        registry
    }

    /// Daftarkan plugin; plugin lama dengan nama sama di-shutdown dan diganti
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        let name = plugin.name().to_string();
        debug!(plugin = %name, version = ?plugin.api_version(), "register plugin");
        if let Some(mut old) = self.plugins.insert(name.clone(), plugin) {
            if let Err(e) = old.shutdown() {
                warn!(plugin = %name, "shutdown of replaced plugin failed: {}", e);
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Nama plugin terurut
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Plugin + 'static)> {
        self.plugins.get_mut(name).map(|p| &mut **p)
    }

    /// Set option; plugin V1 selalu menolak
    pub fn configure(&mut self, name: &str, option: &str, value: &str) -> Result<(), PluginError> {
        let plugin = self
            .plugins
            .get_mut(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;
        if !plugin.api_version().supports_options() {
            return Err(PluginError::UnknownOption {
                plugin: name.to_string(),
                option: option.to_string(),
            });
        }
        plugin.configure(option, value)
    }

    pub fn run(&mut self, name: &str, input: &str) -> Result<String, PluginError> {
        let plugin = self
            .plugins
            .get_mut(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;
        plugin.run(input)
    }

    /// Shutdown semua plugin, error di-log lalu diteruskan yang pertama
    pub fn shutdown_all(&mut self) -> Result<(), PluginError> {
        let mut first_err = None;
        for (name, mut plugin) in self.plugins.drain() {
            if let Err(e) = plugin.shutdown() {
                warn!(plugin = %name, "plugin shutdown failed: {}", e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

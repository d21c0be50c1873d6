//! Sysinfo plugin: uptime, load, memory, swap (Linux sysinfo(2))

use super::{Plugin, PluginError, PluginVersion};

const LOADS_SCALE: u64 = 65536;

#[derive(Default)]
pub struct SysinfoPlugin;

impl SysinfoPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for SysinfoPlugin {
    fn name(&self) -> &str {
        "sysinfo"
    }

    fn api_version(&self) -> PluginVersion {
        PluginVersion::V2
    }

    fn run(&mut self, _input: &str) -> Result<String, PluginError> {
        // SAFETY: zeroed sysinfo struct valid untuk diisi kernel
        let mut info: libc::sysinfo = unsafe { std::mem::zeroed() };
        if unsafe { libc::sysinfo(&mut info) } < 0 {
            return Err(PluginError::Io(std::io::Error::last_os_error()));
        }

        let unit = info.mem_unit.max(1) as u64;
        // Load average 1 menit dalam per-mil percent
        let loads = info.loads[0] as u64 * 100 * 1000 / LOADS_SCALE;
        let freeram = info.freeram as u64 * unit;
        let usedram = (info.totalram as u64).saturating_sub(info.freeram as u64) * unit;
        let freeswap = info.freeswap as u64 * unit;
        let usedswap = (info.totalswap as u64).saturating_sub(info.freeswap as u64) * unit;

        Ok(format!(
            "<uptime>{}</uptime><loads>{}.{:03}</loads><freeram>{}</freeram>\
             <usedram>{}</usedram><bufferram>{}</bufferram><procs>{}</procs>\
             <freeswap>{}</freeswap><usedswap>{}</usedswap>",
            info.uptime,
            loads / 1000,
            loads % 1000,
            freeram,
            usedram,
            info.bufferram as u64 * unit,
            info.procs,
            freeswap,
            usedswap,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sysinfo_fields() {
        let out = SysinfoPlugin::new().run("").unwrap();
        for tag in [
            "uptime", "loads", "freeram", "usedram", "bufferram", "procs", "freeswap", "usedswap",
        ] {
            assert!(out.contains(&format!("<{}>", tag)), "missing {} in {}", tag, out);
        }
    }
}

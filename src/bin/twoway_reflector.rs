//! Twoway Reflector Binary
//!
//! Menerima twoway request lewat UDP, men-stamp t1/t2, menjalankan
//! plugin (opsional) dan mengirim balik reply dengan ukuran sama.
//!
//! Usage:
//!   cargo run --release --bin twoway_reflector [OPTIONS]

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use twoway::network::socket::{host_to_addr, ifname_to_addr};
use twoway::network::{NetError, Reflector, ReflectorConfig};
use twoway::plugin::PluginRegistry;

/// Reflector configuration (CLI)
struct Config {
    bind_host: Option<String>,
    interface: Option<String>,
    port: u16,
    plugin: Option<String>,
    plugin_options: Vec<(String, String)>,
    duration_secs: Option<u64>,
    verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_host: None,
            interface: None,
            port: 7878,
            plugin: None,
            plugin_options: Vec::new(),
            duration_secs: None,
            verbose: false,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn resolve_ifaddr(config: &Config) -> Result<Option<Ipv4Addr>, NetError> {
    if let Some(name) = &config.interface {
        return ifname_to_addr(name).map(Some);
    }
    config.bind_host.as_deref().map(host_to_addr).transpose()
}

fn run_reflector(config: Config) -> Result<(), NetError> {
    let mut plugins = PluginRegistry::with_builtins();
    if let Some(name) = &config.plugin {
        for (option, value) in &config.plugin_options {
            plugins.configure(name, option, value)?;
        }
    }
    info!(plugins = ?plugins.names(), "plugins loaded");

    let reflector_config = ReflectorConfig {
        ifaddr: resolve_ifaddr(&config)?,
        port: config.port,
        plugin: config.plugin.clone(),
        ..Default::default()
    };
    let mut reflector = Reflector::bind(reflector_config, plugins)?;

    let stop = Arc::new(AtomicBool::new(false));
    if let Some(secs) = config.duration_secs {
        let stop = stop.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            stop.store(true, Ordering::Relaxed);
        });
    }

    let stats = reflector.run(&stop)?;
    println!("\n📊 Reflector Stats");
    println!("   Received:    {}", stats.received);
    println!("   Reflected:   {}", stats.reflected);
    println!("   Control:     {}", stats.control);
    println!("   Dropped:     {}", stats.dropped);
    if stats.recv_errors > 0 {
        println!("   Recv errors: {} ⚠️", stats.recv_errors);
    }
    if stats.send_errors > 0 {
        println!("   Send errors: {} ⚠️", stats.send_errors);
    }
    reflector.shutdown()?;
    Ok(())
}

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    config.bind_host = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--interface" | "-i" => {
                if i + 1 < args.len() {
                    config.interface = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    config.port = args[i + 1].parse().unwrap_or(7878);
                    i += 1;
                }
            }
            "--plugin" => {
                if i + 1 < args.len() {
                    config.plugin = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--option" | "-o" => {
                if i + 1 < args.len() {
                    if let Some((k, v)) = args[i + 1].split_once('=') {
                        config.plugin_options.push((k.to_string(), v.to_string()));
                    }
                    i += 1;
                }
            }
            "--duration" => {
                if i + 1 < args.len() {
                    config.duration_secs = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--help" | "-h" => {
                println!("Twoway Reflector - round-trip latency measurement\n");
                println!("Usage: twoway_reflector [OPTIONS]\n");
                println!("Options:");
                println!("  -b, --bind <HOST>        Local address or hostname (default: any)");
                println!("  -i, --interface <NAME>   Bind to the IPv4 address of an interface");
                println!("  -p, --port <PORT>        UDP port (default: 7878)");
                println!("      --plugin <NAME>      Plugin to run per request (cycles, sysinfo)");
                println!("  -o, --option <K=V>       Plugin option (V2 plugins only)");
                println!("      --duration <SECS>    Stop after SECS seconds");
                println!("  -v, --verbose            Debug logging");
                println!("  -h, --help               Show this help");
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}

fn main() {
    let config = parse_args();
    init_tracing(config.verbose);

    if let Err(e) = run_reflector(config) {
        error!("reflector error: {}", e);
        eprintln!("❌ Reflector error: {}", e);
        std::process::exit(1);
    }
}

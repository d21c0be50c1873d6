//! Twoway Probe Binary
//!
//! Mengirim twoway request ke reflector dan mencetak RTT per packet.
//!
//! Usage:
//!   cargo run --release --bin twoway_probe -- --target 127.0.0.1:7878 [OPTIONS]

use std::net::{SocketAddr, SocketAddrV4};
use std::time::Duration;

use tracing::error;
use tracing_subscriber::EnvFilter;
use twoway::network::socket::{host_to_addr, ifname_to_addr};
use twoway::network::{NetError, Probe, ProbeConfig, Proto};

/// Probe configuration (CLI)
struct Config {
    target: String,
    interface: Option<String>,
    proto: Proto,
    count: u32,
    size: usize,
    interval_ms: u64,
    timeout_ms: u64,
    ttl: Option<u8>,
    tos: Option<u8>,
    payload: Option<String>,
    verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: "127.0.0.1:7878".to_string(),
            interface: None,
            proto: Proto::Udp,
            count: 10,
            size: 128,
            interval_ms: 100,
            timeout_ms: 1000,
            ttl: None,
            tos: None,
            payload: None,
            verbose: false,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// "host:port" → SocketAddr, host boleh hostname
fn resolve_target(target: &str) -> Result<SocketAddr, NetError> {
    let (host, port) = target
        .rsplit_once(':')
        .ok_or_else(|| NetError::Resolve(target.to_string()))?;
    let port: u16 = port
        .parse()
        .map_err(|_| NetError::Resolve(target.to_string()))?;
    Ok(SocketAddr::V4(SocketAddrV4::new(host_to_addr(host)?, port)))
}

fn run_probe(config: Config) -> Result<(), NetError> {
    if config.proto != Proto::Udp {
        return Err(NetError::Unsupported(format!(
            "transport {} for probe, use udp",
            config.proto
        )));
    }

    let probe_config = ProbeConfig {
        target: resolve_target(&config.target)?,
        ifaddr: config.interface.as_deref().map(ifname_to_addr).transpose()?,
        count: config.count,
        size: config.size,
        interval: Duration::from_millis(config.interval_ms),
        timeout: Duration::from_millis(config.timeout_ms),
        ttl: config.ttl,
        tos: config.tos,
        payload: config.payload.clone(),
    };
    let target = probe_config.target;
    let mut probe = Probe::connect(probe_config)?;

    println!("📡 Probing {} ({} bytes, {} packets)\n", target, config.size, config.count);
    let report = probe.run()?;

    for s in &report.samples {
        println!(
            "  seq={:<5} rtt={}s fwd={}s rev={}s rcode={} {}",
            s.seq0,
            s.rtt,
            s.forward,
            s.reverse,
            s.rcode,
            s.result.as_deref().unwrap_or("")
        );
    }

    println!("\n📊 Probe Stats");
    println!("   Sent:     {}", report.sent);
    println!("   Received: {}", report.received());
    println!("   Lost:     {}", report.lost());
    if let (Some(min), Some(avg), Some(max)) =
        (report.min_rtt(), report.avg_rtt(), report.max_rtt())
    {
        println!("   RTT min/avg/max: {}/{}/{} s", min, avg, max);
    }
    Ok(())
}

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--target" | "-t" => {
                if i + 1 < args.len() {
                    config.target = args[i + 1].clone();
                    i += 1;
                }
            }
            "--interface" | "-i" => {
                if i + 1 < args.len() {
                    config.interface = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--proto" => {
                if i + 1 < args.len() {
                    match args[i + 1].parse() {
                        Ok(p) => config.proto = p,
                        Err(e) => eprintln!("⚠️ {}", e),
                    }
                    i += 1;
                }
            }
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    config.count = args[i + 1].parse().unwrap_or(10);
                    i += 1;
                }
            }
            "--size" | "-s" => {
                if i + 1 < args.len() {
                    config.size = args[i + 1].parse().unwrap_or(128);
                    i += 1;
                }
            }
            "--interval-ms" => {
                if i + 1 < args.len() {
                    config.interval_ms = args[i + 1].parse().unwrap_or(100);
                    i += 1;
                }
            }
            "--timeout-ms" => {
                if i + 1 < args.len() {
                    config.timeout_ms = args[i + 1].parse().unwrap_or(1000);
                    i += 1;
                }
            }
            "--ttl" => {
                if i + 1 < args.len() {
                    config.ttl = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--tos" => {
                if i + 1 < args.len() {
                    config.tos = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--payload" => {
                if i + 1 < args.len() {
                    config.payload = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--help" | "-h" => {
                println!("Twoway Probe - round-trip latency measurement\n");
                println!("Usage: twoway_probe [OPTIONS]\n");
                println!("Options:");
                println!("  -t, --target <HOST:PORT>  Reflector address (default: 127.0.0.1:7878)");
                println!("  -i, --interface <NAME>    Send from the IPv4 address of an interface");
                println!("      --proto <PROTO>       Transport: udp (tcp/http not supported)");
                println!("  -c, --count <N>           Number of probes (default: 10)");
                println!("  -s, --size <BYTES>        Datagram size, min 60 (default: 128)");
                println!("      --interval-ms <MS>    Gap between probes (default: 100)");
                println!("      --timeout-ms <MS>     Reply timeout (default: 1000)");
                println!("      --ttl <N>             IP TTL for probes");
                println!("      --tos <N>             IP TOS byte for probes");
                println!("      --payload <TEXT>      Text sent as plugin input");
                println!("  -v, --verbose             Debug logging");
                println!("  -h, --help                Show this help");
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

    if let Err(e) = run_probe(config) {
        error!("probe error: {}", e);
        eprintln!("❌ Probe error: {}", e);
        std::process::exit(1);
    }
}

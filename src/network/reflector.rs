//! UDP reflector dengan event-driven I/O (mio)
//!
//! Untuk setiap twoway request:
//! - t1 dicatat begitu datagram diterima
//! - seq1 diisi dari counter reflector
//! - plugin (jika ada) dijalankan, hasilnya jadi payload reply
//! - t2 dicatat tepat sebelum encode, reply dikirim dengan ukuran sama
//!
//! Control message di-log dan di-ack dengan envelope tanpa payload.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use mio::net::UdpSocket as MioUdpSocket;
use mio::{Events, Interest, Poll, Token};
use tracing::{debug, info, warn};

use super::error::NetError;
use super::socket::bind_udp;
use crate::plugin::PluginRegistry;
use crate::protocol::{
    decode_control, decode_twoway, encode_control, encode_twoway_best_effort, msg_dump_string,
    peek_message_type, ControlHeader, MessageType, Timeval,
};

const SOCKET_TOKEN: Token = Token(0);
const EVENTS_CAPACITY: usize = 64;

/// Reflector code: request OK
pub const RCODE_OK: u8 = 0;
/// Reflector code: plugin gagal, reply tanpa payload
pub const RCODE_PLUGIN_FAILED: u8 = 1;

/// Reflector configuration
#[derive(Debug, Clone)]
pub struct ReflectorConfig {
    pub ifaddr: Option<Ipv4Addr>,
    pub port: u16,
    /// Plugin yang dijalankan per request
    pub plugin: Option<String>,
    /// Ukuran maksimum datagram yang diterima
    pub max_packet: usize,
    /// Timeout poll; menentukan seberapa cepat stop flag terlihat
    pub poll_timeout: Duration,
}

impl Default for ReflectorConfig {
    fn default() -> Self {
        Self {
            ifaddr: None,
            port: 7878,
            plugin: None,
            max_packet: 64 * 1024,
            poll_timeout: Duration::from_millis(50),
        }
    }
}

/// Reflector statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReflectorStats {
    pub received: u64,
    pub reflected: u64,
    pub control: u64,
    pub dropped: u64,
    pub recv_errors: u64,
    pub send_errors: u64,
}

pub struct Reflector {
    poll: Poll,
    socket: MioUdpSocket,
    local_addr: SocketAddr,
    plugins: PluginRegistry,
    config: ReflectorConfig,
    next_seq1: u32,
    stats: ReflectorStats,
}

/// Error recv yang hanya menyangkut satu datagram (ICMP unreachable dari
/// reply sebelumnya), socket tetap bisa dipakai
fn is_transient_recv_error(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionRefused
    )
}

impl Reflector {
    /// Bind reflector socket dan register ke poller
    pub fn bind(config: ReflectorConfig, plugins: PluginRegistry) -> Result<Self, NetError> {
        if let Some(name) = &config.plugin {
            if !plugins.contains(name) {
                return Err(crate::plugin::PluginError::NotFound(name.clone()).into());
            }
        }

        let (std_socket, local_addr) = bind_udp(config.ifaddr, config.port)?;
        std_socket.set_nonblocking(true)?;
        let mut socket = MioUdpSocket::from_std(std_socket);

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut socket, SOCKET_TOKEN, Interest::READABLE)?;

        Ok(Self {
            poll,
            socket,
            local_addr,
            plugins,
            config,
            next_seq1: 0,
            stats: ReflectorStats::default(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> ReflectorStats {
        self.stats
    }

    /// Event loop sampai `stop` di-set. Returns statistik akhir.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<ReflectorStats, NetError> {
        let mut events = Events::with_capacity(EVENTS_CAPACITY);
        let mut recv_buf = vec![0u8; self.config.max_packet];
        let mut send_buf = vec![0u8; self.config.max_packet];

        info!("reflector listening on {}", self.local_addr);

        while !stop.load(Ordering::Relaxed) {
            match self.poll.poll(&mut events, Some(self.config.poll_timeout)) {
                Ok(()) => {}
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }

            for event in events.iter() {
                if event.token() != SOCKET_TOKEN {
                    continue;
                }
                // Drain semua datagram yang tersedia
                loop {
                    let (n, peer) = match self.socket.recv_from(&mut recv_buf) {
                        Ok(r) => r,
                        Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                        Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            warn!("recv failed: {}", e);
                            self.stats.recv_errors += 1;
                            if is_transient_recv_error(e.kind()) {
                                continue;
                            }
                            // Kembali ke poll, jangan spin di socket yang error
                            break;
                        }
                    };
                    let t1 = Timeval::now();
                    self.stats.received += 1;

                    let reply_len = match self.reflect(&recv_buf[..n], t1, &mut send_buf) {
                        Ok(Some(len)) => len,
                        Ok(None) => {
                            self.stats.dropped += 1;
                            continue;
                        }
                        Err(e) => {
                            warn!(
                                %peer,
                                len = n,
                                dump = %msg_dump_string(&recv_buf[..n]),
                                "dropping packet: {}",
                                e
                            );
                            self.stats.dropped += 1;
                            continue;
                        }
                    };

                    match self.socket.send_to(&send_buf[..reply_len], peer) {
                        Ok(_) => {}
                        Err(e) => {
                            warn!(%peer, "send failed: {}", e);
                            self.stats.send_errors += 1;
                        }
                    }
                }
            }
        }

        info!(stats = ?self.stats, "reflector stopped");
        Ok(self.stats)
    }

    /// Proses satu request, tulis reply ke `out`.
    ///
    /// Returns `Ok(None)` jika packet di-drop tanpa reply.
    pub fn reflect(
        &mut self,
        request: &[u8],
        t1: Timeval,
        out: &mut [u8],
    ) -> Result<Option<usize>, NetError> {
        match peek_message_type(request) {
            Some(MessageType::Twoway) => self.reflect_twoway(request, t1, out),
            Some(MessageType::Control) => self.ack_control(request, out),
            None => {
                warn!(
                    len = request.len(),
                    dump = %msg_dump_string(request),
                    "unknown message type, dropping"
                );
                Ok(None)
            }
        }
    }

    fn reflect_twoway(
        &mut self,
        request: &[u8],
        t1: Timeval,
        out: &mut [u8],
    ) -> Result<Option<usize>, NetError> {
        let frame = decode_twoway(request)?;
        if !frame.header.is_valid() {
            warn!(tag = frame.header.tag, "bad twoway tag, dropping");
            return Ok(None);
        }
        if request.len() > out.len() {
            warn!(len = request.len(), "request larger than send buffer, dropping");
            return Ok(None);
        }

        let mut reply = frame.header;
        reply.seq1 = self.next_seq1;
        self.next_seq1 = self.next_seq1.wrapping_add(1);
        reply.t1 = t1;
        reply.rcode = RCODE_OK;

        let result = match &self.config.plugin {
            Some(name) => {
                let input = frame.payload_str().unwrap_or_default();
                match self.plugins.run(name, input) {
                    Ok(text) => Some(text),
                    Err(e) => {
                        warn!(plugin = %name, "plugin failed: {}", e);
                        reply.rcode = RCODE_PLUGIN_FAILED;
                        None
                    }
                }
            }
            None => None,
        };

        let out = &mut out[..request.len()];
        out.fill(0);
        reply.t2 = Timeval::now();
        let report = encode_twoway_best_effort(&reply, result.as_deref(), out)?;
        debug!(
            seq0 = reply.seq0,
            seq1 = reply.seq1,
            complete = report.is_complete(),
            "reflect twoway"
        );
        self.stats.reflected += 1;
        Ok(Some(report.written))
    }

    fn ack_control(&mut self, request: &[u8], out: &mut [u8]) -> Result<Option<usize>, NetError> {
        let frame = decode_control(request)?;
        info!(
            tag2 = frame.header.tag2,
            payload = frame.payload_str().unwrap_or(""),
            "control message"
        );
        let ack = ControlHeader {
            pad1: 0,
            pad2: 0,
            ..frame.header
        };
        let len = encode_control(&ack, None, out)?;
        self.stats.control += 1;
        Ok(Some(len))
    }

    /// Shutdown plugin
    pub fn shutdown(mut self) -> Result<ReflectorStats, NetError> {
        self.plugins.shutdown_all()?;
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{Plugin, PluginError, PluginVersion};
    use crate::protocol::{encode_control as enc_ctl, TwowayHeader};

    struct Constant;

    impl Plugin for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn api_version(&self) -> PluginVersion {
            PluginVersion::V2
        }

        fn run(&mut self, input: &str) -> Result<String, PluginError> {
            Ok(format!("<in>{}</in>", input))
        }
    }

    fn reflector(plugin: Option<&str>) -> Reflector {
        let mut plugins = PluginRegistry::new();
        plugins.register(Box::new(Constant));
        let config = ReflectorConfig {
            ifaddr: Some(Ipv4Addr::LOCALHOST),
            port: 0,
            plugin: plugin.map(str::to_string),
            ..Default::default()
        };
        Reflector::bind(config, plugins).unwrap()
    }

    #[test]
    fn test_reflect_twoway_stamps() {
        let mut r = reflector(None);
        let mut req = [0u8; 60];
        let header = TwowayHeader::request(5, Timeval::new(100, 1));
        encode_twoway_best_effort(&header, None, &mut req).unwrap();

        let mut out = [0u8; 128];
        let t1 = Timeval::new(100, 9);
        let len = r.reflect(&req, t1, &mut out).unwrap().unwrap();
        assert_eq!(len, 60);

        let reply = decode_twoway(&out[..len]).unwrap().header;
        assert_eq!(reply.seq0, 5);
        assert_eq!(reply.seq1, 0);
        assert_eq!(reply.t0, Timeval::new(100, 1));
        assert_eq!(reply.t1, t1);
        assert!(!reply.t2.is_zero());

        let len = r.reflect(&req, t1, &mut out).unwrap().unwrap();
        assert_eq!(decode_twoway(&out[..len]).unwrap().header.seq1, 1);
        assert_eq!(r.stats().reflected, 2);
    }

    #[test]
    fn test_reflect_runs_plugin() {
        let mut r = reflector(Some("constant"));
        let mut req = [0u8; 100];
        let header = TwowayHeader::request(1, Timeval::now());
        encode_twoway_best_effort(&header, Some("ping"), &mut req).unwrap();

        let mut out = [0u8; 128];
        let len = r.reflect(&req, Timeval::now(), &mut out).unwrap().unwrap();
        assert_eq!(len, 100);
        let frame = decode_twoway(&out[..len]).unwrap();
        assert_eq!(frame.payload_str(), Some("<in>ping</in>"));
        assert_eq!(frame.header.rcode, RCODE_OK);
    }

    #[test]
    fn test_unknown_plugin_rejected() {
        let config = ReflectorConfig {
            ifaddr: Some(Ipv4Addr::LOCALHOST),
            port: 0,
            plugin: Some("missing".into()),
            ..Default::default()
        };
        assert!(matches!(
            Reflector::bind(config, PluginRegistry::new()),
            Err(NetError::Plugin(PluginError::NotFound(_)))
        ));
    }

    #[test]
    fn test_control_ack() {
        let mut r = reflector(None);
        let mut req = [0u8; 32];
        let n = enc_ctl(&ControlHeader::new(0x1234ABCD), Some("<config/>"), &mut req).unwrap();

        let mut out = [0xFFu8; 32];
        let len = r.reflect(&req[..n], Timeval::now(), &mut out).unwrap().unwrap();
        assert_eq!(len, 8);
        let ack = decode_control(&out[..len]).unwrap();
        assert_eq!(ack.header.tag2, 0x1234ABCD);
        assert_eq!(ack.payload, None);
        assert_eq!(r.stats().control, 1);
    }

    #[test]
    fn test_garbage_dropped() {
        let mut r = reflector(None);
        let mut out = [0u8; 64];
        assert!(r.reflect(&[4, 3, 0, 0], Timeval::now(), &mut out).unwrap().is_none());
        // Twoway type tapi terlalu pendek
        assert!(r.reflect(&[4, 8, 0, 0], Timeval::now(), &mut out).is_err());
    }

    /// Writer yang menampung output tracing untuk di-assert
    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unknown_packet_logged_with_dump() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mut r = reflector(None);
        let mut out = [0u8; 64];
        tracing::subscriber::with_default(subscriber, || {
            let reply = r.reflect(&[4, 3, 0xde, 0xad], Timeval::now(), &mut out);
            assert!(reply.unwrap().is_none());
        });

        let log = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(log.contains("unknown message type"), "{}", log);
        assert!(log.contains("0403dead"), "{}", log);
    }

    #[test]
    fn test_recv_error_classification() {
        assert!(is_transient_recv_error(io::ErrorKind::ConnectionReset));
        assert!(is_transient_recv_error(io::ErrorKind::ConnectionRefused));
        assert!(!is_transient_recv_error(io::ErrorKind::PermissionDenied));
        assert!(!is_transient_recv_error(io::ErrorKind::Other));
    }
}

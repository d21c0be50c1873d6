//! Probe client: kirim twoway request, hitung delay dari reply
//!
//! Synchronous UDP dengan read timeout. Tidak ada retry; request yang
//! tidak dibalas sebelum timeout dihitung sebagai lost.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::error::NetError;
use super::socket::{bind_udp, set_tos, set_ttl};
use crate::protocol::{
    decode_twoway, encode_twoway_best_effort, TimeDelta, Timeval, TwowayHeader,
    TWOWAY_HEADER_SIZE,
};

/// Probe configuration
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub target: SocketAddr,
    pub ifaddr: Option<Ipv4Addr>,
    pub count: u32,
    /// Ukuran datagram request (minimal 60)
    pub size: usize,
    pub interval: Duration,
    pub timeout: Duration,
    pub ttl: Option<u8>,
    pub tos: Option<u8>,
    /// Text yang dibawa di payload request (input plugin di reflector)
    pub payload: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            target: SocketAddr::from((Ipv4Addr::LOCALHOST, 7878)),
            ifaddr: None,
            count: 10,
            size: 128,
            interval: Duration::from_millis(100),
            timeout: Duration::from_secs(1),
            ttl: None,
            tos: None,
            payload: None,
        }
    }
}

/// Hasil satu round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSample {
    pub seq0: u32,
    pub seq1: u32,
    pub rcode: u8,
    /// (t3 - t0) - (t2 - t1): waktu di jaringan saja
    pub rtt: TimeDelta,
    /// t1 - t0 (termasuk clock offset antar host)
    pub forward: TimeDelta,
    /// t3 - t2 (termasuk clock offset antar host)
    pub reverse: TimeDelta,
    /// Payload reply (hasil plugin di reflector)
    pub result: Option<String>,
}

impl ProbeSample {
    /// Hitung delay dari header reply dan waktu terima lokal
    pub fn from_reply(reply: &TwowayHeader, t3: Timeval, result: Option<String>) -> Self {
        let total = t3.since(reply.t0);
        let processing = reply.t2.since(reply.t1);
        Self {
            seq0: reply.seq0,
            seq1: reply.seq1,
            rcode: reply.rcode,
            rtt: total - processing,
            forward: reply.t1.since(reply.t0),
            reverse: t3.since(reply.t2),
            result,
        }
    }
}

/// Ringkasan satu sesi probe
#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    pub sent: u32,
    pub samples: Vec<ProbeSample>,
}

impl ProbeReport {
    pub fn received(&self) -> u32 {
        self.samples.len() as u32
    }

    pub fn lost(&self) -> u32 {
        self.sent.saturating_sub(self.received())
    }

    pub fn min_rtt(&self) -> Option<TimeDelta> {
        self.samples.iter().map(|s| s.rtt).min()
    }

    pub fn max_rtt(&self) -> Option<TimeDelta> {
        self.samples.iter().map(|s| s.rtt).max()
    }

    pub fn avg_rtt(&self) -> Option<TimeDelta> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: i64 = self.samples.iter().map(|s| s.rtt.as_micros()).sum();
        Some(TimeDelta::from_micros(sum / self.samples.len() as i64))
    }
}

pub struct Probe {
    socket: UdpSocket,
    config: ProbeConfig,
    send_buf: Vec<u8>,
    recv_buf: Vec<u8>,
    next_seq0: u32,
}

impl Probe {
    pub fn connect(config: ProbeConfig) -> Result<Self, NetError> {
        let (socket, local) = bind_udp(config.ifaddr, 0)?;
        socket.connect(config.target)?;
        socket.set_read_timeout(Some(config.timeout))?;
        if let Some(ttl) = config.ttl {
            set_ttl(&socket, ttl)?;
        }
        if let Some(tos) = config.tos {
            set_tos(&socket, tos)?;
        }
        debug!(%local, target = %config.target, "probe socket ready");

        let size = config.size.max(TWOWAY_HEADER_SIZE);
        Ok(Self {
            socket,
            config,
            send_buf: vec![0u8; size],
            // Reply bisa lebih panjang jika reflector mengisi payload
            recv_buf: vec![0u8; 64 * 1024],
            next_seq0: 0,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        Ok(self.socket.local_addr()?)
    }

    /// Kirim satu request dan tunggu reply-nya.
    ///
    /// Returns `Ok(None)` jika timeout.
    pub fn probe_once(&mut self) -> Result<Option<ProbeSample>, NetError> {
        let seq0 = self.next_seq0;
        self.next_seq0 = self.next_seq0.wrapping_add(1);

        let mut header = TwowayHeader::request(seq0, Timeval::default());
        header.ttl = self.config.ttl.unwrap_or(0);
        header.tos = self.config.tos.unwrap_or(0);

        self.send_buf.fill(0);
        header.t0 = Timeval::now();
        encode_twoway_best_effort(&header, self.config.payload.as_deref(), &mut self.send_buf)?;
        self.socket.send(&self.send_buf)?;

        let deadline = Instant::now() + self.config.timeout;
        loop {
            // Sisa waktu sampai deadline, bukan timeout penuh per recv
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                debug!(seq0, "probe timeout");
                return Ok(None);
            }
            self.socket.set_read_timeout(Some(left))?;

            let n = match self.socket.recv(&mut self.recv_buf) {
                Ok(n) => n,
                Err(ref e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    debug!(seq0, "probe timeout");
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };
            let t3 = Timeval::now();

            match decode_twoway(&self.recv_buf[..n]) {
                Ok(frame) if frame.header.is_valid() && frame.header.seq0 == seq0 => {
                    let result = frame.payload_str().map(str::to_string);
                    return Ok(Some(ProbeSample::from_reply(&frame.header, t3, result)));
                }
                Ok(frame) => {
                    // Reply telat dari request sebelumnya
                    debug!(expected = seq0, got = frame.header.seq0, "stale reply ignored");
                }
                Err(e) => warn!(len = n, "undecodable reply: {}", e),
            }
        }
    }

    /// Jalankan `count` probe dengan jeda `interval`
    pub fn run(&mut self) -> Result<ProbeReport, NetError> {
        let mut report = ProbeReport::default();
        for i in 0..self.config.count {
            if i > 0 && !self.config.interval.is_zero() {
                thread::sleep(self.config.interval);
            }
            report.sent += 1;
            if let Some(sample) = self.probe_once()? {
                report.samples.push(sample);
            }
        }
        Ok(report)
    }
}

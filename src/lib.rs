//! Twoway - Round-trip latency measurement agent
//!
//! Arsitektur:
//! - Protocol: bit-exact twoway (60 bytes) dan control (8 bytes) codec
//! - Timestamp: timeval ↔ 64-bit fixed-point
//! - Plugin: measurement producer yang hasilnya dibawa di payload
//! - Network: UDP reflector (mio) dan probe client

pub mod network;
pub mod plugin;
pub mod protocol;

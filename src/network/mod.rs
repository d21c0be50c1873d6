//! Network Layer: transport untuk twoway/control message
//!
//! - Reflector: mio event loop di atas UDP
//! - Probe: synchronous sender dengan read timeout
//! - Socket helpers: bind, resolve, TTL/TOS
//!
//! Session protocol (jumlah round, scheduling, retry) bukan urusan layer ini.

mod error;
mod probe;
mod proto;
mod reflector;
pub mod socket;

pub use error::NetError;
pub use probe::{Probe, ProbeConfig, ProbeReport, ProbeSample};
pub use proto::{Proto, UnknownProto};
pub use reflector::{
    Reflector, ReflectorConfig, ReflectorStats, RCODE_OK, RCODE_PLUGIN_FAILED,
};

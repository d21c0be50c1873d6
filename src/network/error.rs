use thiserror::Error;

use crate::plugin::PluginError;
use crate::protocol::CodecError;

/// Errors dari network layer (socket, reflector, probe)
#[derive(Debug, Error)]
pub enum NetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("cannot resolve host '{0}'")]
    Resolve(String),
    #[error("no IPv4 address on interface '{0}'")]
    NoSuchInterface(String),
    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),
    #[error("unsupported: {0}")]
    Unsupported(String),
}

use std::net::SocketAddr;
use thiserror::Error;

/// Errors raised while starting or stopping an emulated reader service.
#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EmulatorError>;

use crate::packet::errors::HeaderError;
use crate::tcp::state::TcpState;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TcpError {
    /// The transport refused or failed to put the packet on the wire. The
    /// attempted transition does not take effect.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    #[error("header error: {0}")]
    Header(#[from] HeaderError),

    /// Caller contract violation: `send`/`close` outside ESTABLISHED.
    #[error("{op} requires an ESTABLISHED connection, state is {state}")]
    InvalidState { op: &'static str, state: TcpState },
}

use std::fmt;

/// The states a client-side connection moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpState {
    Closed,      // Not yet connected, or torn down
    SynSent,     // SYN sent, waiting for SYN-ACK
    Established, // Handshake done, exchanging data
    FinWait,     // FIN sent, waiting for the peer's FIN-ACK
}

impl TcpState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TcpState::Closed => "CLOSED",
            TcpState::SynSent => "SYN-SENT",
            TcpState::Established => "ESTABLISHED",
            TcpState::FinWait => "FIN-WAIT",
        }
    }
}

impl fmt::Display for TcpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Unit tests --

pub mod mock;
pub mod raw;

pub use mock::MockTransport;
pub use raw::RawTransport;

use std::io;

/// The wire side of a connection. A `TcpConn` hands every fully built packet
/// to `send`; inbound packets travel the other way through the surrounding
/// driver, which parses them and calls `TcpConn::deliver` one at a time.
pub trait Transport {
    /// Transmit one fully formed packet. No internal retry; failure is
    /// surfaced to whichever connection operation triggered the send.
    fn send(&mut self, packet: &[u8]) -> io::Result<()>;
}

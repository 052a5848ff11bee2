use crate::packet::errors::HeaderError;
use crate::tcp::tcp_segment::TcpSegment;
use crate::transport::Transport;
use std::io;
use std::sync::{Arc, Mutex};

/// In-memory transport double: records every packet a connection sends
/// instead of putting it on a wire. Handles are cheap clones sharing the
/// same recording, so a test can keep one while the connection owns another.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_send: Arc<Mutex<bool>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes of every packet sent so far, in order.
    pub fn sent_packets(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    /// Parsed form of every packet sent so far, in order.
    pub fn sent_segments(&self) -> Result<Vec<TcpSegment>, HeaderError> {
        self.sent_packets()
            .iter()
            .map(|packet| TcpSegment::parse(packet))
            .collect()
    }

    /// Make subsequent `send` calls fail, to exercise transport-failure paths.
    pub fn set_fail_send(&self, fail: bool) {
        *self.fail_send.lock().unwrap() = fail;
    }
}

impl Transport for MockTransport {
    fn send(&mut self, packet: &[u8]) -> io::Result<()> {
        if *self.fail_send.lock().unwrap() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock send failure"));
        }
        self.sent.lock().unwrap().push(packet.to_vec());
        Ok(())
    }
}

// -- Unit tests --

use crate::ip::ip_flags::IpFlags;
use crate::ip::ip_header::{IpHeader, IP_HEADER_LEN};
use crate::packet;
use crate::packet::errors::HeaderError;
use crate::tcp::tcp_flags::TcpFlags;
use crate::tcp::tcp_header::{TcpHeader, TCP_HEADER_LEN};
use crate::tcp::wrap32::Wrap32;
use std::net::SocketAddrV4;

/// One IP+TCP segment: the unit handed to and received from the transport.
/// Doubles as a builder for outbound packets and the parsed form of inbound
/// ones.
#[derive(Debug, Clone, PartialEq)]
pub struct TcpSegment {
    pub iph: IpHeader,
    pub tcph: TcpHeader,
}

impl TcpSegment {
    /// A segment template from `src` to `dst` with the fields this endpoint
    /// never varies already filled in.
    pub fn new(src: SocketAddrV4, dst: SocketAddrV4) -> Self {
        let iph = IpHeader {
            version: 4,
            ihl: 5,
            tos: 0,
            total_len: 0, // filled by build()
            id: 0,
            flags: IpFlags::DF,
            frag_offset: 0,
            ttl: 64,
            protocol: 6,
            checksum: 0,
            src_ip: *src.ip(),
            dst_ip: *dst.ip(),
        };

        let tcph = TcpHeader {
            src_port: src.port(),
            dst_port: dst.port(),
            seq_no: Wrap32::new(0),
            ack_no: Wrap32::new(0),
            data_offset: 5,
            reserved: 0,
            flags: TcpFlags::empty(),
            window: 65500,
            checksum: 0,
            urgent: 0,
            options: vec![],
            payload: vec![],
        };

        TcpSegment { iph, tcph }
    }

    pub fn seq_no(&mut self, seq_no: Wrap32) -> &mut Self {
        self.tcph.seq_no = seq_no;
        self
    }

    pub fn ack_no(&mut self, ack_no: Wrap32) -> &mut Self {
        self.tcph.ack_no = ack_no;
        self
    }

    pub fn tcp_flags(&mut self, flags: TcpFlags) -> &mut Self {
        self.tcph.flags = flags;
        self
    }

    pub fn window_size(&mut self, window: u16) -> &mut Self {
        self.tcph.window = window;
        self
    }

    pub fn ttl(&mut self, ttl: u8) -> &mut Self {
        self.iph.ttl = ttl;
        self
    }

    pub fn payload(&mut self, payload: &[u8]) -> &mut Self {
        self.tcph.payload = payload.to_vec();
        self
    }

    /// Serialize into wire bytes, fixing up lengths and both checksums.
    pub fn build(&mut self) -> Result<Vec<u8>, HeaderError> {
        self.tcph.data_offset = ((TCP_HEADER_LEN + self.tcph.options.len()) / 4) as u8;
        let tcp_len = self.tcph.data_offset as usize * 4 + self.tcph.payload.len();
        self.iph.total_len = (IP_HEADER_LEN + tcp_len) as u16;
        packet::wrap(&self.iph, &self.tcph)
    }

    /// Parse one packet off the wire, validating both checksums.
    pub fn parse(packet: &[u8]) -> Result<Self, HeaderError> {
        let (iph, tcph) = packet::unwrap(packet)?;
        Ok(TcpSegment { iph, tcph })
    }

    pub fn flags(&self) -> TcpFlags {
        self.tcph.flags
    }

    pub fn seq(&self) -> Wrap32 {
        self.tcph.seq_no
    }

    pub fn ack(&self) -> Wrap32 {
        self.tcph.ack_no
    }

    pub fn data(&self) -> &[u8] {
        &self.tcph.payload
    }
}

// -- Unit tests --

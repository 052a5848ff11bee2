use crate::tcp::errors::TcpError;
use crate::tcp::state::TcpState;
use crate::tcp::tcp_flags::TcpFlags;
use crate::tcp::tcp_segment::TcpSegment;
use crate::tcp::wrap32::Wrap32;
use crate::transport::Transport;
use network_interface::{Addr, NetworkInterface, NetworkInterfaceConfig};
use rand::Rng;
use std::io::{Error, ErrorKind};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs};

/// One client-side TCP connection. Construction sends the SYN; after that
/// the connection is driven by `send`/`close` calls from the application and
/// by `deliver` calls from whatever reads the transport.
///
/// Sequence bookkeeping: `seq_no` is the next number this endpoint will use,
/// `ack_no` the next number expected from the peer. An inbound segment whose
/// sequence number does not exactly match the current expectation is dropped
/// silently; there is no reassembly and no retransmission.
#[derive(Debug)]
pub struct TcpConn<T: Transport> {
    transport: T,
    local_addr: SocketAddrV4,
    remote_addr: SocketAddrV4,
    state: TcpState,
    seq_no: Wrap32,
    ack_no: Wrap32, // meaningless until the handshake completes
}

impl<T: Transport> TcpConn<T> {
    /// Open a connection to `hostname:port` with a random ISN and ephemeral
    /// port. Returns once the SYN is on the wire (state SYN-SENT); the
    /// handshake completes when the SYN-ACK is delivered.
    pub fn connect(transport: T, hostname: &str, port: u16) -> Result<Self, TcpError> {
        let mut rng = rand::thread_rng();
        let local_ip = Self::lookup_local_ip()?;
        let local_addr = SocketAddrV4::new(local_ip, rng.gen_range(49152..65535));
        let remote_addr = Self::resolve_hostname(hostname, port)?;
        Self::connect_with(transport, local_addr, remote_addr, rng.gen())
    }

    /// Open a connection with an explicit local identity and initial
    /// sequence number. This is the deterministic entry point harnesses use
    /// to correlate against captured traffic.
    pub fn connect_with(
        transport: T,
        local_addr: SocketAddrV4,
        remote_addr: SocketAddrV4,
        isn: u32,
    ) -> Result<Self, TcpError> {
        let mut conn = Self {
            transport,
            local_addr,
            remote_addr,
            state: TcpState::Closed,
            seq_no: Wrap32::new(isn),
            ack_no: Wrap32::new(0),
        };

        let syn = conn.build_segment(conn.seq_no, Wrap32::new(0), TcpFlags::SYN, &[])?;
        conn.transport.send(&syn)?;
        conn.state = TcpState::SynSent;
        Ok(conn)
    }

    /// Send `payload` verbatim in one PSH+ACK segment. Requires ESTABLISHED.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), TcpError> {
        if self.state != TcpState::Established {
            return Err(TcpError::InvalidState {
                op: "send",
                state: self.state,
            });
        }

        let packet = self.build_segment(
            self.seq_no,
            self.ack_no,
            TcpFlags::PSH | TcpFlags::ACK,
            payload,
        )?;
        self.transport.send(&packet)?;
        self.seq_no = self.seq_no + payload.len() as u32;
        Ok(())
    }

    /// Begin an orderly teardown with one FIN+ACK segment. Requires
    /// ESTABLISHED; the connection then waits in FIN-WAIT for the peer's FIN.
    pub fn close(&mut self) -> Result<(), TcpError> {
        if self.state != TcpState::Established {
            return Err(TcpError::InvalidState {
                op: "close",
                state: self.state,
            });
        }

        let fin = self.build_segment(
            self.seq_no,
            self.ack_no,
            TcpFlags::FIN | TcpFlags::ACK,
            &[],
        )?;
        self.transport.send(&fin)?;
        self.seq_no = self.seq_no + 1; // the FIN consumes one sequence number
        self.state = TcpState::FinWait;
        Ok(())
    }

    /// Consume one inbound segment. The transport must call this exactly
    /// once per segment, in arrival order, never concurrently. Segments that
    /// do not match the current state's expectation are dropped without
    /// effect; only reply-send failures surface as errors, and a failed send
    /// leaves the attempted transition untaken.
    pub fn deliver(&mut self, segment: &TcpSegment) -> Result<(), TcpError> {
        match self.state {
            TcpState::SynSent => self.handle_syn_ack(segment),
            TcpState::Established => self.handle_data(segment),
            TcpState::FinWait => self.handle_fin_ack(segment),
            TcpState::Closed => Ok(()),
        }
    }

    pub fn state(&self) -> TcpState {
        self.state
    }

    pub fn seq_no(&self) -> Wrap32 {
        self.seq_no
    }

    pub fn ack_no(&self) -> Wrap32 {
        self.ack_no
    }

    pub fn local_addr(&self) -> SocketAddrV4 {
        self.local_addr
    }

    pub fn remote_addr(&self) -> SocketAddrV4 {
        self.remote_addr
    }

    /// SYN-SENT: accept only a SYN-ACK acknowledging our SYN, adopt the
    /// peer's counters, and answer with a pure ACK.
    fn handle_syn_ack(&mut self, segment: &TcpSegment) -> Result<(), TcpError> {
        let is_syn_ack = segment.flags().contains(TcpFlags::SYN | TcpFlags::ACK);
        if !is_syn_ack || segment.ack() != self.seq_no + 1 {
            return Ok(());
        }

        let seq_no = segment.ack();
        let ack_no = segment.seq() + 1;
        let ack = self.build_segment(seq_no, ack_no, TcpFlags::ACK, &[])?;
        self.transport.send(&ack)?;

        self.seq_no = seq_no;
        self.ack_no = ack_no;
        self.state = TcpState::Established;
        Ok(())
    }

    /// ESTABLISHED: count in-order payload bytes; everything else (including
    /// a retransmitted SYN-ACK) falls outside the expectation and is dropped.
    fn handle_data(&mut self, segment: &TcpSegment) -> Result<(), TcpError> {
        let len = segment.data().len();
        if len > 0 && segment.seq() == self.ack_no {
            self.ack_no = self.ack_no + len as u32;
        }
        Ok(())
    }

    /// FIN-WAIT: accept the peer's FIN-ACK for our FIN and answer the final
    /// ACK, ending the connection.
    fn handle_fin_ack(&mut self, segment: &TcpSegment) -> Result<(), TcpError> {
        let is_fin_ack = segment.flags().contains(TcpFlags::FIN | TcpFlags::ACK);
        if !is_fin_ack || segment.seq() != self.ack_no || segment.ack() != self.seq_no {
            return Ok(());
        }

        let ack_no = segment.seq() + 1; // step past the peer's FIN
        let ack = self.build_segment(self.seq_no, ack_no, TcpFlags::ACK, &[])?;
        self.transport.send(&ack)?;

        self.ack_no = ack_no;
        self.state = TcpState::Closed;
        Ok(())
    }

    fn build_segment(
        &self,
        seq_no: Wrap32,
        ack_no: Wrap32,
        flags: TcpFlags,
        payload: &[u8],
    ) -> Result<Vec<u8>, TcpError> {
        let packet = TcpSegment::new(self.local_addr, self.remote_addr)
            .seq_no(seq_no)
            .ack_no(ack_no)
            .tcp_flags(flags)
            .payload(payload)
            .build()?;
        Ok(packet)
    }

    /// Resolve a hostname to its first IPv4 address.
    fn resolve_hostname(hostname: &str, port: u16) -> Result<SocketAddrV4, TcpError> {
        let addrs = (hostname, port).to_socket_addrs().map_err(TcpError::Io)?;
        for addr in addrs {
            if let SocketAddr::V4(v4_addr) = addr {
                return Ok(v4_addr);
            }
        }

        Err(TcpError::Io(Error::new(
            ErrorKind::AddrNotAvailable,
            "IPv4 address not found",
        )))
    }

    /// First non-loopback IPv4 address among the local interfaces.
    fn lookup_local_ip() -> Result<Ipv4Addr, TcpError> {
        let interfaces = NetworkInterface::show()
            .map_err(|e| TcpError::Io(Error::new(ErrorKind::Other, e.to_string())))?;

        for interface in interfaces {
            for addr in interface.addr {
                if let Addr::V4(v4_addr) = addr {
                    if !v4_addr.ip.is_loopback() {
                        return Ok(v4_addr.ip);
                    }
                }
            }
        }

        Err(TcpError::Io(Error::new(
            ErrorKind::NotFound,
            "no local IPv4 address found",
        )))
    }
}

// -- Unit tests --

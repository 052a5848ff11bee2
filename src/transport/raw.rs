use crate::transport::Transport;
use nix::errno::Errno;
use nix::sys::socket::sockopt::{RcvBuf, ReceiveTimeout, ReuseAddr};
use nix::sys::socket::{
    recv, sendto, setsockopt, socket, AddressFamily, MsgFlags, SockFlag, SockProtocol, SockType,
    SockaddrIn,
};
use nix::sys::time::{TimeVal, TimeValLike};
use std::io;
use std::net::SocketAddrV4;
use std::os::fd::{AsRawFd, OwnedFd};
use std::time::Duration;

const RECV_BUF_SIZE: usize = 1024 * 1024 * 2;
const MTU: usize = 1500;

/// Raw-socket transport: sends hand-built IP packets (`IPPROTO_RAW`, so the
/// kernel leaves our IP header alone) and receives every inbound TCP packet
/// on a second raw socket. Requires CAP_NET_RAW.
#[derive(Debug)]
pub struct RawTransport {
    send_fd: OwnedFd,
    recv_fd: OwnedFd,
    remote: SockaddrIn,
}

impl RawTransport {
    pub fn new(remote: SocketAddrV4) -> io::Result<Self> {
        let send_fd = socket(
            AddressFamily::Inet,
            SockType::Raw,
            SockFlag::empty(),
            SockProtocol::Raw,
        )?;
        setsockopt(&send_fd, ReuseAddr, &true)?;

        let recv_fd = socket(
            AddressFamily::Inet,
            SockType::Raw,
            SockFlag::empty(),
            SockProtocol::Tcp,
        )?;
        setsockopt(&recv_fd, RcvBuf, &RECV_BUF_SIZE)?;

        Ok(Self {
            send_fd,
            recv_fd,
            remote: SockaddrIn::from(remote),
        })
    }

    pub fn set_recv_timeout(&self, duration: Duration) -> io::Result<()> {
        let timeout = TimeVal::seconds(duration.as_secs() as i64)
            + TimeVal::microseconds(duration.subsec_micros() as i64);
        setsockopt(&self.recv_fd, ReceiveTimeout, &timeout)?;
        Ok(())
    }

    /// Read one raw packet off the wire. The kernel delivers every TCP
    /// packet on this socket; callers filter and parse before delivery.
    pub fn recv_packet(&self) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; MTU];
        loop {
            match recv(self.recv_fd.as_raw_fd(), &mut buf, MsgFlags::empty()) {
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(buf);
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::EAGAIN) => {
                    return Err(io::Error::new(io::ErrorKind::TimedOut, "recv timeout"))
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Transport for RawTransport {
    fn send(&mut self, packet: &[u8]) -> io::Result<()> {
        loop {
            match sendto(
                self.send_fd.as_raw_fd(),
                packet,
                &self.remote,
                MsgFlags::empty(),
            ) {
                Ok(n) if n == packet.len() => return Ok(()),
                // Datagram sends are all-or-nothing; a short count means the
                // packet did not go out intact, and resending the tail would
                // only emit a garbage IP packet
                Ok(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "short raw send",
                    ))
                }
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

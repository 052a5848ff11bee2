//! A user-space, client-side TCP endpoint over raw IPv4 sockets.
//!
//! The kernel never sees the connection state: this crate builds and parses
//! every IP/TCP segment itself and drives the handshake, data transfer, and
//! teardown from [`tcp::conn::TcpConn`]. Intended for probing and emulating
//! TCP behavior precisely, not as a general sockets API.

pub mod ip;
pub mod packet;
pub mod tcp;
pub mod transport;

pub mod errors;

use crate::ip::ip_header::{IpHeader, IP_HEADER_LEN};
use crate::tcp::tcp_header::TcpHeader;
use errors::HeaderError;

/// Compose an IP header and a TCP header (with its payload) into one packet.
pub fn wrap(iph: &IpHeader, tcph: &TcpHeader) -> Result<Vec<u8>, HeaderError> {
    let mut packet = vec![0u8; iph.total_len as usize];
    iph.serialize(&mut packet[..IP_HEADER_LEN])?;
    tcph.serialize(&mut packet[IP_HEADER_LEN..], iph)?;
    Ok(packet)
}

/// Split a packet into its IP and TCP headers, validating both checksums.
pub fn unwrap(packet: &[u8]) -> Result<(IpHeader, TcpHeader), HeaderError> {
    if packet.len() < IP_HEADER_LEN {
        return Err(HeaderError::BufferTooSmall {
            expected: IP_HEADER_LEN,
            found: packet.len(),
        });
    }

    let iph = IpHeader::parse(&packet[..IP_HEADER_LEN])?;
    let tcph = TcpHeader::parse(&packet[IP_HEADER_LEN..], &iph)?;
    Ok((iph, tcph))
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::ip_flags::IpFlags;
    use crate::tcp::tcp_flags::TcpFlags;
    use crate::tcp::wrap32::Wrap32;
    use std::net::Ipv4Addr;

    fn sample_packet() -> Vec<u8> {
        let payload = b"hello raw tcp".to_vec();
        let tcph = TcpHeader {
            src_port: 54321,
            dst_port: 80,
            seq_no: Wrap32::new(1000),
            ack_no: Wrap32::new(88001),
            data_offset: 5,
            reserved: 0,
            flags: TcpFlags::PSH | TcpFlags::ACK,
            window: 65500,
            checksum: 0,
            urgent: 0,
            options: vec![],
            payload,
        };
        let iph = IpHeader {
            version: 4,
            ihl: 5,
            tos: 0,
            total_len: (IP_HEADER_LEN + 20 + tcph.payload.len()) as u16,
            id: 0,
            flags: IpFlags::DF,
            frag_offset: 0,
            ttl: 64,
            protocol: 6,
            checksum: 0,
            src_ip: Ipv4Addr::new(192, 168, 0, 2),
            dst_ip: Ipv4Addr::new(192, 168, 0, 1),
        };
        wrap(&iph, &tcph).unwrap()
    }

    #[test]
    fn test_wrap_unwrap_round_trip() {
        let packet = sample_packet();
        let (iph, tcph) = unwrap(&packet).unwrap();

        assert_eq!(iph.total_len as usize, packet.len());
        assert_eq!(iph.src_ip, Ipv4Addr::new(192, 168, 0, 2));
        assert_eq!(tcph.src_port, 54321);
        assert_eq!(tcph.dst_port, 80);
        assert_eq!(tcph.seq_no, Wrap32::new(1000));
        assert_eq!(tcph.ack_no, Wrap32::new(88001));
        assert_eq!(tcph.flags, TcpFlags::PSH | TcpFlags::ACK);
        assert_eq!(tcph.payload, b"hello raw tcp");
    }

    #[test]
    fn test_unwrap_corrupt_ip_header() {
        let mut packet = sample_packet();
        packet[15] ^= 0xff; // corrupt a source address byte
        assert_eq!(
            unwrap(&packet).unwrap_err(),
            HeaderError::BadChecksum("IP".to_string())
        );
    }

    #[test]
    fn test_unwrap_corrupt_tcp_payload() {
        let mut packet = sample_packet();
        let last = packet.len() - 1;
        packet[last] ^= 0xff;
        assert_eq!(
            unwrap(&packet).unwrap_err(),
            HeaderError::BadChecksum("TCP".to_string())
        );
    }

    #[test]
    fn test_unwrap_truncated() {
        let packet = sample_packet();
        assert!(unwrap(&packet[..10]).is_err());
    }
}

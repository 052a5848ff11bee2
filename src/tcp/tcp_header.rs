use crate::ip::ip_header::IpHeader;
use crate::packet::errors::HeaderError;
use crate::tcp::tcp_flags::TcpFlags;
use crate::tcp::wrap32::Wrap32;

pub const TCP_HEADER_LEN: usize = 20;

/// A TCP header with its payload appended for ease of use.
#[derive(Debug, Clone, PartialEq)]
pub struct TcpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq_no: Wrap32,
    pub ack_no: Wrap32,
    pub data_offset: u8, // Upper 4 bits of byte 12
    pub reserved: u8,    // Lower 4 bits of byte 12
    pub flags: TcpFlags,
    pub window: u16,
    pub checksum: u16,
    pub urgent: u16,
    pub options: Vec<u8>,
    pub payload: Vec<u8>,
}

impl TcpHeader {
    /// Write the header, options, and payload into `buf`. The checksum is
    /// computed over `iph`'s pseudo-header and filled in place.
    pub fn serialize(&self, buf: &mut [u8], iph: &IpHeader) -> Result<usize, HeaderError> {
        let header_len = self.data_offset as usize * 4;
        let total_len = header_len + self.payload.len();

        if buf.len() < total_len {
            return Err(HeaderError::BufferTooSmall {
                expected: total_len,
                found: buf.len(),
            });
        }

        buf[0..2].copy_from_slice(&self.src_port.to_be_bytes());
        buf[2..4].copy_from_slice(&self.dst_port.to_be_bytes());
        buf[4..8].copy_from_slice(&self.seq_no.value().to_be_bytes());
        buf[8..12].copy_from_slice(&self.ack_no.value().to_be_bytes());
        buf[12] = (self.data_offset << 4) | self.reserved;
        buf[13] = self.flags.bits();
        buf[14..16].copy_from_slice(&self.window.to_be_bytes());
        buf[16..18].fill(0); // checksum starts zeroed
        buf[18..20].copy_from_slice(&self.urgent.to_be_bytes());
        buf[TCP_HEADER_LEN..header_len].copy_from_slice(&self.options);
        buf[header_len..total_len].copy_from_slice(&self.payload);

        let checksum = Self::checksum(&buf[..total_len], iph);
        buf[16..18].copy_from_slice(&checksum.to_be_bytes());

        Ok(total_len)
    }

    /// Parse and checksum-validate a TCP segment (header, options, payload).
    pub fn parse(buf: &[u8], iph: &IpHeader) -> Result<Self, HeaderError> {
        if buf.len() < TCP_HEADER_LEN {
            return Err(HeaderError::BufferTooSmall {
                expected: TCP_HEADER_LEN,
                found: buf.len(),
            });
        }

        let data_offset = buf[12] >> 4;
        let header_len = data_offset as usize * 4;
        if header_len < TCP_HEADER_LEN {
            // A data offset below 5 cannot describe a real header; reject it
            // rather than slice past the options bound
            return Err(HeaderError::BufferTooSmall {
                expected: TCP_HEADER_LEN,
                found: header_len,
            });
        }
        if buf.len() < header_len {
            return Err(HeaderError::BufferTooSmall {
                expected: header_len,
                found: buf.len(),
            });
        }

        if Self::checksum(buf, iph) != 0 {
            return Err(HeaderError::BadChecksum("TCP".to_string()));
        }

        Ok(TcpHeader {
            src_port: u16::from_be_bytes([buf[0], buf[1]]),
            dst_port: u16::from_be_bytes([buf[2], buf[3]]),
            seq_no: Wrap32::new(u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]])),
            ack_no: Wrap32::new(u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]])),
            data_offset,
            reserved: buf[12] & 0x0f,
            flags: TcpFlags::from_bits_truncate(buf[13]),
            window: u16::from_be_bytes([buf[14], buf[15]]),
            checksum: u16::from_be_bytes([buf[16], buf[17]]),
            urgent: u16::from_be_bytes([buf[18], buf[19]]),
            options: buf[TCP_HEADER_LEN..header_len].to_vec(),
            payload: buf[header_len..].to_vec(),
        })
    }

    /// Internet checksum over the IPv4 pseudo-header plus the segment bytes.
    /// Odd-length segments are padded with a zero byte for summing.
    pub fn checksum(data: &[u8], iph: &IpHeader) -> u16 {
        let src = iph.src_ip.octets();
        let dst = iph.dst_ip.octets();

        let mut sum: u32 = 0;
        sum += u16::from_be_bytes([src[0], src[1]]) as u32;
        sum += u16::from_be_bytes([src[2], src[3]]) as u32;
        sum += u16::from_be_bytes([dst[0], dst[1]]) as u32;
        sum += u16::from_be_bytes([dst[2], dst[3]]) as u32;
        sum += iph.protocol as u32;
        sum += data.len() as u32;

        for chunk in data.chunks(2) {
            sum += match chunk {
                [hi, lo] => u16::from_be_bytes([*hi, *lo]) as u32,
                [hi] => (*hi as u32) << 8,
                _ => 0,
            };
        }

        while sum >> 16 != 0 {
            sum = (sum & 0xffff) + (sum >> 16);
        }
        !sum as u16
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::ip_flags::IpFlags;
    use std::net::Ipv4Addr;

    // Bare SYN, 192.168.0.2:54321 -> 192.168.0.1:80, seq 1000, checksum 0x5625
    fn syn_hex() -> &'static str {
        "d4310050000003e8000000005002ffff56250000"
    }

    fn pseudo_iph() -> IpHeader {
        IpHeader {
            version: 4,
            ihl: 5,
            tos: 0,
            total_len: 40,
            id: 0,
            flags: IpFlags::DF,
            frag_offset: 0,
            ttl: 64,
            protocol: 6,
            checksum: 0,
            src_ip: Ipv4Addr::new(192, 168, 0, 2),
            dst_ip: Ipv4Addr::new(192, 168, 0, 1),
        }
    }

    fn syn_header() -> TcpHeader {
        TcpHeader {
            src_port: 54321,
            dst_port: 80,
            seq_no: Wrap32::new(1000),
            ack_no: Wrap32::new(0),
            data_offset: 5,
            reserved: 0,
            flags: TcpFlags::SYN,
            window: 65535,
            checksum: 0x5625,
            urgent: 0,
            options: vec![],
            payload: vec![],
        }
    }

    #[test]
    fn test_serialize_matches_fixture() {
        let iph = pseudo_iph();
        let mut buf = [0u8; 64];
        let n = syn_header().serialize(&mut buf, &iph).unwrap();

        assert_eq!(n, TCP_HEADER_LEN);
        assert_eq!(TcpHeader::checksum(&buf[..n], &iph), 0);
        assert_eq!(buf[..n].to_vec(), hex::decode(syn_hex()).unwrap());
    }

    #[test]
    fn test_parse_fixture() {
        let bytes = hex::decode(syn_hex()).unwrap();
        let tcph = TcpHeader::parse(&bytes, &pseudo_iph()).unwrap();
        assert_eq!(tcph, syn_header());
    }

    #[test]
    fn test_parse_rejects_corruption() {
        let mut bytes = hex::decode(syn_hex()).unwrap();
        bytes[4] ^= 0x01; // flip a sequence-number bit
        let err = TcpHeader::parse(&bytes, &pseudo_iph()).unwrap_err();
        assert_eq!(err, HeaderError::BadChecksum("TCP".to_string()));
    }

    #[test]
    fn test_parse_rejects_short_data_offset() {
        let iph = pseudo_iph();
        let mut bytes = hex::decode(syn_hex()).unwrap();
        bytes[12] = 0x40; // data offset 4, below the 20-byte minimum
        bytes[16..18].fill(0);
        let checksum = TcpHeader::checksum(&bytes, &iph);
        bytes[16..18].copy_from_slice(&checksum.to_be_bytes());

        // Checksum-valid but malformed: must error, not panic
        let err = TcpHeader::parse(&bytes, &iph).unwrap_err();
        assert_eq!(
            err,
            HeaderError::BufferTooSmall {
                expected: TCP_HEADER_LEN,
                found: 16
            }
        );
    }

    #[test]
    fn test_round_trip_with_odd_payload() {
        let iph = pseudo_iph();
        let mut tcph = syn_header();
        tcph.flags = TcpFlags::PSH | TcpFlags::ACK;
        tcph.ack_no = Wrap32::new(88001);
        tcph.payload = b"abcde".to_vec(); // odd length hits the padding path

        let mut buf = [0u8; 64];
        let n = tcph.serialize(&mut buf, &iph).unwrap();
        assert_eq!(n, TCP_HEADER_LEN + 5);

        let parsed = TcpHeader::parse(&buf[..n], &iph).unwrap();
        assert_eq!(parsed.payload, b"abcde");
        assert_eq!(parsed.flags, TcpFlags::PSH | TcpFlags::ACK);
        assert_eq!(parsed.seq_no, tcph.seq_no);
        assert_eq!(parsed.ack_no, tcph.ack_no);
    }

    #[test]
    fn test_serialize_short_buffer() {
        let mut buf = [0u8; 10];
        let err = syn_header().serialize(&mut buf, &pseudo_iph()).unwrap_err();
        assert_eq!(
            err,
            HeaderError::BufferTooSmall {
                expected: TCP_HEADER_LEN,
                found: 10
            }
        );
    }
}

use crate::ip::ip_flags::IpFlags;
use crate::packet::errors::HeaderError;
use std::net::Ipv4Addr;

pub const IP_HEADER_LEN: usize = 20;

/// An IPv4 header without options (IHL is always 5 for traffic we build).
#[derive(Debug, Clone, PartialEq)]
pub struct IpHeader {
    pub version: u8,
    pub ihl: u8,
    pub tos: u8,
    pub total_len: u16,
    pub id: u16,
    pub flags: IpFlags,   // 3 bits, shares a u16 with frag_offset
    pub frag_offset: u16, // 13 bits
    pub ttl: u8,
    pub protocol: u8, // 6 for TCP
    pub checksum: u16,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
}

impl IpHeader {
    /// Write the header into `buf`, computing the checksum in place.
    pub fn serialize(&self, buf: &mut [u8]) -> Result<usize, HeaderError> {
        if buf.len() < IP_HEADER_LEN {
            return Err(HeaderError::BufferTooSmall {
                expected: IP_HEADER_LEN,
                found: buf.len(),
            });
        }

        buf[0] = (self.version << 4) | self.ihl;
        buf[1] = self.tos;
        buf[2..4].copy_from_slice(&self.total_len.to_be_bytes());
        buf[4..6].copy_from_slice(&self.id.to_be_bytes());
        buf[6..8].copy_from_slice(&self.flags.pack(self.frag_offset).to_be_bytes());
        buf[8] = self.ttl;
        buf[9] = self.protocol;
        buf[10..12].fill(0); // checksum starts zeroed
        buf[12..16].copy_from_slice(&self.src_ip.octets());
        buf[16..20].copy_from_slice(&self.dst_ip.octets());

        let checksum = Self::checksum(&buf[..IP_HEADER_LEN]);
        buf[10..12].copy_from_slice(&checksum.to_be_bytes());

        Ok(IP_HEADER_LEN)
    }

    /// Parse and checksum-validate the first 20 bytes of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < IP_HEADER_LEN {
            return Err(HeaderError::BufferTooSmall {
                expected: IP_HEADER_LEN,
                found: buf.len(),
            });
        }

        if Self::checksum(&buf[..IP_HEADER_LEN]) != 0 {
            return Err(HeaderError::BadChecksum("IP".to_string()));
        }

        let (flags, frag_offset) = IpFlags::unpack(u16::from_be_bytes([buf[6], buf[7]]));

        Ok(IpHeader {
            version: buf[0] >> 4,
            ihl: buf[0] & 0x0f,
            tos: buf[1],
            total_len: u16::from_be_bytes([buf[2], buf[3]]),
            id: u16::from_be_bytes([buf[4], buf[5]]),
            flags,
            frag_offset,
            ttl: buf[8],
            protocol: buf[9],
            checksum: u16::from_be_bytes([buf[10], buf[11]]),
            src_ip: Ipv4Addr::new(buf[12], buf[13], buf[14], buf[15]),
            dst_ip: Ipv4Addr::new(buf[16], buf[17], buf[18], buf[19]),
        })
    }

    /// Internet checksum over the header bytes. A header carrying its own
    /// correct checksum sums to 0.
    pub fn checksum(data: &[u8]) -> u16 {
        let mut sum: u32 = data
            .chunks(2)
            .map(|chunk| match chunk {
                [hi, lo] => u16::from_be_bytes([*hi, *lo]) as u32,
                [hi] => (*hi as u32) << 8,
                _ => 0,
            })
            .sum();

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

    // 40-byte SYN packet header, 192.168.0.2 -> 192.168.0.1, checksum 0xb97c
    fn syn_hex() -> &'static str {
        "45000028000040004006b97cc0a80002c0a80001"
    }

    fn syn_header() -> IpHeader {
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
            checksum: 0xb97c,
            src_ip: Ipv4Addr::new(192, 168, 0, 2),
            dst_ip: Ipv4Addr::new(192, 168, 0, 1),
        }
    }

    #[test]
    fn test_serialize_matches_fixture() {
        let mut buf = [0u8; IP_HEADER_LEN];
        let n = syn_header().serialize(&mut buf).unwrap();

        assert_eq!(n, IP_HEADER_LEN);
        assert_eq!(IpHeader::checksum(&buf), 0);
        assert_eq!(buf.to_vec(), hex::decode(syn_hex()).unwrap());
    }

    #[test]
    fn test_parse_fixture() {
        let bytes = hex::decode(syn_hex()).unwrap();
        let iph = IpHeader::parse(&bytes).unwrap();
        assert_eq!(iph, syn_header());
    }

    #[test]
    fn test_parse_rejects_corruption() {
        let mut bytes = hex::decode(syn_hex()).unwrap();
        bytes[8] = 0xff; // flip the TTL
        let err = IpHeader::parse(&bytes).unwrap_err();
        assert_eq!(err, HeaderError::BadChecksum("IP".to_string()));
    }

    #[test]
    fn test_parse_short_buffer() {
        let bytes = hex::decode(syn_hex()).unwrap();
        let err = IpHeader::parse(&bytes[..12]).unwrap_err();
        assert_eq!(
            err,
            HeaderError::BufferTooSmall {
                expected: IP_HEADER_LEN,
                found: 12
            }
        );
    }

    #[test]
    fn test_serialize_short_buffer() {
        let mut buf = [0u8; 8];
        let err = syn_header().serialize(&mut buf).unwrap_err();
        assert_eq!(
            err,
            HeaderError::BufferTooSmall {
                expected: IP_HEADER_LEN,
                found: 8
            }
        );
    }
}

use bitflags::bitflags;

bitflags! {
    // Top 3 bits of the flags/fragment-offset word [ RF, DF, MF, offset... ]
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct IpFlags: u16 {
        const RF = 1 << 15; // Reserved
        const DF = 1 << 14; // Don't Fragment
        const MF = 1 << 13; // More Fragments
    }
}

impl IpFlags {
    /// Combine the flags with a 13-bit fragment offset into one u16.
    pub fn pack(self, frag_offset: u16) -> u16 {
        self.bits() | (frag_offset & 0x1fff)
    }

    /// Split a u16 into the flag bits and the fragment offset.
    pub fn unpack(bits: u16) -> (Self, u16) {
        (Self::from_bits_truncate(bits & 0xe000), bits & 0x1fff)
    }
}

// -- Unit tests --

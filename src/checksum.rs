/// Calculates the 8-bit XOR checksum appended to commands carrying a payload.
pub struct Checksum {
    current: u8,
}

impl Checksum {
    /// Creates a new `Checksum` instance, initialized to 0.
    #[inline]
    pub fn new() -> Checksum {
        Checksum { current: 0 }
    }

    /// XORs every byte of `data` into the checksum.
    #[inline]
    pub fn push_slice(&mut self, data: &[u8]) {
        for d in data {
            self.current ^= d;
        }
    }

    /// Returns the calculated checksum value.
    #[inline]
    pub fn checksum(&self) -> u8 {
        self.current
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Self::new()
    }
}

/// Packet head marker of scan packets, also the checksum seed.
pub const SCAN_PACKET_HEAD: u16 = 0x55AA;

/// Computes the 16-bit XOR checksum of a scan packet.
///
/// Accumulation order: packet head, FSA, LSA, then per sample record the
/// first byte and the word `byte2 | byte1 << 8`, and finally `LSN | CT << 8`.
/// `samples` holds the raw 3-byte records; a trailing partial record is ignored.
///
/// This does not reproduce the sensor's own checksum for every firmware, so
/// the decoder only compares it against the received field when asked to.
pub fn scan_packet_checksum(ct: u8, lsn: u8, fsa: u16, lsa: u16, samples: &[u8]) -> u16 {
    let mut checksum = SCAN_PACKET_HEAD;
    checksum ^= fsa;
    checksum ^= lsa;
    for record in samples.chunks_exact(3) {
        checksum ^= record[0] as u16;
        checksum ^= (record[2] as u16) | ((record[1] as u16) << 8);
    }
    checksum ^= (lsn as u16) | ((ct as u16) << 8);
    checksum
}

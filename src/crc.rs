//! The (K1+16, K1) CRC block code of EN 300 396-2, 8.2.3.2

use crate::{Bit, Error};

/// Number of check bits appended to a payload
pub const CRC_LEN: usize = 16;

/// CRC polynomial, reflected representation
const POLY: u16 = 0x8408;

/// Returns the 16 check bits for a payload, least-significant bit first, matching the order in
/// which they are appended on the air interface.
#[must_use]
pub fn crc16(bits: &[Bit]) -> Vec<Bit> {
    let mut crc: u16 = 0xFFFF;
    for &bit in bits {
        let feedback = (bit as u16 ^ crc) & 1;
        crc = (crc >> 1) ^ if feedback == 1 { POLY } else { 0 };
    }
    crc ^= 0xFFFF;
    (0 .. CRC_LEN)
        .map(|i| {
            if (crc >> i) & 1 == 1 {
                Bit::One
            } else {
                Bit::Zero
            }
        })
        .collect()
}

/// Returns the payload with its 16 check bits appended.
#[must_use]
pub fn append_crc16(bits: &[Bit]) -> Vec<Bit> {
    let mut out = Vec::with_capacity(bits.len() + CRC_LEN);
    out.extend_from_slice(bits);
    out.extend(crc16(bits));
    out
}

/// Verifies the 16 check bits trailing a payload. `false` means the payload must be treated as
/// corrupted; it is a property of the received data, not a usage error.
///
/// # Errors
///
/// Returns an error if fewer than 16 bits are given.
pub fn check_crc16(bits: &[Bit]) -> Result<bool, Error> {
    if bits.len() < CRC_LEN {
        return Err(Error::InvalidInput(format!(
            "Expected at least {CRC_LEN} bits to verify (found {})",
            bits.len()
        )));
    }
    let (payload, check) = bits.split_at(bits.len() - CRC_LEN);
    Ok(crc16(payload) == check)
}

#[cfg(test)]
mod tests_of_crc {
    use super::*;
    use crate::utils::bits_from_str;
    use Bit::{One, Zero};

    #[test]
    fn test_crc16() {
        let payload = bits_from_str("10110010");
        assert_eq!(crc16(&payload), bits_from_str("1001100110010110"));
        // The check bits of an all-zero payload are not all zero (register starts at 0xFFFF)
        assert_eq!(crc16(&[Zero; 60]), bits_from_str("0001001011110000"));
    }

    #[test]
    fn test_append_crc16() {
        let payload = bits_from_str("10110010");
        let protected = append_crc16(&payload);
        assert_eq!(protected.len(), payload.len() + CRC_LEN);
        assert_eq!(protected[.. 8], payload[..]);
        assert_eq!(protected[8 ..], crc16(&payload)[..]);
    }

    #[test]
    fn test_check_crc16() {
        // Too short to hold check bits
        assert!(check_crc16(&[One; 15]).is_err());
        // Round trip
        let mut protected = append_crc16(&bits_from_str("10110010"));
        assert!(check_crc16(&protected).unwrap());
        // Any corruption is flagged, in payload or check bits alike
        protected[3] = protected[3].xor(One);
        assert!(!check_crc16(&protected).unwrap());
        protected[3] = protected[3].xor(One);
        protected[20] = protected[20].xor(One);
        assert!(!check_crc16(&protected).unwrap());
    }
}

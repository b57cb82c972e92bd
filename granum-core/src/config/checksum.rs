//! Record checksums
//!
//! The store takes the checksum engine as a parameter so a hardware CRC
//! unit can stand in for the software implementation.

/// Checksum over a byte slice
pub trait Checksum {
    fn checksum(&mut self, data: &[u8]) -> u32;
}

/// Software CRC32 (IEEE 802.3, reflected, init and xorout 0xFFFFFFFF)
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32;

impl Checksum for Crc32 {
    fn checksum(&mut self, data: &[u8]) -> u32 {
        crc32(data)
    }
}

/// CRC32 of `data`
pub fn crc32(data: &[u8]) -> u32 {
    !crc32_update(0xFFFF_FFFF, data)
}

/// Simple CRC32 update function (IEEE 802.3 polynomial)
pub fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB88320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_crc32_empty() {
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let crc = crc32_update(0xFFFF_FFFF, b"1234");
        let crc = crc32_update(crc, b"56789");
        assert_eq!(!crc, crc32(b"123456789"));
    }
}

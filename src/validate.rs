//! CRC checksum validation.

use crc::{Crc, CRC_8_SMBUS};

/// CRC-8 checksum function.
///
/// Polynomial `0x07`, initial value `0x00`, MSB first, no final XOR.
pub const CRC: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Calculates the CRC-8 checksum of the given bytes.
#[must_use]
pub const fn crc8(bytes: &[u8]) -> u8 {
    CRC.checksum(bytes)
}

/// A trait for checksum based data validation.
pub trait Validate: Sized {
    /// Returns the CRC checksum.
    fn crc(&self) -> u8;

    /// Calculates the CRC checksum of the frame data.
    fn calculate_crc(&self) -> u8;

    /// Determines whether the CRC checksum is valid.
    fn is_crc_valid(&self) -> bool {
        self.crc() == self.calculate_crc()
    }

    /// Validates whether the CRC checksum is valid.
    ///
    /// # Returns
    ///
    /// Returns `Self` if the checksum is valid.
    ///
    /// # Errors
    ///
    /// Returns the calculated CRC checksum if invalid.
    fn validate(self) -> Result<Self, u8> {
        let calculated_crc = self.calculate_crc();

        if self.crc() == calculated_crc {
            Ok(self)
        } else {
            Err(calculated_crc)
        }
    }
}

//! Firmware images as produced by the signing tool.

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;
use std::slice::Chunks;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::frame::Frame;

/// Size of the interrupt vector table at the start of the image.
pub const VECTOR_TABLE_SIZE: usize = 0x01B0;

/// Offset of the device ID inside the image.
pub const FWINFO_DEVICE_ID_OFFSET: usize = VECTOR_TABLE_SIZE + 4;

/// Offset of the embedded image length inside the image.
pub const FWINFO_LENGTH_OFFSET: usize = VECTOR_TABLE_SIZE + 3 * 4;

/// Marker starting the firmware info block.
pub const SENTINEL: u32 = 0xDEAD_C0DE;

/// Flash space occupied by the bootloader itself.
pub const BOOTLOADER_SIZE: usize = 0x8000;

/// Largest image that fits into the application flash region.
pub const MAX_FW_LENGTH: usize = 512 * 1024 - BOOTLOADER_SIZE;

/// Size of the firmware info block.
const FWINFO_SIZE: usize = 4 * 4;

/// Firmware info block following the vector table.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FirmwareInfo {
    /// Marker, [`SENTINEL`] for valid images.
    pub sentinel: u32,
    /// Device the image was built for.
    pub device_id: u32,
    /// Firmware version.
    pub version: u32,
    /// Image length as recorded by the signing tool.
    pub length: u32,
}

impl FirmwareInfo {
    fn parse(bytes: &[u8]) -> Option<Self> {
        let word = |index: usize| -> Option<u32> {
            let offset = VECTOR_TABLE_SIZE + index * 4;
            bytes
                .get(offset..offset + 4)
                .and_then(|word| word.try_into().ok())
                .map(u32::from_le_bytes)
        };

        Some(Self {
            sentinel: word(0)?,
            device_id: word(1)?,
            version: word(2)?,
            length: word(3)?,
        })
    }

    /// Determines whether the info block starts with the [`SENTINEL`].
    #[must_use]
    pub const fn has_sentinel(&self) -> bool {
        self.sentinel == SENTINEL
    }
}

impl Display for FirmwareInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "device ID {:#04X}, version {:#010X}, length {} bytes",
            self.device_id, self.version, self.length
        )
    }
}

/// A firmware image held in memory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Firmware {
    bytes: Vec<u8>,
}

impl Firmware {
    /// Reads a firmware image from a file.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Io`] if the file cannot be read.
    pub fn read<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let bytes = fs::read(path.as_ref())?;
        debug!(
            "Read {} bytes from {}.",
            bytes.len(),
            path.as_ref().display()
        );
        Ok(Self::from(bytes))
    }

    /// Returns the raw image.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the length of the image in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Determines whether the image is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the device ID the image was built for.
    ///
    /// Images too short to contain an info block report device ID `0x00`.
    #[must_use]
    pub fn device_id(&self) -> u8 {
        self.bytes
            .get(FWINFO_DEVICE_ID_OFFSET)
            .copied()
            .unwrap_or_else(|| {
                warn!(
                    "Image of {} bytes has no device ID, sending 0x00.",
                    self.len()
                );
                0x00
            })
    }

    /// Returns the firmware info block if the image is long enough to hold one.
    #[must_use]
    pub fn info(&self) -> Option<FirmwareInfo> {
        FirmwareInfo::parse(&self.bytes)
    }

    /// Checks that the image can be flashed.
    ///
    /// A missing sentinel or a mismatching embedded length is only logged,
    /// since images are signed and verified before they get here.
    ///
    /// # Errors
    ///
    /// Returns
    /// - [`Error::EmptyImage`] if the image is empty, or
    /// - [`Error::ImageTooLarge`] if it does not fit into the application flash region.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::EmptyImage);
        }

        if self.len() > MAX_FW_LENGTH {
            return Err(Error::ImageTooLarge(self.len()));
        }

        let Some(info) = self.info() else {
            warn!(
                "Image of {} bytes is too short for a firmware info block ({} bytes).",
                self.len(),
                VECTOR_TABLE_SIZE + FWINFO_SIZE
            );
            return Ok(());
        };

        if !info.has_sentinel() {
            warn!(
                "Firmware info sentinel mismatch: expected {SENTINEL:#010X}, found {:#010X}.",
                info.sentinel
            );
        } else if info.length as usize != self.len() {
            warn!(
                "Embedded length {} at offset {FWINFO_LENGTH_OFFSET:#06X} differs from image length {}.",
                info.length,
                self.len()
            );
        }

        debug!("Firmware info: {info}");
        Ok(())
    }

    /// Returns the image split into chunks that fit into a single frame.
    pub fn chunks(&self) -> Chunks<'_, u8> {
        self.bytes.chunks(Frame::DATA_SIZE)
    }
}

impl From<Vec<u8>> for Firmware {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl AsRef<[u8]> for Firmware {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Firmware, FirmwareInfo, FWINFO_DEVICE_ID_OFFSET, MAX_FW_LENGTH, SENTINEL,
        VECTOR_TABLE_SIZE,
    };
    use crate::error::Error;

    fn signed_image(device_id: u32, version: u32, length: usize) -> Vec<u8> {
        let mut bytes = vec![0xAA; length];
        let info = [SENTINEL, device_id, version, length as u32];

        for (index, word) in info.iter().enumerate() {
            let offset = VECTOR_TABLE_SIZE + index * 4;
            bytes[offset..offset + 4].copy_from_slice(&word.to_le_bytes());
        }

        bytes
    }

    #[test]
    fn test_device_id() {
        let firmware = Firmware::from(signed_image(0x42, 1, 0x400));
        assert_eq!(firmware.device_id(), 0x42);
        assert_eq!(firmware.as_bytes()[FWINFO_DEVICE_ID_OFFSET], 0x42);
    }

    #[test]
    fn test_short_image_has_device_id_zero() {
        assert_eq!(Firmware::from(vec![0x01; 37]).device_id(), 0x00);
    }

    #[test]
    fn test_info() {
        let firmware = Firmware::from(signed_image(0x42, 0x0001_0203, 0x400));
        assert_eq!(
            firmware.info(),
            Some(FirmwareInfo {
                sentinel: SENTINEL,
                device_id: 0x42,
                version: 0x0001_0203,
                length: 0x400,
            })
        );
        assert!(firmware.info().is_some_and(|info| info.has_sentinel()));
    }

    #[test]
    fn test_info_of_short_image() {
        let firmware = Firmware::from(vec![0x00; VECTOR_TABLE_SIZE + 15]);
        assert_eq!(firmware.info(), None);
    }

    #[test]
    fn test_validate() {
        assert!(Firmware::from(signed_image(0x42, 1, 0x400))
            .validate()
            .is_ok());
        // Only warned about.
        assert!(Firmware::from(vec![0xFF; 37]).validate().is_ok());
        assert!(Firmware::from(vec![0xFF; 0x400]).validate().is_ok());
    }

    #[test]
    fn test_validate_empty() {
        assert!(matches!(
            Firmware::from(Vec::new()).validate(),
            Err(Error::EmptyImage)
        ));
    }

    #[test]
    fn test_validate_too_large() {
        assert!(Firmware::from(vec![0x00; MAX_FW_LENGTH]).validate().is_ok());
        assert!(matches!(
            Firmware::from(vec![0x00; MAX_FW_LENGTH + 1]).validate(),
            Err(Error::ImageTooLarge(size)) if size == MAX_FW_LENGTH + 1
        ));
    }

    #[test]
    fn test_chunks() {
        let bytes: Vec<u8> = (0..37).collect();
        let firmware = Firmware::from(bytes.clone());
        let sizes: Vec<usize> = firmware.chunks().map(<[u8]>::len).collect();
        assert_eq!(sizes, vec![16, 16, 5]);
        assert_eq!(firmware.chunks().flatten().copied().collect::<Vec<_>>(), bytes);
    }

    #[test]
    fn test_read() {
        let path = std::env::temp_dir().join(format!("fwflash-test-{}.bin", std::process::id()));
        std::fs::write(&path, [0x01, 0x02, 0x03]).expect("Writing should succeed.");
        let firmware = Firmware::read(&path);
        std::fs::remove_file(&path).expect("Removing should succeed.");
        assert_eq!(
            firmware.ok().map(|firmware| firmware.as_bytes().to_vec()),
            Some(vec![0x01, 0x02, 0x03])
        );
    }

    #[test]
    fn test_read_missing_file() {
        assert!(matches!(
            Firmware::read("/nonexistent/fwflash/image.bin"),
            Err(Error::Io(_))
        ));
    }
}

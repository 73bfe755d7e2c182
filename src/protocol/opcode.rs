use std::fmt::{Display, Formatter};

/// Bootloader protocol opcodes.
///
/// An opcode occupies the first data byte of a frame.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Opcode {
    /// The bootloader observed the sync sequence.
    SyncObserved = 0x20,
    /// Host requests a firmware update.
    UpdateRequest = 0x31,
    /// Bootloader accepts the firmware update request.
    UpdateResponse = 0x37,
    /// Bootloader asks for the device ID of the image.
    DeviceIdRequest = 0x3C,
    /// Host answers with the device ID of the image.
    DeviceIdResponse = 0x3F,
    /// Bootloader asks for the image length.
    LengthRequest = 0x42,
    /// Host answers with the image length.
    LengthResponse = 0x45,
    /// Bootloader is ready for the next chunk of data.
    ReadyForData = 0x48,
    /// Bootloader has written and verified the image.
    UpdateSuccessful = 0x54,
    /// Bootloader rejects the update.
    Nack = 0x59,
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> Self {
        opcode as Self
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x20 => Ok(Self::SyncObserved),
            0x31 => Ok(Self::UpdateRequest),
            0x37 => Ok(Self::UpdateResponse),
            0x3C => Ok(Self::DeviceIdRequest),
            0x3F => Ok(Self::DeviceIdResponse),
            0x42 => Ok(Self::LengthRequest),
            0x45 => Ok(Self::LengthResponse),
            0x48 => Ok(Self::ReadyForData),
            0x54 => Ok(Self::UpdateSuccessful),
            0x59 => Ok(Self::Nack),
            other => Err(other),
        }
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SyncObserved => "SYNC_OBSERVED",
            Self::UpdateRequest => "FW_UPDATE_REQ",
            Self::UpdateResponse => "FW_UPDATE_RES",
            Self::DeviceIdRequest => "DEVICE_ID_REQ",
            Self::DeviceIdResponse => "DEVICE_ID_RES",
            Self::LengthRequest => "FW_LENGTH_REQ",
            Self::LengthResponse => "FW_LENGTH_RES",
            Self::ReadyForData => "READY_FOR_DATA",
            Self::UpdateSuccessful => "UPDATE_SUCCESSFUL",
            Self::Nack => "NACK",
        };

        write!(f, "{name}({:#04X})", *self as u8)
    }
}

//! Fixed-size frames of the bootloader packet protocol.
//!
//! Every frame on the wire is exactly [`Frame::SIZE`] bytes long:
//!
//! ```text
//! [length:1][data:16][crc8:1]
//! ```
//!
//! The payload is left-justified in `data` and padded with `0xFF`.
//! The `length` field carries the number of meaningful payload bytes.
//! The CRC is calculated over `length` followed by all sixteen data bytes.

use core::fmt::{Display, Formatter, LowerHex, UpperHex};

use crate::error::Error;
use crate::protocol::{ControlByte, Opcode};
use crate::utils::HexSlice;
use crate::validate::{Validate, CRC};

/// Byte used to pad the unused tail of the data field.
const PADDING: u8 = 0xFF;

/// A single frame of the bootloader packet protocol.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Frame {
    length: u8,
    data: [u8; Self::DATA_SIZE],
    crc: u8,
}

impl Frame {
    /// Size of the data field.
    pub const DATA_SIZE: usize = 16;

    /// Total size of a frame on the wire.
    pub const SIZE: usize = 1 + Self::DATA_SIZE + 1;

    /// Acknowledgement control frame.
    pub const ACK: Self = Self::single_byte(ControlByte::Ack as u8);

    /// Retransmission request control frame.
    pub const RETX: Self = Self::single_byte(ControlByte::Retx as u8);

    /// Creates a new frame carrying the given payload.
    ///
    /// The `length` field is set to the payload size and the CRC is calculated.
    ///
    /// # Errors
    ///
    /// Returns
    /// - [`Error::EmptyPayload`] if the payload is empty, or
    /// - [`Error::PayloadTooLarge`] if it exceeds [`Frame::DATA_SIZE`] bytes.
    pub fn new(payload: &[u8]) -> Result<Self, Error> {
        if payload.is_empty() {
            return Err(Error::EmptyPayload);
        }

        if payload.len() > Self::DATA_SIZE {
            return Err(Error::PayloadTooLarge(payload.len()));
        }

        let mut data = [PADDING; Self::DATA_SIZE];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self::with_length(payload.len() as u8, data))
    }

    /// Creates a new frame carrying a single byte.
    #[must_use]
    pub const fn single_byte(byte: u8) -> Self {
        let mut data = [PADDING; Self::DATA_SIZE];
        data[0] = byte;
        Self::with_length(1, data)
    }

    /// Creates a frame carrying a single opcode.
    #[must_use]
    pub const fn opcode(opcode: Opcode) -> Self {
        Self::single_byte(opcode as u8)
    }

    /// Creates a frame from its raw fields, calculating the CRC.
    #[must_use]
    pub const fn with_length(length: u8, data: [u8; Self::DATA_SIZE]) -> Self {
        Self {
            length,
            data,
            crc: checksum(length, &data),
        }
    }

    /// Creates a frame from its raw fields with an explicit CRC.
    ///
    /// The CRC is taken as is and may not match the frame's content.
    #[must_use]
    pub const fn with_crc(length: u8, data: [u8; Self::DATA_SIZE], crc: u8) -> Self {
        Self { length, data, crc }
    }

    /// Returns the length field.
    #[must_use]
    pub const fn length(&self) -> u8 {
        self.length
    }

    /// Returns the full data field including the padding.
    #[must_use]
    pub const fn data(&self) -> &[u8; Self::DATA_SIZE] {
        &self.data
    }

    /// Returns the meaningful payload bytes as indicated by the length field.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.data[..usize::from(self.length).min(Self::DATA_SIZE)]
    }

    /// Determines whether this is a single-byte frame carrying `byte`.
    ///
    /// That is the case iff the length is one, the first data byte equals `byte`
    /// and all remaining data bytes are padding.
    #[must_use]
    pub fn is_single_byte(&self, byte: u8) -> bool {
        self.length == 1 && self.data[0] == byte && self.data[1..].iter().all(|&b| b == PADDING)
    }

    /// Determines whether this is a single-byte frame carrying the given opcode.
    #[must_use]
    pub fn is_opcode(&self, opcode: Opcode) -> bool {
        self.is_single_byte(opcode.into())
    }

    /// Returns the control byte if this is a single-byte control frame.
    #[must_use]
    pub fn control_byte(&self) -> Option<ControlByte> {
        ControlByte::try_from(self.data[0])
            .ok()
            .filter(|&control_byte| self.is_single_byte(control_byte.into()))
    }

    /// Returns the opcode carried in the first data byte, if it is a known one.
    #[must_use]
    pub fn first_opcode(&self) -> Option<Opcode> {
        Opcode::try_from(self.data[0]).ok()
    }

    /// Serializes the frame into its wire representation.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        bytes[0] = self.length;
        bytes[1..=Self::DATA_SIZE].copy_from_slice(&self.data);
        bytes[Self::SIZE - 1] = self.crc;
        bytes
    }
}

/// Decodes a frame from its wire representation without any validation.
impl From<[u8; Frame::SIZE]> for Frame {
    fn from(bytes: [u8; Frame::SIZE]) -> Self {
        let mut data = [0; Self::DATA_SIZE];
        data.copy_from_slice(&bytes[1..=Self::DATA_SIZE]);
        Self::with_crc(bytes[0], data, bytes[Self::SIZE - 1])
    }
}

impl TryFrom<&[u8]> for Frame {
    type Error = Error;

    fn try_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        <[u8; Self::SIZE]>::try_from(buffer)
            .map(Self::from)
            .map_err(|_| Error::InvalidFrameSize(buffer.len()))
    }
}

impl Validate for Frame {
    fn crc(&self) -> u8 {
        self.crc
    }

    fn calculate_crc(&self) -> u8 {
        checksum(self.length, &self.data)
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(control_byte) = self.control_byte() {
            return match control_byte {
                ControlByte::Ack => write!(f, "ACK"),
                ControlByte::Retx => write!(f, "RETX"),
            };
        }

        match self.first_opcode() {
            Some(opcode) if self.length == 1 => write!(f, "{opcode}"),
            Some(opcode) => write!(f, "{opcode} + {} byte(s)", self.length.saturating_sub(1)),
            None => write!(f, "DATA({} byte(s))", self.length),
        }
    }
}

impl UpperHex for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame {{ length: ")?;
        UpperHex::fmt(&self.length, f)?;
        write!(f, ", data: ")?;
        UpperHex::fmt(&HexSlice::new(&self.data), f)?;
        write!(f, ", crc: ")?;
        UpperHex::fmt(&self.crc, f)?;
        write!(f, " }}")
    }
}

impl LowerHex for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame {{ length: ")?;
        LowerHex::fmt(&self.length, f)?;
        write!(f, ", data: ")?;
        LowerHex::fmt(&HexSlice::new(&self.data), f)?;
        write!(f, ", crc: ")?;
        LowerHex::fmt(&self.crc, f)?;
        write!(f, " }}")
    }
}

/// Calculates the CRC over the length byte followed by the data field.
const fn checksum(length: u8, data: &[u8; Frame::DATA_SIZE]) -> u8 {
    let mut bytes = [length; Frame::DATA_SIZE + 1];
    let mut index = 0;

    while index < Frame::DATA_SIZE {
        bytes[index + 1] = data[index];
        index += 1;
    }

    CRC.checksum(&bytes)
}

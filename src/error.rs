use std::fmt::{Display, Formatter};
use std::io;
use std::time::Duration;

use crate::frame::Frame;
use crate::protocol::Opcode;

/// Result type with the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a firmware update.
///
/// Frame corruption is recovered by the transport and never surfaces here.
#[derive(Debug)]
pub enum Error {
    /// I/O error on the serial port or the firmware image.
    Io(io::Error),
    /// The serial port could not be opened or configured.
    Serial(serialport::Error),
    /// No frame arrived within the given time.
    Timeout(Duration),
    /// The bootloader rejected the update.
    Nack,
    /// A frame other than the expected one arrived.
    UnexpectedFrame {
        /// The opcode that was expected.
        expected: Opcode,
        /// The frame that was received instead.
        frame: Frame,
    },
    /// The byte intake stopped delivering frames.
    Disconnected,
    /// A frame must carry at least one payload byte.
    EmptyPayload,
    /// A payload does not fit into a single frame.
    PayloadTooLarge(usize),
    /// A raw frame buffer has the wrong size.
    InvalidFrameSize(usize),
    /// The firmware image contains no data.
    EmptyImage,
    /// The firmware image exceeds the maximum supported length.
    ImageTooLarge(usize),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(error) => write!(f, "I/O error: {error}"),
            Self::Serial(error) => write!(f, "Serial port error: {error}"),
            Self::Timeout(timeout) => {
                write!(f, "Timed out waiting for packet after {timeout:?}.")
            }
            Self::Nack => write!(f, "Received NACK from bootloader."),
            Self::UnexpectedFrame { expected, frame } => write!(
                f,
                "Unexpected packet received. Expected single byte {expected}, got packet {frame:#04X}"
            ),
            Self::Disconnected => write!(f, "Byte intake disconnected."),
            Self::EmptyPayload => write!(f, "Frame payload is empty."),
            Self::PayloadTooLarge(size) => write!(
                f,
                "Payload of {size} bytes exceeds frame capacity of {} bytes.",
                Frame::DATA_SIZE
            ),
            Self::InvalidFrameSize(size) => write!(
                f,
                "Invalid frame size. Expected {} bytes, but found {size} bytes.",
                Frame::SIZE
            ),
            Self::EmptyImage => write!(f, "Firmware image is empty."),
            Self::ImageTooLarge(size) => {
                write!(f, "Firmware image of {size} bytes is too large.")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            Self::Serial(error) => Some(error),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serialport::Error> for Error {
    fn from(error: serialport::Error) -> Self {
        Self::Serial(error)
    }
}

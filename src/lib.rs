//! Firmware updater for serial bootloaders
//!
//! This library flashes firmware images onto embedded devices through a bootloader
//! speaking a fixed-frame packet protocol over a serial link.
//!
//! Every frame is 18 bytes long: a length byte, 16 data bytes padded with `0xFF` and
//! a CRC8 over the former two. Corrupted frames are retransmitted on request, every
//! other frame is acknowledged. The [`Updater`] drives the bootloader handshake on
//! top of the [`Transport`].

pub use error::{Error, Result};
pub use firmware::{Firmware, FirmwareInfo};
pub use frame::Frame;
pub use protocol::{ControlByte, Opcode, SYNC_SEQUENCE};
pub use serial_port::{connect, open, SerialPortImpl, DEFAULT_BAUD_RATE, DEFAULT_PORT};
pub use transport::{Listener, Receiver, Transmitter, Transport, DEFAULT_TIMEOUT};
pub use updater::{Options, Phase, Progress, Updater};
pub use utils::HexSlice;
pub use validate::{crc8, Validate, CRC};

// Only used by the binary.
#[cfg(feature = "cli")]
use {clap as _, env_logger as _};

mod error;
pub mod firmware;
mod frame;
mod protocol;
mod serial_port;
#[cfg(test)]
mod test_utils;
mod transport;
mod types;
pub mod updater;
mod utils;
mod validate;

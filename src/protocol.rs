//! Constants of the bootloader packet protocol.

pub use control_byte::ControlByte;
pub use opcode::Opcode;

mod control_byte;
mod opcode;

/// Out-of-band byte sequence that wakes the bootloader up.
///
/// It is written raw, outside of any frame.
pub const SYNC_SEQUENCE: [u8; 4] = [0xC4, 0x55, 0x7E, 0x10];

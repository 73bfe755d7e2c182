/// Transport-level control bytes.
///
/// Control frames are single-byte frames carrying one of these values.
/// They are consumed by the transport and never reach the updater.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum ControlByte {
    /// Acknowledges a received and verified frame.
    Ack = 0x15,

    /// Requests a retransmission of the last sent frame.
    Retx = 0x19,
}

impl From<ControlByte> for u8 {
    fn from(control_byte: ControlByte) -> Self {
        control_byte as Self
    }
}

impl TryFrom<u8> for ControlByte {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x15 => Ok(Self::Ack),
            0x19 => Ok(Self::Retx),
            other => Err(other),
        }
    }
}

use std::borrow::Cow;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

#[cfg(windows)]
pub use serialport::COMPort as SerialPortImpl;

#[cfg(unix)]
pub use serialport::TTYPort as SerialPortImpl;

use crate::error::Result;
use crate::transport::{Listener, Transport};

/// Serial device the bootloader is usually attached to.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Baud rate the bootloader operates on.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Timeout of a single read, after which the listener checks whether to stop.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Opens a serial port depending on the local operating system.
///
/// The port is configured as 8N1 without flow control.
///
/// # Errors
/// For errors please refer to [`SerialPortImpl::open()`] and [`serialport::new()`]
pub fn open<'a>(
    path: impl Into<Cow<'a, str>>,
    baud_rate: u32,
) -> serialport::Result<SerialPortImpl> {
    SerialPortImpl::open(
        &serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT),
    )
}

/// Sets up a transport on an open serial port.
///
/// A [`Listener`] thread reads a clone of the port and feeds the transport's intake.
///
/// # Errors
///
/// Returns an [`Error::Serial`](crate::Error::Serial) if the port cannot be cloned.
pub fn connect(serial_port: SerialPortImpl) -> Result<(Transport<SerialPortImpl>, Listener)> {
    let reader = serial_port.try_clone()?;
    let (transport, receiver) = Transport::new(serial_port);
    Ok((transport, Listener::spawn(reader, receiver)))
}

#[cfg(test)]
mod tests {
    use super::{open, DEFAULT_BAUD_RATE};

    #[test]
    fn test_open_missing_port() {
        assert!(open("/dev/fwflash-nonexistent", DEFAULT_BAUD_RATE).is_err());
    }
}

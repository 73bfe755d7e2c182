use std::io::{self, Write};

use log::{debug, trace};

use crate::frame::Frame;
use crate::protocol::ControlByte;
use crate::utils::HexSlice;

/// Frame replayed on a retransmission request before anything has been sent.
const INITIAL_FRAME: Frame = Frame::single_byte(0xFF);

/// Writing half of the transport.
///
/// Keeps the last frame sent so that a retransmission request can be served.
#[derive(Debug)]
pub struct Transmitter<T> {
    writer: T,
    last_sent: Frame,
}

impl<T> Transmitter<T> {
    /// Creates a new transmitter writing to `writer`.
    #[must_use]
    pub const fn new(writer: T) -> Self {
        Self {
            writer,
            last_sent: INITIAL_FRAME,
        }
    }

    /// Returns the frame replayed on the next retransmission request.
    ///
    /// Until a frame has been sent, this is a single-byte `0xFF` frame.
    #[must_use]
    pub const fn last_sent(&self) -> &Frame {
        &self.last_sent
    }

    /// Return the inner writer.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.writer
    }
}

impl<T> Transmitter<T>
where
    T: Write,
{
    /// Writes a frame and records it for retransmission.
    ///
    /// A `RETX` frame is never recorded, so a retransmission request always replays
    /// the most recent frame that was not a retransmission request itself.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if writing fails.
    pub fn write_frame(&mut self, frame: Frame) -> io::Result<()> {
        debug!("Writing frame: {frame}");
        self.write_bytes(&frame.to_bytes())?;

        if frame.control_byte() != Some(ControlByte::Retx) {
            self.last_sent = frame;
        }

        Ok(())
    }

    /// Writes raw bytes outside of any frame.
    ///
    /// The last sent frame is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if writing fails.
    pub fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_bytes(bytes)
    }

    /// Replays the last sent frame bit by bit.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if writing fails.
    pub fn retransmit(&mut self) -> io::Result<()> {
        let frame = self.last_sent;
        debug!("Retransmitting frame: {frame}");
        self.write_bytes(&frame.to_bytes())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        trace!("Writing bytes: {:#04X}", HexSlice::new(bytes));
        self.writer.write_all(bytes)?;
        self.writer.flush()
    }
}

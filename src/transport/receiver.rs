use std::io::Write;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error, trace, warn};

use super::transmitter::Transmitter;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::protocol::{ControlByte, Opcode};
use crate::types::RawFrame;
use crate::utils::HexSlice;
use crate::validate::Validate;

/// Byte intake of the transport.
///
/// Assembles incoming bytes into frames, verifies them and handles the transport-level
/// control frames. Application frames are acknowledged and delivered to the [`Transport`](super::Transport).
#[derive(Debug)]
pub struct Receiver<T> {
    buffer: RawFrame,
    transmitter: Arc<Mutex<Transmitter<T>>>,
    deliveries: Sender<Result<Frame>>,
    failed: bool,
}

impl<T> Receiver<T> {
    pub(super) fn new(
        transmitter: Arc<Mutex<Transmitter<T>>>,
        deliveries: Sender<Result<Frame>>,
    ) -> Self {
        Self {
            buffer: RawFrame::new(),
            transmitter,
            deliveries,
            failed: false,
        }
    }

    /// Determines whether the intake has stopped due to a fatal error.
    #[must_use]
    pub const fn has_failed(&self) -> bool {
        self.failed
    }

    /// Returns the amount of buffered bytes not yet assembled into a frame.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Stops the intake and delivers `error` to the transport.
    pub(super) fn fail(&mut self, error: Error) {
        self.failed = true;
        self.buffer.clear();
        self.deliver(Err(error));
    }

    fn deliver(&mut self, item: Result<Frame>) {
        if self.deliveries.send(item).is_err() {
            debug!("Transport has been dropped, stopping intake.");
            self.failed = true;
        }
    }
}

impl<T> Receiver<T>
where
    T: Write,
{
    /// Handles a chunk of newly arrived bytes.
    ///
    /// Every complete frame is processed before this returns.
    /// This may write `ACK`, `RETX` or retransmitted frames to the transmitter.
    ///
    /// # Returns
    ///
    /// Returns `false` once the intake has failed.
    /// The failure itself is delivered to the transport.
    pub fn feed(&mut self, bytes: &[u8]) -> bool {
        if self.failed {
            trace!("Ignoring {} byte(s) after failure.", bytes.len());
            return false;
        }

        let mut remaining = bytes;

        while !remaining.is_empty() {
            let missing = Frame::SIZE - self.buffer.len();
            let (head, tail) = remaining.split_at(missing.min(remaining.len()));
            self.buffer.extend(head.iter().copied());
            remaining = tail;

            if !self.buffer.is_full() {
                break;
            }

            let frame = self.take_frame();

            if let Err(error) = self.handle_frame(frame) {
                self.fail(error);
                return false;
            }

            if self.failed {
                return false;
            }
        }

        true
    }

    /// Decodes the full buffer and empties it.
    fn take_frame(&mut self) -> Frame {
        let mut bytes = [0; Frame::SIZE];
        bytes.copy_from_slice(&self.buffer);
        self.buffer.clear();
        Frame::from(bytes)
    }

    fn handle_frame(&mut self, frame: Frame) -> Result<()> {
        trace!("Received frame: {frame:#04X}");

        let frame = match frame.validate() {
            Ok(frame) => frame,
            Err(calculated_crc) => {
                warn!(
                    "CRC failed, computed {calculated_crc:#04X}, got {:#04X}. Requesting retransmission.",
                    frame.crc()
                );
                trace!("Frame bytes: {:#04X}", HexSlice::new(&frame.to_bytes()));
                return self.write_frame(Frame::RETX);
            }
        };

        match frame.control_byte() {
            Some(ControlByte::Retx) => {
                debug!("Retransmitting last frame on request.");
                self.lock().retransmit()?;
                return Ok(());
            }
            Some(ControlByte::Ack) => {
                trace!("Received ACK.");
                return Ok(());
            }
            None => (),
        }

        if frame.is_opcode(Opcode::Nack) {
            error!("Received NACK.");
            self.failed = true;
            self.deliver(Err(Error::Nack));
            return Ok(());
        }

        debug!("Received frame: {frame}");
        self.write_frame(Frame::ACK)?;
        self.deliver(Ok(frame));
        Ok(())
    }

    fn write_frame(&self, frame: Frame) -> Result<()> {
        self.lock().write_frame(frame).map_err(Error::from)
    }

    fn lock(&self) -> MutexGuard<'_, Transmitter<T>> {
        self.transmitter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

//! Reliable frame transport on top of a raw byte stream.
//!
//! The transport is split in two halves sharing one [`Transmitter`]:
//!
//! * The [`Transport`] is used by the updater to send frames and to await the next
//!   application frame.
//! * The [`Receiver`] is the byte intake. It is fed with every chunk of bytes arriving
//!   from the peer, either directly or by a [`Listener`] thread reading a serial port.
//!
//! Corrupted frames are answered with a `RETX` request, `RETX` requests from the peer are
//! served by replaying the last frame sent and `ACK`s are swallowed. Everything else is
//! acknowledged and delivered in order. A `NACK` from the bootloader stops the intake.

use std::io::Write;
use std::sync::mpsc::{channel, RecvTimeoutError, TryRecvError};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, trace};

pub use self::listener::Listener;
pub use self::receiver::Receiver;
pub use self::transmitter::Transmitter;
use crate::error::{Error, Result};
use crate::frame::Frame;

mod listener;
mod receiver;
mod transmitter;

/// Default time to wait for the next frame.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Sending half of the transport and consumer of delivered frames.
#[derive(Debug)]
pub struct Transport<T> {
    transmitter: Arc<Mutex<Transmitter<T>>>,
    frames: mpsc::Receiver<Result<Frame>>,
}

impl<T> Transport<T> {
    /// Creates a new transport writing to `writer`.
    ///
    /// # Returns
    ///
    /// Returns the transport and the [`Receiver`] that must be fed with incoming bytes.
    #[must_use]
    pub fn new(writer: T) -> (Self, Receiver<T>) {
        let transmitter = Arc::new(Mutex::new(Transmitter::new(writer)));
        let (deliveries, frames) = channel();
        (
            Self {
                transmitter: transmitter.clone(),
                frames,
            },
            Receiver::new(transmitter, deliveries),
        )
    }

    /// Waits for the next application frame.
    ///
    /// # Errors
    ///
    /// Returns
    /// - [`Error::Timeout`] if no frame arrived within `timeout`,
    /// - [`Error::Nack`] if the bootloader rejected the update,
    /// - [`Error::Disconnected`] if the intake stopped, or
    /// - any error that stopped the intake.
    pub fn await_next_frame(&self, timeout: Duration) -> Result<Frame> {
        trace!("Awaiting next frame for {timeout:?}.");

        match self.frames.recv_timeout(timeout) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => Err(Error::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(Error::Disconnected),
        }
    }

    /// Returns the next application frame if one has already been delivered.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Transport::await_next_frame`] except for timeouts.
    pub fn try_next_frame(&self) -> Result<Option<Frame>> {
        match self.frames.try_recv() {
            Ok(frame) => frame.map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Error::Disconnected),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Transmitter<T>> {
        self.transmitter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Transport<T>
where
    T: Write,
{
    /// Sends a frame.
    ///
    /// The frame is kept for retransmission until the next frame is sent.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Io`] if writing fails.
    pub fn send(&self, frame: Frame) -> Result<()> {
        debug!("Sending frame: {frame}");
        self.lock().write_frame(frame).map_err(Error::from)
    }

    /// Sends raw bytes outside of any frame.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Io`] if writing fails.
    pub fn send_raw(&self, bytes: &[u8]) -> Result<()> {
        self.lock().write_raw(bytes).map_err(Error::from)
    }
}

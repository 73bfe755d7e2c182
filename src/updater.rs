//! Bootloader handshake driving a firmware update.
//!
//! The [`Updater`] walks through the [`Phase`]s strictly in order.
//! Any timeout or unexpected frame aborts the update. Retries happen only on the
//! frame level inside the [`Transport`].

use std::fmt::{Debug, Formatter};
use std::io::Write;
use std::thread::sleep;
use std::time::Instant;

use log::{debug, error, info};

pub use self::options::{Options, DEFAULT_ERASE_DELAY, DEFAULT_SYNC_DELAY};
pub use self::phase::Phase;
pub use self::progress::Progress;
use crate::error::{Error, Result};
use crate::firmware::Firmware;
use crate::frame::Frame;
use crate::protocol::{Opcode, SYNC_SEQUENCE};
use crate::transport::Transport;

mod options;
mod phase;
mod progress;

type ProgressCallback = Box<dyn FnMut(Progress)>;

/// Flashes firmware images onto a device through its bootloader.
pub struct Updater<T> {
    transport: Transport<T>,
    options: Options,
    phase: Phase,
    progress: Progress,
    device_id: Option<u8>,
    on_progress: Option<ProgressCallback>,
}

impl<T> Updater<T> {
    /// Creates a new updater talking through `transport`.
    #[must_use]
    pub fn new(transport: Transport<T>, options: Options) -> Self {
        Self {
            transport,
            options,
            phase: Phase::default(),
            progress: Progress::default(),
            device_id: None,
            on_progress: None,
        }
    }

    /// Returns the current phase.
    ///
    /// After a failed update this is the phase the update failed in.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the amount of the image transferred so far.
    #[must_use]
    pub const fn progress(&self) -> Progress {
        self.progress
    }

    /// Returns the device ID sent to the bootloader in the current session.
    #[must_use]
    pub const fn device_id(&self) -> Option<u8> {
        self.device_id
    }

    /// Sets a callback invoked after every data chunk sent.
    pub fn on_progress<F>(&mut self, callback: F)
    where
        F: FnMut(Progress) + 'static,
    {
        self.on_progress.replace(Box::new(callback));
    }

    fn enter(&mut self, phase: Phase) {
        debug!("{} -> {phase}", self.phase);
        self.phase = phase;
    }
}

impl<T> Updater<T>
where
    T: Write,
{
    /// Flashes `firmware` onto the device.
    ///
    /// # Errors
    ///
    /// Returns
    /// - [`Error::Timeout`] if the bootloader does not answer in time,
    /// - [`Error::UnexpectedFrame`] if it answers with the wrong frame,
    /// - [`Error::Nack`] if it rejects the update, or
    /// - an I/O error from the transport.
    pub fn run(&mut self, firmware: &Firmware) -> Result<()> {
        self.phase = Phase::default();
        self.progress = Progress::new(0, firmware.len());
        self.device_id = None;

        self.flash(firmware).inspect_err(|error| {
            error!("Update failed in phase '{}': {error}", self.phase);
        })
    }

    fn flash(&mut self, firmware: &Firmware) -> Result<()> {
        let length =
            u32::try_from(firmware.len()).map_err(|_| Error::ImageTooLarge(firmware.len()))?;

        self.sync()?;
        info!("Synced with bootloader.");

        self.enter(Phase::RequestingUpdate);
        self.transport.send(Frame::opcode(Opcode::UpdateRequest))?;
        self.expect(Opcode::UpdateResponse)?;
        info!("Update request granted.");

        self.enter(Phase::AwaitingDeviceIdRequest);
        self.expect(Opcode::DeviceIdRequest)?;

        self.enter(Phase::SendingDeviceId);
        let device_id = firmware.device_id();
        info!("Responding with device ID {device_id:#04X}.");
        self.transport.send(Frame::new(&[
            Opcode::DeviceIdResponse.into(),
            device_id,
        ])?)?;
        self.device_id.replace(device_id);

        self.enter(Phase::AwaitingLengthRequest);
        self.expect(Opcode::LengthRequest)?;

        self.enter(Phase::SendingLength);
        let [b0, b1, b2, b3] = length.to_le_bytes();
        info!("Responding with firmware length {length}.");
        self.transport.send(Frame::new(&[
            Opcode::LengthResponse.into(),
            b0,
            b1,
            b2,
            b3,
        ])?)?;

        self.enter(Phase::Erasing);
        info!("Waiting {:?} for the application flash to be erased.", self.options.erase_delay);
        sleep(self.options.erase_delay);

        self.enter(Phase::Streaming);
        for chunk in firmware.chunks() {
            self.expect(Opcode::ReadyForData)?;
            self.transport.send(Frame::new(chunk)?)?;
            self.progress.written += chunk.len();
            info!("Wrote {} bytes ({}).", chunk.len(), self.progress);

            if let Some(callback) = &mut self.on_progress {
                callback(self.progress);
            }
        }

        self.enter(Phase::AwaitingSuccess);
        self.expect(Opcode::UpdateSuccessful)?;

        self.enter(Phase::Done);
        info!("Firmware update successful.");
        Ok(())
    }

    /// Sends the sync sequence every sync delay until the bootloader answers.
    fn sync(&mut self) -> Result<()> {
        self.enter(Phase::Syncing);
        let deadline = Instant::now() + self.options.sync_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());

            if remaining.is_zero() {
                return Err(Error::Timeout(self.options.sync_timeout));
            }

            self.transport.send_raw(&SYNC_SEQUENCE)?;

            match self
                .transport
                .await_next_frame(self.options.sync_delay.min(remaining))
            {
                Ok(frame) if frame.is_opcode(Opcode::SyncObserved) => return Ok(()),
                Ok(frame) => {
                    return Err(Error::UnexpectedFrame {
                        expected: Opcode::SyncObserved,
                        frame,
                    })
                }
                Err(Error::Timeout(_)) => debug!("No answer to sync sequence, retrying."),
                Err(error) => return Err(error),
            }
        }
    }

    fn expect(&self, expected: Opcode) -> Result<()> {
        let frame = self
            .transport
            .await_next_frame(self.options.response_timeout)?;

        if frame.is_opcode(expected) {
            Ok(())
        } else {
            Err(Error::UnexpectedFrame { expected, frame })
        }
    }
}

impl<T> Debug for Updater<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updater")
            .field("transport", &self.transport)
            .field("options", &self.options)
            .field("phase", &self.phase)
            .field("progress", &self.progress)
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}

use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, info, trace};

use super::Receiver;
use crate::error::Error;
use crate::utils::HexSlice;

/// Size of the chunks read from the byte stream.
const CHUNK_SIZE: usize = 64;

/// Thread feeding a [`Receiver`] with bytes read from a byte stream.
#[derive(Debug)]
pub struct Listener {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Listener {
    /// Spawns a thread reading from `reader` and feeding the bytes into `receiver`.
    ///
    /// Read timeouts are ignored. Any other read error stops the intake and is delivered
    /// to the transport.
    #[must_use]
    pub fn spawn<R, T>(reader: R, receiver: Receiver<T>) -> Self
    where
        R: Read + Send + 'static,
        T: Write + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let handle = thread::spawn({
            let running = running.clone();
            move || listen(reader, receiver, &running)
        });
        Self { running, handle }
    }

    /// Stops the listener and waits for its thread to finish.
    ///
    /// The thread notices the request after its current read returns.
    pub fn terminate(self) {
        self.running.store(false, Relaxed);

        if self.handle.join().is_err() {
            error!("Listener thread panicked.");
        }
    }
}

fn listen<R, T>(mut reader: R, mut receiver: Receiver<T>, running: &AtomicBool)
where
    R: Read,
    T: Write,
{
    let mut buffer = [0; CHUNK_SIZE];

    while running.load(Relaxed) {
        match reader.read(&mut buffer) {
            Ok(0) => {
                info!("Byte stream closed, listener exiting.");
                break;
            }
            Ok(size) => {
                trace!("Received bytes: {:#04X}", HexSlice::new(&buffer[..size]));

                if !receiver.feed(&buffer[..size]) {
                    debug!("Intake stopped, listener exiting.");
                    break;
                }
            }
            Err(error)
                if matches!(
                    error.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) => {}
            Err(error) => {
                error!("Error reading from byte stream: {error}");
                receiver.fail(Error::Io(error));
                break;
            }
        }
    }
}

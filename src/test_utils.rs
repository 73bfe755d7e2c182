//! Helpers for exercising the transport and the updater without a serial port.

use std::io::{self, Write};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::frame::Frame;
use crate::protocol::{Opcode, SYNC_SEQUENCE};
use crate::transport;

/// How long the simulated bootloader waits for the host.
const DEVICE_TIMEOUT: Duration = Duration::from_millis(2000);

/// How long the simulated bootloader listens after its script ended.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(200);

/// Writer that sends every write as one message through a channel.
#[derive(Debug)]
pub struct ChannelWriter(Sender<Vec<u8>>);

impl ChannelWriter {
    /// Creates a writer and the receiving end of its wire.
    pub fn new() -> (Self, Receiver<Vec<u8>>) {
        let (sender, receiver) = channel();
        (Self(sender), receiver)
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .send(buf.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "wire disconnected"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Drains all frames written to the wire so far.
pub fn collect_frames(wire: &Receiver<Vec<u8>>) -> Vec<Frame> {
    wire.try_iter()
        .map(|bytes| Frame::try_from(bytes.as_slice()).expect("Wire should carry whole frames."))
        .collect()
}

/// Behaviour of the simulated bootloader.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Script {
    /// Run the whole update.
    Complete,
    /// Send the given frame instead of the device ID request.
    ReplaceDeviceIdRequest(Frame),
    /// Answer the sync sequence with the given frame.
    ReplaceSyncObserved(Frame),
    /// Never answer the sync sequence.
    IgnoreSync,
    /// Corrupt the CRC of the first `READY_FOR_DATA` frame once.
    CorruptFirstReadyForData,
}

/// Everything the simulated bootloader observed.
#[derive(Debug, Default)]
pub struct Observed {
    /// Device ID response frame.
    pub device_id: Option<Frame>,
    /// Length response frame.
    pub length: Option<Frame>,
    /// Data frames in order of arrival.
    pub chunks: Vec<Frame>,
    /// All frames written by the host, in order.
    pub frames: Vec<Frame>,
}

/// Bootloader simulation talking to the host through a channel wire.
///
/// It plays the part of the serial port by feeding its answers into the host's intake.
pub struct Bootloader {
    wire: Receiver<Vec<u8>>,
    host: transport::Receiver<ChannelWriter>,
    script: Script,
    observed: Observed,
}

impl Bootloader {
    /// Creates a new simulated bootloader.
    pub fn new(
        wire: Receiver<Vec<u8>>,
        host: transport::Receiver<ChannelWriter>,
        script: Script,
    ) -> Self {
        Self {
            wire,
            host,
            script,
            observed: Observed::default(),
        }
    }

    /// Runs the bootloader side of the update.
    ///
    /// Returns what it observed once the script ends or the host stops talking.
    pub fn run(mut self) -> Observed {
        let _ = self.session();
        // Drain whatever the host still writes after the script ended.
        while let Some(frame) = self.next_frame_within(DRAIN_TIMEOUT) {
            self.observed.frames.push(frame);
        }
        self.observed
    }

    fn session(&mut self) -> Option<()> {
        self.await_sync()?;

        match self.script {
            Script::IgnoreSync => return None,
            Script::ReplaceSyncObserved(frame) => {
                self.send(frame);
                return None;
            }
            _ => self.send(Frame::opcode(Opcode::SyncObserved)),
        }

        self.expect(Frame::ACK)?;
        self.expect(Frame::opcode(Opcode::UpdateRequest))?;
        self.send(Frame::ACK);
        self.send(Frame::opcode(Opcode::UpdateResponse));
        self.expect(Frame::ACK)?;

        if let Script::ReplaceDeviceIdRequest(frame) = self.script {
            self.send(frame);
            return None;
        }

        self.request(Opcode::DeviceIdRequest)?;
        let device_id = self.receive_and_ack()?;
        self.observed.device_id.replace(device_id);

        self.request(Opcode::LengthRequest)?;
        let length = self.receive_and_ack()?;
        self.observed.length.replace(length);
        let payload = length.payload();
        let total = u32::from_le_bytes([payload[1], payload[2], payload[3], payload[4]]);

        let mut received = 0;
        let mut corrupt = self.script == Script::CorruptFirstReadyForData;

        while received < total {
            if corrupt {
                corrupt = false;
                let mut bytes = Frame::opcode(Opcode::ReadyForData).to_bytes();
                bytes[Frame::SIZE - 1] ^= 0xFF;
                self.host.feed(&bytes);
                self.expect(Frame::RETX)?;
            }

            self.request(Opcode::ReadyForData)?;
            let chunk = self.receive_and_ack()?;
            received += u32::from(chunk.length());
            self.observed.chunks.push(chunk);
        }

        self.request(Opcode::UpdateSuccessful)
    }

    /// Sends a request and waits for the host's acknowledgement.
    fn request(&mut self, opcode: Opcode) -> Option<()> {
        self.send(Frame::opcode(opcode));
        self.expect(Frame::ACK)
    }

    fn receive_and_ack(&mut self) -> Option<Frame> {
        let frame = self.next_frame()?;
        self.observed.frames.push(frame);
        self.send(Frame::ACK);
        Some(frame)
    }

    fn expect(&mut self, expected: Frame) -> Option<()> {
        let frame = self.next_frame()?;
        self.observed.frames.push(frame);
        (frame == expected).then_some(())
    }

    fn send(&mut self, frame: Frame) {
        self.host.feed(&frame.to_bytes());
    }

    fn await_sync(&mut self) -> Option<()> {
        match self.wire.recv_timeout(DEVICE_TIMEOUT) {
            Ok(bytes) if bytes == SYNC_SEQUENCE => Some(()),
            Ok(bytes) => panic!("Expected sync sequence, got {bytes:02X?}"),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    fn next_frame(&mut self) -> Option<Frame> {
        self.next_frame_within(DEVICE_TIMEOUT)
    }

    /// Returns the next frame from the host, skipping repeated sync sequences.
    fn next_frame_within(&mut self, timeout: Duration) -> Option<Frame> {
        loop {
            let bytes = self.wire.recv_timeout(timeout).ok()?;

            if bytes == SYNC_SEQUENCE {
                continue;
            }

            return Some(Frame::try_from(bytes.as_slice()).expect("Host should write whole frames."));
        }
    }
}

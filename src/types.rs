//! Common types used in the packet protocol implementation.

use crate::frame::Frame;

/// A stack-allocated buffer that holds the bytes of exactly one frame.
pub type RawFrame = heapless::Vec<u8, { Frame::SIZE }>;

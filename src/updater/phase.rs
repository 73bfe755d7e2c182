use std::fmt::{Display, Formatter};

/// Phase of a firmware update session.
///
/// Phases are passed strictly in declaration order.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Phase {
    /// Sending the sync sequence until the bootloader answers.
    #[default]
    Syncing,
    /// Asking the bootloader to start an update.
    RequestingUpdate,
    /// Waiting for the bootloader to ask for the device ID.
    AwaitingDeviceIdRequest,
    /// Sending the device ID of the image.
    SendingDeviceId,
    /// Waiting for the bootloader to ask for the image length.
    AwaitingLengthRequest,
    /// Sending the image length.
    SendingLength,
    /// Waiting for the bootloader to erase the application flash.
    Erasing,
    /// Sending the image chunk by chunk.
    Streaming,
    /// Waiting for the bootloader to confirm the update.
    AwaitingSuccess,
    /// The update has completed.
    Done,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syncing => write!(f, "Syncing"),
            Self::RequestingUpdate => write!(f, "Requesting update"),
            Self::AwaitingDeviceIdRequest => write!(f, "Awaiting device ID request"),
            Self::SendingDeviceId => write!(f, "Sending device ID"),
            Self::AwaitingLengthRequest => write!(f, "Awaiting length request"),
            Self::SendingLength => write!(f, "Sending length"),
            Self::Erasing => write!(f, "Erasing"),
            Self::Streaming => write!(f, "Streaming"),
            Self::AwaitingSuccess => write!(f, "Awaiting success"),
            Self::Done => write!(f, "Done"),
        }
    }
}

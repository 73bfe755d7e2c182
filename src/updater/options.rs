use std::time::Duration;

use crate::transport::DEFAULT_TIMEOUT;

/// Interval between two sync sequences.
pub const DEFAULT_SYNC_DELAY: Duration = Duration::from_millis(500);

/// Time the bootloader is given to erase the application flash.
pub const DEFAULT_ERASE_DELAY: Duration = Duration::from_millis(3000);

/// Timing of an update session.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Options {
    /// Interval between two sync sequences.
    pub sync_delay: Duration,
    /// Time after which syncing is given up.
    pub sync_timeout: Duration,
    /// Time to wait for each bootloader frame.
    pub response_timeout: Duration,
    /// Time to wait after sending the image length.
    pub erase_delay: Duration,
}

impl Options {
    /// Sets the interval between two sync sequences.
    #[must_use]
    pub const fn with_sync_delay(mut self, sync_delay: Duration) -> Self {
        self.sync_delay = sync_delay;
        self
    }

    /// Sets the time after which syncing is given up.
    #[must_use]
    pub const fn with_sync_timeout(mut self, sync_timeout: Duration) -> Self {
        self.sync_timeout = sync_timeout;
        self
    }

    /// Sets the time to wait for each bootloader frame.
    #[must_use]
    pub const fn with_response_timeout(mut self, response_timeout: Duration) -> Self {
        self.response_timeout = response_timeout;
        self
    }

    /// Sets the time to wait for the flash to be erased.
    #[must_use]
    pub const fn with_erase_delay(mut self, erase_delay: Duration) -> Self {
        self.erase_delay = erase_delay;
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sync_delay: DEFAULT_SYNC_DELAY,
            sync_timeout: DEFAULT_TIMEOUT,
            response_timeout: DEFAULT_TIMEOUT,
            erase_delay: DEFAULT_ERASE_DELAY,
        }
    }
}

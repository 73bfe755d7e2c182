use std::fmt::{Display, Formatter};

/// Amount of the image transferred so far.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Progress {
    /// Bytes sent to the bootloader.
    pub written: usize,
    /// Total image length.
    pub total: usize,
}

impl Progress {
    /// Creates a new progress of `written` out of `total` bytes.
    #[must_use]
    pub const fn new(written: usize, total: usize) -> Self {
        Self { written, total }
    }

    /// Determines whether the whole image has been sent.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.written >= self.total
    }

    /// Returns the progress in percent.
    #[must_use]
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 100.0;
        }

        self.written as f32 * 100.0 / self.total as f32
    }
}

impl Display for Progress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.written, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::Progress;

    #[test]
    fn test_percent() {
        assert!((Progress::new(16, 64).percent() - 25.0).abs() < f32::EPSILON);
        assert!((Progress::new(0, 0).percent() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_is_complete() {
        assert!(!Progress::new(32, 37).is_complete());
        assert!(Progress::new(37, 37).is_complete());
    }

    #[test]
    fn test_to_string() {
        assert_eq!(Progress::new(32, 37).to_string(), "32/37");
    }
}

use std::fmt::{LowerHex, UpperHex};

/// A wrapper around a slice of bytes to format it with hexadecimal bytes.
pub struct HexSlice<'a>(&'a [u8]);

impl<'a> HexSlice<'a> {
    /// Creates a new `HexSlice` from a slice of bytes.
    #[must_use]
    pub const fn new(slice: &'a [u8]) -> Self {
        Self(slice)
    }

    /// Writes the bytes with the given formatter function between brackets.
    fn fmt_with(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        fmt_byte: fn(&u8, &mut std::fmt::Formatter<'_>) -> std::fmt::Result,
    ) -> std::fmt::Result {
        write!(f, "[")?;

        for (index, byte) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }

            fmt_byte(byte, f)?;
        }

        write!(f, "]")
    }
}

impl<'a> From<&'a [u8]> for HexSlice<'a> {
    fn from(slice: &'a [u8]) -> Self {
        Self::new(slice)
    }
}

impl UpperHex for HexSlice<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_with(f, <u8 as UpperHex>::fmt)
    }
}

impl LowerHex for HexSlice<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_with(f, <u8 as LowerHex>::fmt)
    }
}

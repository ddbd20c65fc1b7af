//! Value truncation for the logged canonical string.
//!
//! Only the log rendering is abbreviated. The signed string always carries the
//! full value.

use std::borrow::Cow;

/// Default maximum length, in characters, of a logged value.
pub const DEFAULT_MAX_LEN: usize = 100;

/// Suffix marking a truncated value.
const MARKER: &str = "...";

/// Caps logged values at a fixed number of characters.
///
/// A truncated value keeps its first `max_len - 3` characters followed by
/// `...`, so the result is exactly `max_len` characters long.
///
/// # Examples
///
/// ```
/// use restsign_auth::Abbreviation;
///
/// let abbreviation = Abbreviation::new(8);
/// assert_eq!(abbreviation.apply("short"), "short");
/// assert_eq!(abbreviation.apply("0123456789"), "01234...");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abbreviation {
    max_len: usize,
}

impl Abbreviation {
    /// Create a policy with the given cap. Caps below 4 are raised to 4.
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(MARKER.len() + 1),
        }
    }

    /// The effective cap in characters.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Abbreviate `value` if it exceeds the cap.
    #[must_use]
    pub fn apply<'a>(&self, value: &'a str) -> Cow<'a, str> {
        // Byte length bounds the char count from above.
        if value.len() <= self.max_len || value.chars().count() <= self.max_len {
            return Cow::Borrowed(value);
        }

        let keep = self.max_len - MARKER.len();
        let end = value
            .char_indices()
            .nth(keep)
            .map_or(value.len(), |(idx, _)| idx);

        let mut abbreviated = String::with_capacity(end + MARKER.len());
        abbreviated.push_str(&value[..end]);
        abbreviated.push_str(MARKER);
        Cow::Owned(abbreviated)
    }
}

impl Default for Abbreviation {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEN)
    }
}

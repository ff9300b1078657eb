use bitflags::bitflags;

bitflags! {
    /// Switches steering field classification and the sampling driver.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DetectFlags: u32 {
        /// Treat the first data line as a header row.
        const HAS_HEADER = 1 << 0;
        /// Treat the first data line as data and synthesize column names.
        const NO_HEADER = 1 << 1;
        /// Skip empty lines instead of recording them as single-column rows.
        const SKIP_EMPTY_LINES = 1 << 2;
        /// Require every data line to match the first line's field count.
        const FIXED_COLUMNS = 1 << 3;
        /// Caller expects signed integer columns.
        const SIGNED_INTEGERS = 1 << 4;
        /// Caller expects unsigned integer columns.
        const UNSIGNED_INTEGERS = 1 << 5;
        /// "true"/"false" classify as boolean.
        const TRUE_FALSE_BOOLEANS = 1 << 6;
        /// "yes"/"no" classify as boolean.
        const YES_NO_BOOLEANS = 1 << 7;
        /// "0"/"1" classify as boolean.
        const INTEGER_BOOLEANS = 1 << 8;

        const ANY_INTEGER = Self::SIGNED_INTEGERS.bits() | Self::UNSIGNED_INTEGERS.bits();
        const ANY_BOOLEAN = Self::TRUE_FALSE_BOOLEANS.bits()
            | Self::YES_NO_BOOLEANS.bits()
            | Self::INTEGER_BOOLEANS.bits();
    }
}

impl Default for DetectFlags {
    /// Header detection left to the heuristic, empty lines skipped, both
    /// integer families and the word-token boolean families enabled.
    /// `INTEGER_BOOLEANS` stays opt-in: by default "0"/"1" are integers.
    fn default() -> Self {
        Self::SKIP_EMPTY_LINES
            | Self::ANY_INTEGER
            | Self::TRUE_FALSE_BOOLEANS
            | Self::YES_NO_BOOLEANS
    }
}

/// Resolved header handling for the first data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// Decide from the line contents.
    Detect,
    HasHeader,
    NoHeader,
}

impl DetectFlags {
    /// Collapses the two header bits; `HAS_HEADER` wins when both are set.
    pub fn header_mode(self) -> HeaderMode {
        if self.contains(Self::HAS_HEADER) {
            HeaderMode::HasHeader
        } else if self.contains(Self::NO_HEADER) {
            HeaderMode::NoHeader
        } else {
            HeaderMode::Detect
        }
    }

    pub fn skip_empty_lines(self) -> bool {
        self.contains(Self::SKIP_EMPTY_LINES)
    }

    pub fn fixed_columns(self) -> bool {
        self.contains(Self::FIXED_COLUMNS)
    }
}

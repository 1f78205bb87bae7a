//! Animation definitions and their row format.
//!
//! A definition is a sequence of text rows, one frame per row:
//! `v1,v2,...,vk[,]` where `k` must be one of the supported frame widths.

use core::fmt;

use crate::frame::Frame;

/// Which family of definitions a name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// One-shot notification pattern
    Notification,
    /// Looping ringtone pattern
    Call,
}

/// Supplies animation definitions by name
pub trait AnimationSource {
    /// Lazy sequence of rows of one definition
    type Rows<'a>: Iterator<Item = &'a str>
    where
        Self: 'a;

    /// Open a definition, `None` if it does not exist
    fn rows(&self, name: &str, kind: PatternKind) -> Option<Self::Rows<'_>>;
}

/// Why a row was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowError {
    /// Field count is not one of the supported frame widths
    UnsupportedLength(usize),
    /// A field is not a brightness number
    InvalidValue,
    /// Supported width, but larger than the frame buffer
    TooLong,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedLength(len) => write!(f, "unsupported frame length {len}"),
            Self::InvalidValue => f.write_str("invalid brightness value"),
            Self::TooLong => f.write_str("frame exceeds buffer size"),
        }
    }
}

/// Parse one definition row into a frame
pub fn parse_row(line: &str, supported: &[usize]) -> Result<Frame, RowError> {
    let line = line.trim();
    let line = line.strip_suffix(',').unwrap_or(line);
    // Empty trailing fields do not count
    let line = line.trim_end_matches([',', ' ']);

    let len = if line.is_empty() {
        0
    } else {
        line.split(',').count()
    };
    if !supported.contains(&len) {
        return Err(RowError::UnsupportedLength(len));
    }

    let mut frame = Frame::new();
    for field in line.split(',') {
        let value = field.trim().parse().map_err(|_| RowError::InvalidValue)?;
        frame.push(value).map_err(|_| RowError::TooLong)?;
    }
    Ok(frame)
}

/// Named definition backed by a static CSV body
#[derive(Debug, Clone, Copy)]
pub struct PatternEntry {
    pub name: &'static str,
    pub kind: PatternKind,
    pub csv: &'static str,
}

impl PatternEntry {
    pub const fn notification(name: &'static str, csv: &'static str) -> Self {
        Self {
            name,
            kind: PatternKind::Notification,
            csv,
        }
    }

    pub const fn call(name: &'static str, csv: &'static str) -> Self {
        Self {
            name,
            kind: PatternKind::Call,
            csv,
        }
    }
}

/// Table of definitions compiled into the firmware
#[derive(Debug, Clone, Copy)]
pub struct StaticAnimations<'e> {
    entries: &'e [PatternEntry],
}

impl<'e> StaticAnimations<'e> {
    pub const fn new(entries: &'e [PatternEntry]) -> Self {
        Self { entries }
    }
}

impl AnimationSource for StaticAnimations<'_> {
    type Rows<'a>
        = core::str::Lines<'a>
    where
        Self: 'a;

    fn rows(&self, name: &str, kind: PatternKind) -> Option<Self::Rows<'_>> {
        self.entries
            .iter()
            .find(|entry| entry.kind == kind && entry.name == name)
            .map(|entry| entry.csv.lines())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPPORTED: &[usize] = &[5, 33];

    #[test]
    fn test_parse_row_tolerates_spaces_and_trailing_separator() {
        let frame = parse_row(" 0, 4000 ,0,12, 7, ", SUPPORTED).unwrap();
        assert_eq!(frame.as_slice(), &[0, 4000, 0, 12, 7]);
    }

    #[test]
    fn test_parse_row_rejects_unsupported_length() {
        assert_eq!(
            parse_row("1,2,3", SUPPORTED),
            Err(RowError::UnsupportedLength(3))
        );
        assert_eq!(parse_row("", SUPPORTED), Err(RowError::UnsupportedLength(0)));
    }

    #[test]
    fn test_parse_row_rejects_garbage() {
        assert_eq!(parse_row("1,2,x,4,5", SUPPORTED), Err(RowError::InvalidValue));
        assert_eq!(parse_row("1,,3,4,5", SUPPORTED), Err(RowError::InvalidValue));
    }

    #[test]
    fn test_static_animations_lookup() {
        const ENTRIES: &[PatternEntry] = &[
            PatternEntry::notification("pulse", "1,2,3,4,5\n5,4,3,2,1"),
            PatternEntry::call("pulse", "0,0,0,0,0"),
        ];
        let source = StaticAnimations::new(ENTRIES);
        assert_eq!(source.rows("pulse", PatternKind::Notification).map(Iterator::count), Some(2));
        assert_eq!(source.rows("pulse", PatternKind::Call).map(Iterator::count), Some(1));
        assert!(source.rows("missing", PatternKind::Notification).is_none());
    }
}

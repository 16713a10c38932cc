//! Parsing of Unicode range expressions, such as `U+0000-00FF,U+0131`.

use core::{fmt, ops::RangeInclusive, str::FromStr};
use std::collections::BTreeSet;

use crate::errors::{RangeError, RangeErrorKind};

/// Set of Unicode code points described by a list of ranges, in the syntax used by
/// the CSS `unicode-range` descriptor.
///
/// Items are separated by commas and / or whitespace. Each item is a single code point (`U+0131`),
/// a range (`U+0000-00FF`), or a code point with trailing wildcards (`U+4??`, equivalent to
/// `U+400-4FF`). The `U+` prefix is case-insensitive and optional.
///
/// # Examples
///
/// ```
/// # use font_subset::UnicodeRanges;
/// let ranges: UnicodeRanges = "U+0041-0043, U+1F60?".parse()?;
/// assert!(ranges.contains('B'));
/// assert!(ranges.contains('\u{1f60a}'));
/// assert_eq!(ranges.to_char_set().len(), 3 + 16);
/// # Ok::<_, font_subset::RangeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnicodeRanges {
    ranges: Vec<RangeInclusive<u32>>,
}

impl UnicodeRanges {
    const MAX_CODE_POINT: u32 = 0x10_ffff;
    const MAX_DIGITS: usize = 6;

    /// Parses ranges from the provided expression.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the items in the expression is malformed.
    pub fn parse(expr: &str) -> Result<Self, RangeError> {
        let mut ranges = vec![];
        for group in expr.split(',') {
            let mut items = group.split_whitespace().peekable();
            if items.peek().is_none() {
                return Err(RangeError {
                    item: group.to_owned(),
                    kind: RangeErrorKind::Empty,
                });
            }
            for item in items {
                let range = Self::parse_item(item).map_err(|kind| RangeError {
                    item: item.to_owned(),
                    kind,
                })?;
                ranges.push(range);
            }
        }
        Ok(Self { ranges })
    }

    fn parse_item(item: &str) -> Result<RangeInclusive<u32>, RangeErrorKind> {
        let item = item
            .strip_prefix("U+")
            .or_else(|| item.strip_prefix("u+"))
            .unwrap_or(item);

        if let Some((start, end)) = item.split_once('-') {
            if start.contains('?') || end.contains('?') {
                return Err(RangeErrorKind::WildcardInRange);
            }
            let start = Self::parse_code_point(start)?;
            let end = Self::parse_code_point(end)?;
            if start > end {
                return Err(RangeErrorKind::Reversed { start, end });
            }
            Ok(start..=end)
        } else if let Some(digits) = item.strip_suffix('?') {
            let digits = digits.trim_end_matches('?');
            let wildcard_count = item.len() - digits.len();
            if item.len() > Self::MAX_DIGITS {
                return Err(RangeErrorKind::InvalidHex);
            }
            let prefix = if digits.is_empty() {
                0
            } else {
                Self::parse_hex(digits)?
            };
            let shift = 4 * u32::try_from(wildcard_count).map_err(|_| RangeErrorKind::InvalidHex)?;
            let start = prefix << shift;
            if start > Self::MAX_CODE_POINT {
                return Err(RangeErrorKind::OutOfBounds(start));
            }
            let end = (start | ((1 << shift) - 1)).min(Self::MAX_CODE_POINT);
            Ok(start..=end)
        } else {
            let code_point = Self::parse_code_point(item)?;
            Ok(code_point..=code_point)
        }
    }

    fn parse_hex(digits: &str) -> Result<u32, RangeErrorKind> {
        let is_valid = (1..=Self::MAX_DIGITS).contains(&digits.len())
            && digits.bytes().all(|byte| byte.is_ascii_hexdigit());
        if !is_valid {
            return Err(RangeErrorKind::InvalidHex);
        }
        u32::from_str_radix(digits, 16).map_err(|_| RangeErrorKind::InvalidHex)
    }

    fn parse_code_point(digits: &str) -> Result<u32, RangeErrorKind> {
        let value = Self::parse_hex(digits)?;
        if value > Self::MAX_CODE_POINT {
            return Err(RangeErrorKind::OutOfBounds(value));
        }
        Ok(value)
    }

    /// Returns the parsed ranges in the order they were specified.
    pub fn ranges(&self) -> &[RangeInclusive<u32>] {
        &self.ranges
    }

    /// Checks whether the specified char is covered by these ranges.
    pub fn contains(&self, ch: char) -> bool {
        let ch = u32::from(ch);
        self.ranges.iter().any(|range| range.contains(&ch))
    }

    /// Expands ranges into a set of chars. Surrogate code points (`U+D800-DFFF`) are not chars
    /// and are skipped.
    pub fn to_char_set(&self) -> BTreeSet<char> {
        self.ranges
            .iter()
            .flat_map(|range| range.clone().filter_map(char::from_u32))
            .collect()
    }
}

impl FromStr for UnicodeRanges {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UnicodeRanges {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                formatter.write_str(",")?;
            }
            if range.start() == range.end() {
                write!(formatter, "U+{:04X}", range.start())?;
            } else {
                write!(formatter, "U+{:04X}-{:04X}", range.start(), range.end())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_casing::test_casing;

    use super::*;

    #[test]
    fn parsing_ranges() {
        let ranges = UnicodeRanges::parse("U+0000-00FF,U+0131,U+0152-0153").unwrap();
        assert_eq!(ranges.ranges(), [0..=0xff, 0x131..=0x131, 0x152..=0x153]);
        assert_eq!(ranges.to_char_set().len(), 256 + 1 + 2);
        assert_eq!(ranges.to_string(), "U+0000-00FF,U+0131,U+0152-0153");
    }

    #[test]
    fn parsing_ranges_with_whitespace_and_lowercase() {
        let ranges = UnicodeRanges::parse("u+41-5a, 61 U+1f600").unwrap();
        assert_eq!(ranges.ranges(), [0x41..=0x5a, 0x61..=0x61, 0x1_f600..=0x1_f600]);
        assert!(ranges.contains('Q'));
        assert!(ranges.contains('a'));
        assert!(!ranges.contains('b'));
    }

    #[test]
    fn parsing_wildcards() {
        let ranges = UnicodeRanges::parse("U+4??,U+10????").unwrap();
        assert_eq!(ranges.ranges(), [0x400..=0x4ff, 0x10_0000..=0x10_ffff]);
        let ranges = UnicodeRanges::parse("U+??????").unwrap();
        assert_eq!(ranges.ranges(), [0..=0x10_ffff]);
    }

    #[test]
    fn surrogates_are_not_expanded() {
        let ranges = UnicodeRanges::parse("U+D7FF-E000").unwrap();
        let chars = ranges.to_char_set();
        assert_eq!(chars.into_iter().collect::<Vec<_>>(), ['\u{d7ff}', '\u{e000}']);
    }

    #[test_casing(9, [
        ("", RangeErrorKind::Empty),
        ("U+0041,", RangeErrorKind::Empty),
        ("U+", RangeErrorKind::InvalidHex),
        ("U+00G1", RangeErrorKind::InvalidHex),
        ("U++41", RangeErrorKind::InvalidHex),
        ("U+1234567", RangeErrorKind::InvalidHex),
        ("U+0100-00FF", RangeErrorKind::Reversed { start: 0x100, end: 0xff }),
        ("U+110000", RangeErrorKind::OutOfBounds(0x11_0000)),
        ("U+4?-4FF", RangeErrorKind::WildcardInRange),
    ])]
    fn invalid_ranges(expr: &str, expected: RangeErrorKind) {
        let err = UnicodeRanges::parse(expr).unwrap_err();
        assert_eq!(*err.kind(), expected);
    }

    #[test]
    fn error_display_names_the_item() {
        let err = UnicodeRanges::parse("U+0041, U+XYZ").unwrap_err();
        assert_eq!(err.item(), "U+XYZ");
        assert_eq!(
            err.to_string(),
            "invalid range item `U+XYZ`: expected 1 to 6 hexadecimal digits"
        );
    }
}

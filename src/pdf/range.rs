//! Page range selections such as `1-3, 5, 8-10`

use std::fmt;
use std::str::FromStr;

use nom::{
    character::complete::{char, digit1, space0},
    IResult,
};

use crate::error::ConfigError;

/// An inclusive, 1-based span of pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn single(page: u32) -> Self {
        Self::new(page, page)
    }

    pub fn contains(&self, page: u32) -> bool {
        (self.start..=self.end).contains(&page)
    }

    /// Restrict to a document with `page_count` pages; `None` if nothing is left
    pub fn clip(&self, page_count: u32) -> Option<PageRange> {
        if self.start > page_count {
            return None;
        }
        Some(PageRange::new(self.start, self.end.min(page_count)))
    }

    /// Suffix used in output file names
    pub fn label(&self) -> String {
        if self.start == self.end {
            format!("p{}", self.start)
        } else {
            format!("p{}-{}", self.start, self.end)
        }
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A comma-separated list of page ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection(pub Vec<PageRange>);

impl PageSelection {
    pub fn ranges(&self) -> &[PageRange] {
        &self.0
    }
}

impl FromStr for PageSelection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_page_ranges(s).map(PageSelection)
    }
}

fn page_number(input: &str) -> IResult<&str, u32> {
    let (rest, digits) = digit1(input)?;
    let page = digits.parse::<u32>().map_err(|_| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
    })?;
    Ok((rest, page))
}

/// Parse `N` or `N-M`, with optional surrounding spaces
fn page_range(input: &str) -> IResult<&str, PageRange> {
    let (input, _) = space0(input)?;
    let (input, start) = page_number(input)?;
    let (input, _) = space0(input)?;

    let dash: IResult<&str, char> = char('-')(input);
    let (input, end) = match dash {
        Ok((rest, _)) => {
            let (rest, _) = space0(rest)?;
            page_number(rest)?
        }
        Err(_) => (input, start),
    };

    let (input, _) = space0(input)?;
    Ok((input, PageRange::new(start, end)))
}

/// Parse a page range specification
pub fn parse_page_ranges(spec: &str) -> Result<Vec<PageRange>, ConfigError> {
    let invalid = || ConfigError::InvalidPageRange(spec.trim().to_string());
    let mut ranges = Vec::new();
    let mut remaining = spec;

    loop {
        let (rest, range) = page_range(remaining).map_err(|_| invalid())?;
        if range.start == 0 || range.start > range.end {
            return Err(invalid());
        }
        ranges.push(range);

        let comma: IResult<&str, char> = char(',')(rest);
        match comma {
            Ok((rest, _)) => remaining = rest,
            Err(_) if rest.is_empty() => break,
            Err(_) => return Err(invalid()),
        }
    }

    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page() {
        assert_eq!(parse_page_ranges("5").unwrap(), vec![PageRange::single(5)]);
    }

    #[test]
    fn test_mixed_ranges() {
        let ranges = parse_page_ranges("1-3, 7 ,10 - 12").unwrap();
        assert_eq!(
            ranges,
            vec![
                PageRange::new(1, 3),
                PageRange::single(7),
                PageRange::new(10, 12)
            ]
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        for spec in ["", "0", "3-1", "1,,2", "a", "1-", "1;2", "2,"] {
            assert!(parse_page_ranges(spec).is_err(), "accepted {:?}", spec);
        }
    }

    #[test]
    fn test_clip_and_label() {
        assert_eq!(PageRange::new(2, 9).clip(4), Some(PageRange::new(2, 4)));
        assert_eq!(PageRange::new(5, 9).clip(4), None);
        assert_eq!(PageRange::single(3).label(), "p3");
        assert_eq!(PageRange::new(1, 3).label(), "p1-3");
        assert_eq!(PageRange::new(1, 3).to_string(), "1-3");
    }

    #[test]
    fn test_selection_from_str() {
        let selection: PageSelection = "2-4".parse().unwrap();
        assert_eq!(selection.ranges(), &[PageRange::new(2, 4)]);
    }
}

use crate::error::{IoError, IoResult};
use regex::Regex;
use std::sync::OnceLock;

/// A rectangular, 1-based, inclusive block of spreadsheet cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub from_row: usize,
    pub from_col: usize,
    pub to_row: usize,
    pub to_col: usize,
}

/// Convert a column label such as `A`, `Z` or `AB` to its 1-based number.
pub fn column_number(label: &str) -> Option<usize> {
    if label.is_empty() {
        return None;
    }
    label.chars().try_fold(0usize, |acc, ch| {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

/// Parse an `A1:C10` style range. Column labels are case-insensitive.
pub fn parse_range(range: &str) -> IoResult<CellRange> {
    static RANGE_RE: OnceLock<Regex> = OnceLock::new();
    let re = RANGE_RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z]+)(\d+):([A-Za-z]+)(\d+)$").expect("valid regex")
    });

    let invalid = || IoError::InvalidRange(range.to_string());
    let caps = re.captures(range.trim()).ok_or_else(invalid)?;
    let number = |i: usize| caps[i].parse::<usize>().ok().filter(|&n| n > 0);

    let out = CellRange {
        from_col: column_number(&caps[1]).ok_or_else(invalid)?,
        from_row: number(2).ok_or_else(invalid)?,
        to_col: column_number(&caps[3]).ok_or_else(invalid)?,
        to_row: number(4).ok_or_else(invalid)?,
    };
    if out.to_row < out.from_row || out.to_col < out.from_col {
        return Err(invalid());
    }
    Ok(out)
}

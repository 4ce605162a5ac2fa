//! Per-cell type coercion.
//!
//! Each function turns one loosely-typed [`Cell`] into a typed value, or
//! `None` if the cell can't be read as that type. Failure is never an error:
//! a bad cell just becomes null.

use chrono::NaiveDate;
use regex::Regex;

use std::sync::LazyLock;

use crate::table::Cell;

/// `31/12/2024`, `01.01.2025`, `1-2-25`, optionally followed by a time.
static DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[./-](\d{1,2})[./-](\d{4}|\d{2})(?:[ T].*)?$").unwrap()
});

/// `2025-01-31`, `2025/01/31`, optionally followed by a time.
static YEAR_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[./-](\d{1,2})[./-](\d{1,2})(?:[ T].*)?$").unwrap());

/// Reads a cell as a calendar date, assuming day-before-month ordering.
///
/// Year-first strings are read as year, month, day. For other numeric dates
/// the day comes first; if that gives an impossible date (such as
/// `12/31/2024`) month-first is tried instead. Two-digit years 00-68 are
/// in the 2000s and 69-99 in the 1900s.
///
/// # Examples
///
/// ```
/// # use chrono::NaiveDate;
/// # use revenue_report::{coerce::parse_date, Cell};
/// assert_eq!(
///     parse_date(&Cell::from("02.01.2025")),
///     NaiveDate::from_ymd_opt(2025, 1, 2)
/// );
/// assert_eq!(parse_date(&Cell::from("not a date")), None);
/// ```
#[must_use]
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Text(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    if let Some(caps) = YEAR_FIRST.captures(s) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    let caps = DAY_FIRST.captures(s)?;
    let first: u32 = caps[1].parse().ok()?;
    let second: u32 = caps[2].parse().ok()?;
    let year = expand_year(&caps[3])?;
    NaiveDate::from_ymd_opt(year, second, first)
        .or_else(|| NaiveDate::from_ymd_opt(year, first, second))
}

fn expand_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    Some(match (s.len(), year) {
        (2, 0..=68) => 2000 + year,
        (2, _) => 1900 + year,
        _ => year,
    })
}

/// Reads a cell as a number.
///
/// Numbers pass through, text is trimmed and parsed, booleans count as 1 or
/// 0. Empty cells, dates, unparseable text and NaN all give `None`.
#[must_use]
pub fn parse_number(cell: &Cell) -> Option<f64> {
    let n = match cell {
        Cell::Number(n) => *n,
        Cell::Bool(b) => f64::from(u8::from(*b)),
        Cell::Text(s) => s.trim().parse().ok()?,
        Cell::Empty | Cell::Date(_) => return None,
    };
    (!n.is_nan()).then_some(n)
}

/// Reads a cell as a label (for grouping), with empty or blank cells as
/// `None`.
#[must_use]
pub fn parse_label(cell: &Cell) -> Option<String> {
    match cell {
        _ if cell.is_empty() => None,
        Cell::Number(n) if n.is_nan() => None,
        other => Some(other.to_string()),
    }
}

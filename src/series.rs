//! Turns the flat cell stream of a rate page into one currency's series.
//!
//! The page lists one fixing per row as `(date, time, rate)` cells, newest
//! first. Only the leading calendar month is kept.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

const CELLS_PER_ROW: usize = 3;
const DATE_OFFSET: usize = 0;
const RATE_OFFSET: usize = 2;

#[derive(Error, Debug, PartialEq)]
pub enum SeriesError {
    #[error("Feed for {0} contains no date cells")]
    EmptyFeed(String),

    #[error("Date cell has no month field: {0}")]
    InvalidDate(String),

    #[error("No rate cell for date {date} (entry {index})")]
    MissingRate { index: usize, date: String },

    #[error("Failed to parse number: {0}")]
    InvalidNumber(String),
}

/// One currency's rates for the leading month of its feed.
///
/// `dates`, `rates` and `changes` always have the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencySeries {
    pub symbol: String,
    pub dates: Vec<String>,
    pub rates: Vec<f64>,
    /// Difference to the previous fixing; `None` when the feed ends first
    pub changes: Vec<Option<f64>>,
}

impl CurrencySeries {
    #[instrument(skip(cells), fields(cell_count = cells.len()))]
    pub fn from_cells(symbol: &str, cells: &[String]) -> Result<Self, SeriesError> {
        let dates: Vec<&String> = cells.iter().skip(DATE_OFFSET).step_by(CELLS_PER_ROW).collect();
        let rate_cells: Vec<&String> = cells.iter().skip(RATE_OFFSET).step_by(CELLS_PER_ROW).collect();

        let first = dates
            .first()
            .ok_or_else(|| SeriesError::EmptyFeed(symbol.to_string()))?;
        if month_field(first).is_none() {
            return Err(SeriesError::InvalidDate(first.to_string()));
        }

        let days = window_len(&dates[..]);
        debug!(
            "{}: {} dates, {} rates, window of {} days",
            symbol,
            dates.len(),
            rate_cells.len(),
            days
        );

        if rate_cells.len() < days {
            let index = rate_cells.len();
            return Err(SeriesError::MissingRate {
                index,
                date: dates[index].to_string(),
            });
        }

        // One rate past the window is needed for the last change
        let available = rate_cells.len().min(days + 1);
        let all_rates = rate_cells[..available]
            .iter()
            .map(|cell| parse_decimal(cell))
            .collect::<Result<Vec<f64>, _>>()?;

        let changes: Vec<Option<f64>> = (0..days)
            .map(|i| all_rates.get(i + 1).map(|previous| all_rates[i] - previous))
            .collect();

        if changes.last().is_some_and(Option::is_none) {
            warn!("{}: feed ends inside the month, last change left empty", symbol);
        }

        Ok(Self {
            symbol: symbol.to_string(),
            dates: dates[..days].iter().map(|d| d.to_string()).collect(),
            rates: all_rates[..days].to_vec(),
            changes,
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Parse a rate written with either `,` or `.` as the decimal separator.
///
/// ```
/// use currency_report::series::parse_decimal;
///
/// assert_eq!(parse_decimal("81,2543").unwrap(), 81.2543);
/// assert_eq!(parse_decimal("1 081,50").unwrap(), 1081.5);
/// ```
pub fn parse_decimal(text: &str) -> Result<f64, SeriesError> {
    let normalized: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    normalized
        .parse::<f64>()
        .map_err(|_| SeriesError::InvalidNumber(text.to_string()))
}

/// Month part of a `dd.mm[.yyyy]` date
pub fn month_field(date: &str) -> Option<&str> {
    date.trim().split('.').nth(1)
}

/// Number of leading dates in the same month as the first one
pub fn window_len<S: AsRef<str>>(dates: &[S]) -> usize {
    let Some(first) = dates.first().and_then(|d| month_field(d.as_ref())) else {
        return 0;
    };

    dates
        .iter()
        .take_while(|d| month_field(d.as_ref()) == Some(first))
        .count()
}

/// Parse a `dd.mm.yyyy` feed date
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%d.%m.%Y").ok()
}

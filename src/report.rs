//! Two-currency report: row composition and spreadsheet output

pub mod workbook;

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::fetch_error::FetchError;
use crate::fetcher::QuoteFetcher;
use crate::series::{CurrencySeries, SeriesError};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to fetch quotes: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to align series: {0}")]
    Series(#[from] SeriesError),

    #[error("Series lengths differ: {first} has {first_len} days, {second} has {second_len}")]
    LengthMismatch {
        first: String,
        first_len: usize,
        second: String,
        second_len: usize,
    },

    #[error("Misaligned series at row {index}: {first_date} vs {second_date}")]
    Misaligned {
        index: usize,
        first_date: String,
        second_date: String,
    },

    #[error("{symbol} rate is zero on {date}, cross-rate is undefined")]
    ZeroRate { symbol: String, date: String },

    #[error("Failed to write workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
}

/// One day of both currencies plus their cross-rate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub first_date: String,
    pub first_rate: f64,
    pub first_change: Option<f64>,
    pub second_date: String,
    pub second_rate: f64,
    pub second_change: Option<f64>,
    /// `second_rate / first_rate`
    pub cross_rate: f64,
}

/// Builds the report file for a pair of currencies
pub struct ReportComposer {
    first_currency: String,
    second_currency: String,
    base_filename: String,
    output_dir: Option<PathBuf>,
}

impl ReportComposer {
    pub fn new(
        first_currency: impl Into<String>,
        second_currency: impl Into<String>,
        base_filename: impl Into<String>,
    ) -> Self {
        Self {
            first_currency: first_currency.into(),
            second_currency: second_currency.into(),
            base_filename: base_filename.into(),
            output_dir: None,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn first_currency(&self) -> &str {
        &self.first_currency
    }

    pub fn second_currency(&self) -> &str {
        &self.second_currency
    }

    /// `{base}_{first}_{second}.xls`, inside the output directory if set
    pub fn filename(&self) -> PathBuf {
        let name = format!(
            "{}_{}_{}.xls",
            self.base_filename, self.first_currency, self.second_currency
        );
        match &self.output_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    pub fn titles(&self) -> [String; 7] {
        [
            "Дата".to_string(),
            format!("Курс {}", self.first_currency),
            "Изменение".to_string(),
            "Дата".to_string(),
            format!("Курс {}", self.second_currency),
            "Изменение".to_string(),
            format!("{}/{}", self.second_currency, self.first_currency),
        ]
    }

    pub fn sheet_name(&self) -> String {
        format!(
            "Курсы валют {} к {}",
            self.second_currency, self.first_currency
        )
    }

    /// Fetch and align both currencies, one after the other
    #[instrument(skip(self, fetcher), fields(first = %self.first_currency, second = %self.second_currency))]
    pub async fn collect_rows(&self, fetcher: &QuoteFetcher) -> Result<Vec<ReportRow>, ReportError> {
        let first_cells = fetcher.fetch_cells(&self.first_currency).await?;
        let first = CurrencySeries::from_cells(&self.first_currency, &first_cells)?;

        let second_cells = fetcher.fetch_cells(&self.second_currency).await?;
        let second = CurrencySeries::from_cells(&self.second_currency, &second_cells)?;

        compose_rows(&first, &second)
    }

    /// Render `rows` into the report file and return its path
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub fn write_workbook(&self, rows: &[ReportRow]) -> Result<PathBuf, ReportError> {
        let path = self.filename();
        workbook::render(&path, &self.sheet_name(), &self.titles(), rows)?;
        info!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(path)
    }

    pub async fn build(&self, fetcher: &QuoteFetcher) -> Result<PathBuf, ReportError> {
        let rows = self.collect_rows(fetcher).await?;
        self.write_workbook(&rows)
    }
}

/// Zip two aligned series into report rows.
///
/// Both series must cover the same days in the same order.
pub fn compose_rows(
    first: &CurrencySeries,
    second: &CurrencySeries,
) -> Result<Vec<ReportRow>, ReportError> {
    if first.len() != second.len() {
        return Err(ReportError::LengthMismatch {
            first: first.symbol.clone(),
            first_len: first.len(),
            second: second.symbol.clone(),
            second_len: second.len(),
        });
    }

    let mut rows = Vec::with_capacity(first.len());
    for index in 0..first.len() {
        let first_date = &first.dates[index];
        let second_date = &second.dates[index];

        if first_date.trim() != second_date.trim() {
            return Err(ReportError::Misaligned {
                index,
                first_date: first_date.clone(),
                second_date: second_date.clone(),
            });
        }

        let first_rate = first.rates[index];
        if first_rate == 0.0 {
            return Err(ReportError::ZeroRate {
                symbol: first.symbol.clone(),
                date: first_date.clone(),
            });
        }

        let second_rate = second.rates[index];
        rows.push(ReportRow {
            first_date: first_date.clone(),
            first_rate,
            first_change: first.changes[index],
            second_date: second_date.clone(),
            second_rate,
            second_change: second.changes[index],
            cross_rate: second_rate / first_rate,
        });
    }

    debug!("Composed {} report rows", rows.len());
    Ok(rows)
}

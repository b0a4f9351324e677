use std::path::Path;

use chrono::Datelike;
use rust_xlsxwriter::{ColNum, ExcelDateTime, Format, FormatAlign, Workbook, Worksheet, XlsxError};
use tracing::debug;

use super::ReportRow;
use crate::series::parse_date;

const DEFAULT_COLUMN_WIDTH: f64 = 8.43;
const COLUMN_COUNT: usize = 7;

const DATE_FORMAT: &str = "dd.mm.yyyy";
const FINANCIAL_FORMAT: &str = r#"_-* #,##0.00 "₽"_-;-* #,##0.00 "₽"_-;_-* "-"?? "₽"_-;_-@_-"#;
const NUMERIC_FORMAT: &str = "0.00";

/// Cell formats by column role
struct CellStyles {
    title: Format,
    date: Format,
    financial: Format,
    numeric: Format,
}

impl CellStyles {
    fn new() -> Self {
        let base = Format::new().set_align(FormatAlign::Left);
        Self {
            title: base.clone().set_bold(),
            date: base.clone().set_num_format(DATE_FORMAT),
            financial: base.clone().set_num_format(FINANCIAL_FORMAT),
            numeric: base.set_num_format(NUMERIC_FORMAT),
        }
    }
}

/// Tracks the widest value written to each column, in characters
struct ColumnWidths {
    widths: Vec<f64>,
}

impl ColumnWidths {
    fn new(columns: usize) -> Self {
        Self {
            widths: vec![DEFAULT_COLUMN_WIDTH; columns],
        }
    }

    fn fit(&mut self, col: usize, text: &str) {
        let len = text.chars().count() as f64;
        if len > self.widths[col] {
            self.widths[col] = len + 1.0;
        }
    }

    fn apply(&self, worksheet: &mut Worksheet) -> Result<(), XlsxError> {
        for (col, width) in self.widths.iter().enumerate() {
            worksheet.set_column_width(col as ColNum, *width)?;
        }
        Ok(())
    }
}

enum Cell<'a> {
    Date(&'a str),
    Financial(f64),
    Numeric(Option<f64>),
}

impl Cell<'_> {
    fn display(&self) -> String {
        match self {
            Cell::Date(text) => text.to_string(),
            Cell::Financial(value) | Cell::Numeric(Some(value)) => value.to_string(),
            Cell::Numeric(None) => String::new(),
        }
    }
}

fn row_cells(row: &ReportRow) -> [Cell<'_>; COLUMN_COUNT] {
    [
        Cell::Date(&row.first_date),
        Cell::Financial(row.first_rate),
        Cell::Numeric(row.first_change),
        Cell::Date(&row.second_date),
        Cell::Financial(row.second_rate),
        Cell::Numeric(row.second_change),
        Cell::Numeric(Some(row.cross_rate)),
    ]
}

fn write_cell(
    worksheet: &mut Worksheet,
    styles: &CellStyles,
    row: u32,
    col: ColNum,
    cell: &Cell<'_>,
) -> Result<(), XlsxError> {
    match cell {
        Cell::Date(text) => match parse_date(text) {
            Some(date) => {
                let datetime =
                    ExcelDateTime::from_ymd(date.year() as u16, date.month() as u8, date.day() as u8)?;
                worksheet.write_datetime_with_format(row, col, &datetime, &styles.date)?;
            }
            None => {
                worksheet.write_string_with_format(row, col, *text, &styles.date)?;
            }
        },
        Cell::Financial(value) => {
            worksheet.write_number_with_format(row, col, *value, &styles.financial)?;
        }
        Cell::Numeric(Some(value)) => {
            worksheet.write_number_with_format(row, col, *value, &styles.numeric)?;
        }
        Cell::Numeric(None) => {
            worksheet.write_blank(row, col, &styles.numeric)?;
        }
    }
    Ok(())
}

/// Write a single-sheet report: bold title row, then one row per day
pub fn render(
    path: &Path,
    sheet_name: &str,
    titles: &[String; COLUMN_COUNT],
    rows: &[ReportRow],
) -> Result<(), XlsxError> {
    let styles = CellStyles::new();
    let mut widths = ColumnWidths::new(COLUMN_COUNT);
    let mut workbook = Workbook::new();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, title) in titles.iter().enumerate() {
        widths.fit(col, title);
        worksheet.write_string_with_format(0, col as ColNum, title, &styles.title)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let row_num = index as u32 + 1;
        for (col, cell) in row_cells(row).iter().enumerate() {
            widths.fit(col, &cell.display());
            write_cell(worksheet, &styles, row_num, col as ColNum, cell)?;
        }
    }

    widths.apply(worksheet)?;
    debug!("Saving workbook with {} data rows to {}", rows.len(), path.display());
    workbook.save(path)?;
    Ok(())
}

use crate::constants::{COUNTRY_COLUMN, GDP_BILLIONS_COLUMN, GDP_MILLIONS_COLUMN, YEAR_COLUMN};
use std::fmt;

/// One country row as scraped, GDP still in its formatted source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GdpRecord {
    pub country: String,
    pub gdp_millions: String,
    pub year: String,
}

/// A record after the GDP column was converted to billions.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedRecord {
    pub country: String,
    pub gdp_billions: f64,
    pub year: String,
}

/// Extracted rows in source table order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GdpDataset {
    pub records: Vec<GdpRecord>,
}

/// Transformed rows, same order as the [`GdpDataset`] they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformedDataset {
    pub records: Vec<TransformedRecord>,
}

impl GdpDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TransformedDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl fmt::Display for GdpDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self
            .records
            .iter()
            .map(|r| vec![r.country.clone(), r.gdp_millions.clone(), r.year.clone()])
            .collect::<Vec<_>>();
        write_table(f, &[COUNTRY_COLUMN, GDP_MILLIONS_COLUMN, YEAR_COLUMN], &rows)
    }
}

impl fmt::Display for TransformedDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self
            .records
            .iter()
            .map(|r| vec![r.country.clone(), format!("{:.2}", r.gdp_billions), r.year.clone()])
            .collect::<Vec<_>>();
        write_table(f, &[COUNTRY_COLUMN, GDP_BILLIONS_COLUMN, YEAR_COLUMN], &rows)
    }
}

/// Renders an index column plus the given columns, right aligned, one line
/// per row. Shared by the dataset displays and query output.
pub(crate) fn write_table<H: AsRef<str>>(
    f: &mut fmt::Formatter<'_>,
    headers: &[H],
    rows: &[Vec<String>],
) -> fmt::Result {
    let index_width = rows.len().saturating_sub(1).to_string().len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.as_ref().chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write!(f, "{:>index_width$}", "")?;
    for (header, width) in headers.iter().zip(&widths) {
        write!(f, "  {:>width$}", header.as_ref(), width = *width)?;
    }
    writeln!(f)?;

    if rows.is_empty() {
        return writeln!(f, "(no rows)");
    }
    for (i, row) in rows.iter().enumerate() {
        write!(f, "{:>index_width$}", i)?;
        for (cell, width) in row.iter().zip(&widths) {
            write!(f, "  {:>width$}", cell, width = *width)?;
        }
        writeln!(f)?;
    }
    Ok(())
}

use crate::error::{EtlError, Result};
use crate::types::{GdpDataset, TransformedDataset, TransformedRecord};
use tracing::instrument;

/// Parses comma grouped decimal text such as `"1,234.5"`.
pub fn parse_gdp(text: &str) -> Result<f64> {
    let digits: String = text.chars().filter(|&c| c != ',').collect();
    match digits.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(EtlError::NumericParse {
            value: text.to_string(),
        }),
    }
}

/// Millions to billions, rounded to two decimal places.
pub fn to_billions(millions: f64) -> f64 {
    (millions / 1000.0 * 100.0).round() / 100.0
}

/// Converts every record's GDP to numeric billions. Consumes the dataset, so
/// the same figures can never be scaled twice.
#[instrument(skip(dataset), fields(records = dataset.len()))]
pub fn transform(dataset: GdpDataset) -> Result<TransformedDataset> {
    let records = dataset
        .records
        .into_iter()
        .map(|record| {
            Ok(TransformedRecord {
                gdp_billions: to_billions(parse_gdp(&record.gdp_millions)?),
                country: record.country,
                year: record.year,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TransformedDataset { records })
}

use crate::constants::{COUNTRY_COLUMN, GDP_BILLIONS_COLUMN, YEAR_COLUMN};
use crate::error::Result;
use crate::types::{TransformedDataset, TransformedRecord};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

/// Header of the written file. The first column is the unlabelled row index.
pub const CSV_HEADER: [&str; 4] = ["", COUNTRY_COLUMN, GDP_BILLIONS_COLUMN, YEAR_COLUMN];

/// Writes `dataset` to `path`, replacing any existing file.
#[instrument(skip(dataset), fields(path = %path.display(), records = dataset.len()))]
pub fn write_csv(dataset: &TransformedDataset, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(CSV_HEADER)?;
    for (index, record) in dataset.records.iter().enumerate() {
        writer.serialize((index, &record.country, record.gdp_billions, &record.year))?;
    }
    writer.flush()?;

    info!("Wrote {} rows", dataset.len());
    Ok(())
}

/// Reads a file produced by [`write_csv`] back, dropping the index column.
pub fn read_csv(path: &Path) -> Result<TransformedDataset> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let (_index, country, gdp_billions, year): (usize, String, f64, String) = row?;
        records.push(TransformedRecord {
            country,
            gdp_billions,
            year,
        });
    }
    Ok(TransformedDataset { records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn dataset(rows: &[(&str, f64, &str)]) -> TransformedDataset {
        TransformedDataset {
            records: rows
                .iter()
                .map(|(country, gdp, year)| TransformedRecord {
                    country: country.to_string(),
                    gdp_billions: *gdp,
                    year: year.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_write_csv_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gdp.csv");

        write_csv(&dataset(&[("Alpha", 10.0, "2020"), ("Gamma", 0.5, "2021")]), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], ",Country,GDP_USD_billions,Year");
        assert!(lines[1].starts_with("0,Alpha,10"));
        assert!(lines[1].ends_with(",2020"));
        assert!(lines[2].starts_with("1,Gamma,0.5"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gdp.csv");
        let original = dataset(&[
            ("United States", 26854.6, "2023"),
            ("Korea, South", 1721.91, "2023"),
            ("Tuvalu", 0.06, "2022"),
        ]);

        write_csv(&original, &path).unwrap();
        assert_eq!(read_csv(&path).unwrap(), original);
    }

    #[test]
    fn test_write_csv_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("gdp.csv");

        write_csv(&dataset(&[("Alpha", 1.0, "2020"), ("Beta", 2.0, "2020")]), &path).unwrap();
        write_csv(&dataset(&[("Gamma", 3.0, "2021")]), &path).unwrap();

        let back = read_csv(&path).unwrap();
        assert_eq!(back, dataset(&[("Gamma", 3.0, "2021")]));
    }

    #[test]
    fn test_write_csv_onto_directory_fails() {
        let dir = tempdir().unwrap();
        let err = write_csv(&dataset(&[]), dir.path()).unwrap_err();
        assert!(matches!(err, crate::error::EtlError::CsvSink(_)));
    }
}

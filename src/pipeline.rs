use crate::config::EtlConfig;
use crate::error::Result;
use crate::extract::extract_records;
use crate::fetch::PageFetcher;
use crate::logging::log_progress;
use crate::sink::write_csv;
use crate::storage::{GdpStore, GdpQuery, QueryOutput};
use crate::transform::transform;
use crate::types::TransformedDataset;
use tracing::{info, instrument};

/// Run stages, in the only order they may execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Extract,
    Transform,
    LoadCsv,
    LoadDb,
    Query,
    Complete,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Start,
        Stage::Extract,
        Stage::Transform,
        Stage::LoadCsv,
        Stage::LoadDb,
        Stage::Query,
        Stage::Complete,
    ];

    /// The opening marker, and the only one `Start` and `Complete` write.
    pub fn message(self) -> &'static str {
        match self {
            Stage::Start => "ETL process start",
            Stage::Extract => "Extract process start",
            Stage::Transform => "Transform process start",
            Stage::LoadCsv => "Load to CSV start",
            Stage::LoadDb => "Load to database start",
            Stage::Query => "Run query start",
            Stage::Complete => "ETL process complete",
        }
    }

    /// `None` for the single-marker stages.
    pub fn end_message(self) -> Option<&'static str> {
        match self {
            Stage::Start | Stage::Complete => None,
            Stage::Extract => Some("Extract process end"),
            Stage::Transform => Some("Transform process end"),
            Stage::LoadCsv => Some("Load to CSV end"),
            Stage::LoadDb => Some("Load to database end"),
            Stage::Query => Some("Run query end"),
        }
    }

    /// Every progress line a successful run writes, in order.
    pub fn markers() -> Vec<&'static str> {
        Stage::ALL
            .iter()
            .flat_map(|stage| std::iter::once(stage.message()).chain(stage.end_message()))
            .collect()
    }
}

/// Logs the stage's start marker, runs `body`, logs the end marker on success.
fn run_stage<T>(stage: Stage, body: impl FnOnce() -> Result<T>) -> Result<T> {
    log_progress(stage.message());
    let out = body()?;
    if let Some(end) = stage.end_message() {
        log_progress(end);
    }
    Ok(out)
}

/// What a completed run produced.
#[derive(Debug)]
pub struct PipelineResult {
    pub extracted: usize,
    pub transformed: TransformedDataset,
    pub query: GdpQuery,
    pub query_output: QueryOutput,
}

pub struct Pipeline;

impl Pipeline {
    /// Extract, transform, load to CSV and SQLite, then run the threshold
    /// query. Any error aborts the run at the stage where it happened.
    #[instrument(skip(config, fetcher), fields(url = %config.source_url))]
    pub fn run(config: &EtlConfig, fetcher: &dyn PageFetcher) -> Result<PipelineResult> {
        log_progress(Stage::Start.message());

        let dataset = run_stage(Stage::Extract, || {
            let html = fetcher.fetch_page(&config.source_url)?;
            extract_records(&html)
        })?;
        let extracted = dataset.len();
        println!("{}", dataset);

        let transformed = run_stage(Stage::Transform, || transform(dataset))?;
        println!("**************************************");
        println!("Transformed data");
        println!("**************************************");
        println!("{}", transformed);

        run_stage(Stage::LoadCsv, || write_csv(&transformed, &config.csv_path))?;

        let store = run_stage(Stage::LoadDb, || {
            let store = GdpStore::open(&config.db_path)?;
            store.replace_table(&config.table_name, &transformed)?;
            Ok(store)
        })?;

        let query = GdpQuery::countries_above(&config.table_name, config.query_threshold);
        let query_output = run_stage(Stage::Query, || {
            println!("{}", query);
            let output = store.run_gdp_query(&query)?;
            println!("{}", output);
            Ok(output)
        })?;
        store.close()?;

        log_progress(Stage::Complete.message());
        info!(
            extracted,
            loaded = transformed.len(),
            matched = query_output.rows.len(),
            "Pipeline finished"
        );

        Ok(PipelineResult {
            extracted,
            transformed,
            query,
            query_output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use crate::logging::progress_layer;
    use std::fs;
    use tempfile::tempdir;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::Registry;

    #[test]
    fn test_stage_markers_in_order() {
        assert_eq!(
            Stage::markers(),
            vec![
                "ETL process start",
                "Extract process start",
                "Extract process end",
                "Transform process start",
                "Transform process end",
                "Load to CSV start",
                "Load to CSV end",
                "Load to database start",
                "Load to database end",
                "Run query start",
                "Run query end",
                "ETL process complete",
            ]
        );
    }

    #[test]
    fn test_bracketing_stages_are_single_marker() {
        assert_eq!(Stage::Start.message(), "ETL process start");
        assert_eq!(Stage::Start.end_message(), None);
        assert_eq!(Stage::Complete.message(), "ETL process complete");
        assert_eq!(Stage::Complete.end_message(), None);
        assert!(Stage::ALL[1..6].iter().all(|stage| stage.end_message().is_some()));
    }

    #[test]
    fn test_run_stage_skips_end_marker_on_error() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("log.txt");
        let subscriber = Registry::default().with(progress_layer::<Registry>(&log_path).unwrap());

        tracing::subscriber::with_default(subscriber, || {
            run_stage(Stage::Transform, || Ok(())).unwrap();
            let result: Result<()> = run_stage(Stage::LoadCsv, || {
                Err(EtlError::SchemaMismatch("gone".to_string()))
            });
            assert!(result.is_err());
        });

        let content = fs::read_to_string(&log_path).unwrap();
        let messages: Vec<&str> = content
            .lines()
            .map(|line| line.split_once(" : ").unwrap().1)
            .collect();
        assert_eq!(
            messages,
            vec!["Transform process start", "Transform process end", "Load to CSV start"]
        );
    }
}

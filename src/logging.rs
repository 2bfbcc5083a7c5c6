use crate::constants::{PROGRESS_TARGET, PROGRESS_TIMESTAMP_FORMAT};
use chrono::Local;
use std::fmt;
use std::path::Path;
use tracing::{Event, Subscriber};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::{LookupSpan, Registry};
use tracing_subscriber::{filter, fmt as tracing_fmt, prelude::*, EnvFilter, Layer};

/// Initializes the logging system: console output filtered by `RUST_LOG`,
/// plus the progress log file at `log_path`.
///
/// The progress file is best effort. If it cannot be opened the run goes on
/// with console logging only.
pub fn init_logging(log_path: &Path) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gdp_etl=info,etl_progress=info"));
    let console_layer = tracing_fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(env_filter);

    let (progress, open_error) = match progress_layer::<Registry>(log_path) {
        Ok(layer) => (Some(layer), None),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(progress)
        .with(console_layer)
        .init();

    if let Some(e) = open_error {
        tracing::warn!(
            "Progress log {} unavailable, continuing with console only: {}",
            log_path.display(),
            e
        );
    }
}

/// A layer that appends every `etl_progress` event to `log_path` as
/// `<timestamp> : <message>`.
pub fn progress_layer<S>(log_path: &Path) -> Result<impl Layer<S> + Send + Sync, InitError>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let directory = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = log_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| crate::constants::LOG_PATH.to_string());

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)?;

    Ok(tracing_fmt::layer()
        .with_ansi(false)
        .with_writer(appender)
        .event_format(ProgressFormat)
        .with_filter(filter::filter_fn(|meta| meta.target() == PROGRESS_TARGET)))
}

/// Appends one stage marker to the progress log.
pub fn log_progress(message: &str) {
    tracing::info!(target: PROGRESS_TARGET, "{}", message);
}

/// `<local timestamp> : <message>` with nothing else on the line.
struct ProgressFormat;

impl<S, N> FormatEvent<S, N> for ProgressFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "{} : ", Local::now().format(PROGRESS_TIMESTAMP_FORMAT))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

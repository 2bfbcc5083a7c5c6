/// Source and output locations used when no config file overrides them.
pub const SOURCE_URL: &str = "https://web.archive.org/web/20230902185326/https://en.wikipedia.org/wiki/List_of_countries_by_GDP_%28nominal%29";
pub const CSV_PATH: &str = "Countries_by_GDP.csv";
pub const DB_PATH: &str = "World_Economies.db";
pub const TABLE_NAME: &str = "Countries_by_GDP";
pub const LOG_PATH: &str = "etl_project_log.txt";

pub const QUERY_THRESHOLD: f64 = 100.0;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const USER_AGENT: &str = concat!("gdp_etl/", env!("CARGO_PKG_VERSION"));

// Column labels. The persisted names are fixed and not configurable.
pub const COUNTRY_COLUMN: &str = "Country";
pub const GDP_MILLIONS_COLUMN: &str = "GDP_USD_millions";
pub const GDP_BILLIONS_COLUMN: &str = "GDP_USD_billions";
pub const YEAR_COLUMN: &str = "Year";

/// Cell text the source uses for "no data".
pub const NO_DATA_MARKER: &str = "—";

/// Country, (unused), GDP, year.
pub const MIN_CELLS_PER_ROW: usize = 4;

/// Tracing target that the progress file layer listens on.
pub const PROGRESS_TARGET: &str = "etl_progress";
pub const PROGRESS_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";

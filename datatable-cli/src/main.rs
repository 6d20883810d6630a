//! Command-line front end: fetches one page of a server-paginated table
//! and prints it.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use datatable_lib::ColumnSpec;
use datatable_lib::DataTable;
use datatable_lib::DataTableConfig;
use datatable_lib::Direction;
use datatable_lib::SortSpec;
use datatable_lib::transport::HttpTransport;
use simplelog::ColorChoice;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "datatable", version, about = "Browse a server-paginated table")]
struct Cli {
    /// JSON table configuration; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Endpoint URL.
    #[arg(long)]
    url: Option<String>,

    /// Table identifier.
    #[arg(long)]
    table: Option<String>,

    /// Column as `accessor` or `accessor:Header`; repeat for more.
    #[arg(long = "column", value_name = "COLUMN")]
    columns: Vec<String>,

    /// Rows per page.
    #[arg(long)]
    page_size: Option<usize>,

    /// Zero-based page index.
    #[arg(long, default_value_t = 0)]
    page: usize,

    /// Sort as `column` or `column:desc`.
    #[arg(long)]
    sort: Option<String>,

    /// Free-text filter.
    #[arg(long, default_value = "")]
    filter: String,

    /// Request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Log fetch activity to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("missing --{0}")]
    Missing(&'static str),

    #[error("invalid --sort: {0}")]
    Sort(String),

    #[error(transparent)]
    Table(#[from] datatable_lib::error::Error),

    #[error("fetch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("fetch failed: {0}")]
    Fetch(String),
}

fn parse_column(raw: &str) -> ColumnSpec {
    match raw.split_once(':') {
        Some((accessor, header)) => ColumnSpec::new(header, accessor),
        None => ColumnSpec::new(raw, raw),
    }
}

fn parse_sort(raw: &str) -> Result<SortSpec, CliError> {
    match raw.split_once(':') {
        Some((column, direction)) => {
            let direction: Direction = direction.parse().map_err(CliError::Sort)?;
            Ok(SortSpec::new(column, direction))
        }
        None => Ok(SortSpec::asc(raw)),
    }
}

fn load_config(cli: &Cli) -> Result<DataTableConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&text).map_err(|source| CliError::ParseConfig {
                path: path.clone(),
                source,
            })?
        }
        None => {
            let url = cli.url.clone().ok_or(CliError::Missing("url"))?;
            let table = cli.table.clone().ok_or(CliError::Missing("table"))?;
            DataTableConfig::new(url, table, Vec::new())
        }
    };

    if let Some(url) = &cli.url {
        config.url = url.clone();
    }
    if let Some(table) = &cli.table {
        config.table = table.clone();
    }
    if !cli.columns.is_empty() {
        config.columns = cli.columns.iter().map(String::as_str).map(parse_column).collect();
    }
    if let Some(page_size) = cli.page_size {
        config.page_size = page_size;
    }
    if let Some(sort) = &cli.sort {
        config.default_sort = parse_sort(sort)?;
    }
    if let Some(secs) = cli.timeout {
        config.request_timeout = Some(Duration::from_secs(secs));
    }
    log::debug!("Loaded config: {:?}", config);
    Ok(config)
}

fn print_table(table: &DataTable<HttpTransport>) {
    let headers: Vec<String> = table.header_cells().iter().map(|h| h.label()).collect();
    println!("{}", headers.join("\t"));

    let display = table.controller().display();
    for row in &display.rows {
        let cells: Vec<String> = table
            .controller()
            .columns()
            .iter()
            .map(|c| row.cell_text(&c.accessor))
            .collect();
        println!("{}", cells.join("\t"));
    }

    let view = table.pagination_view();
    println!(
        "{}  (page {} of {})",
        view.displayed_rows(),
        view.page + 1,
        view.page_count.max(1)
    );
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    let table = DataTable::connect(config)?;

    // Filter and page changes each supersede the fetch before them; only the
    // last one is awaited.
    let mut last = if cli.filter.is_empty() {
        table.mount()
    } else {
        table.controller().set_filter(&cli.filter)
    };
    if cli.page > 0 {
        last = table.controller().go_to_page(cli.page).or(last);
    }

    if let Some(handle) = last {
        handle.await?;
    }
    let display = table.controller().display();
    if let Some(error) = display.error {
        return Err(CliError::Fetch(error));
    }
    log::info!(
        "Fetched {} of {} rows from '{}'",
        display.rows.len(),
        display.total_records,
        table.controller().table()
    );
    print_table(&table);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if let Err(e) = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

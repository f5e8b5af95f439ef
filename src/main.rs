use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use survey_lens::config::{Config, DEFAULT_EXPORT_NAME, DEFAULT_SOURCE};
use survey_lens::error::LensError;
use survey_lens::{Request, View};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SURVEY_LENS_BUILD_COMMIT"),
    ")"
);

/// survey-lens — dashboard for a survey CSV export.
/// Summary statistics, a searchable and sortable table, filtered CSV export.
#[derive(Parser)]
#[command(name = "survey-lens", version = VERSION, about)]
struct Cli {
    /// CSV file path or http(s) URL.
    #[arg(default_value = DEFAULT_SOURCE)]
    source: String,

    /// Case-insensitive text to look for in the table columns.
    #[arg(long)]
    search: Option<String>,

    /// Exact value required in the rating column (e.g. "5").
    #[arg(long)]
    filter: Option<String>,

    /// Table column to sort by: 0-based index or label. Repeat to toggle
    /// direction ("--sort Nome --sort Nome" sorts descending).
    #[arg(long, value_name = "COLUMN")]
    sort: Vec<String>,

    /// Table page, starting at 1.
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Only the dashboard summary.
    #[arg(long, conflicts_with = "table")]
    summary: bool,

    /// Only the table page.
    #[arg(long)]
    table: bool,

    /// Add comment lists and insight cards.
    #[arg(long)]
    feedback: bool,

    /// Write the filtered rows as CSV to PATH ("-" for stdout) instead of
    /// rendering.
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Machine-readable JSON output.
    #[arg(long)]
    json: bool,

    /// TOML file overriding columns, page size and keyword lists.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debug logging on stderr (RUST_LOG takes precedence).
    #[arg(short, long)]
    verbose: bool,

    /// Print shell completions for the given shell.
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "survey-lens", &mut io::stdout());
        return;
    }

    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{e}");
        process::exit(e.exit_code());
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), LensError> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let sort = cli
        .sort
        .iter()
        .map(|s| config.resolve_column(s))
        .collect::<Result<Vec<_>, _>>()?;

    let view = if cli.summary {
        View::Summary
    } else if cli.table {
        View::Table
    } else {
        View::All
    };

    let request = Request {
        search: cli.search,
        filter: cli.filter,
        sort,
        page: cli.page,
        view,
        feedback: cli.feedback,
        json: cli.json,
    };

    let records = survey_lens::load(&cli.source)?;

    if let Some(target) = cli.export {
        return write_export(&records, &config, &request, &target);
    }

    let output = survey_lens::render(&records, &request, &config)?;
    let is_tty = io::stdout().is_terminal();
    if request.json {
        println!("{output}");
    } else {
        emit_output(&output, is_tty);
    }
    Ok(())
}

fn write_export(
    records: &[survey_lens::types::Record],
    config: &Config,
    request: &Request,
    target: &Path,
) -> Result<(), LensError> {
    let Some(csv) = survey_lens::export(records, config, request)? else {
        warn!("no matching responses; nothing exported");
        return Ok(());
    };

    if target == Path::new("-") {
        println!("{csv}");
        return Ok(());
    }

    let path = if target.is_dir() {
        target.join(DEFAULT_EXPORT_NAME)
    } else {
        target.to_path_buf()
    };
    fs::write(&path, csv).map_err(|e| LensError::Io {
        path: path.clone(),
        source: e,
    })?;
    info!(path = %path.display(), "exported filtered responses");
    Ok(())
}

/// Write output to stdout. When TTY and output is long, pipe through $PAGER.
fn emit_output(output: &str, is_tty: bool) {
    let line_count = output.lines().count();
    let term_height = terminal_height();

    if is_tty && line_count > term_height {
        let pager = std::env::var("PAGER").unwrap_or_else(|_| "less".into());
        if let Ok(mut child) = process::Command::new(&pager)
            .arg("-R")
            .stdin(process::Stdio::piped())
            .spawn()
        {
            if let Some(ref mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(output.as_bytes());
            }
            let _ = child.wait();
            return;
        }
    }

    println!("{output}");
}

fn terminal_height() -> usize {
    if let Ok(lines) = std::env::var("LINES") {
        if let Ok(h) = lines.parse::<usize>() {
            return h;
        }
    }
    24
}

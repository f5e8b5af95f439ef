#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,  // bar lengths from f64 widths
    clippy::cast_sign_loss,            // same
    clippy::cast_precision_loss,       // counts as f64 for averages, survey-sized
    clippy::module_name_repetitions,   // Rust naming conventions
    clippy::missing_errors_doc,        // every error is a LensError, documented there
    clippy::missing_panics_doc,        // same
)]

pub mod config;
pub mod error;
pub mod export;
pub mod feedback;
pub mod fetch;
pub(crate) mod format;
pub mod parse;
pub mod stats;
pub mod table;
pub mod types;
pub mod values;

use serde_json::json;
use tracing::info;

use config::Config;
use error::LensError;
use table::TableView;
use types::Record;

/// Which blocks of output to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Dashboard summary and the current table page.
    #[default]
    All,
    Summary,
    Table,
}

/// Everything the user asked for on one invocation. Applied to a fresh
/// [`TableView`] in field order: search, filter, sorts, page.
#[derive(Debug, Clone)]
pub struct Request {
    pub search: Option<String>,
    pub filter: Option<String>,
    /// Display column indices, applied in order. The same index twice
    /// sorts that column descending.
    pub sort: Vec<usize>,
    pub page: usize,
    pub view: View,
    pub feedback: bool,
    pub json: bool,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            search: None,
            filter: None,
            sort: Vec::new(),
            page: 1,
            view: View::All,
            feedback: false,
            json: false,
        }
    }
}

/// Load and parse the survey at `source` (path or URL).
pub fn load(source: &str) -> Result<Vec<Record>, LensError> {
    let text = fetch::load(source)?;
    let records = parse::parse(&text);
    info!(source, records = records.len(), "loaded survey");
    Ok(records)
}

/// Build the table view the request describes.
pub fn table_view<'a>(
    records: &'a [Record],
    config: &'a Config,
    request: &Request,
) -> Result<TableView<'a>, LensError> {
    let mut view = TableView::new(records, config);
    if let Some(term) = &request.search {
        view.set_search(term);
    }
    if let Some(value) = &request.filter {
        view.set_filter(value);
    }
    for &column in &request.sort {
        view.sort_by(column)?;
    }
    view.set_page(request.page);
    Ok(view)
}

/// The filtered CSV for the request, `None` when no record matches.
pub fn export(
    records: &[Record],
    config: &Config,
    request: &Request,
) -> Result<Option<String>, LensError> {
    Ok(table_view(records, config, request)?.export_filtered())
}

/// The single public API: load → parse → derive views → formatted string.
pub fn run(source: &str, request: &Request, config: &Config) -> Result<String, LensError> {
    let records = load(source)?;
    render(&records, request, config)
}

/// Render already-loaded records as text or JSON.
pub fn render(records: &[Record], request: &Request, config: &Config) -> Result<String, LensError> {
    let view = table_view(records, config, request)?;
    let show_summary = request.view != View::Table;
    let show_table = request.view != View::Summary;

    let dashboard = stats::summarize(records, config);
    let comments = request.feedback.then(|| {
        let fb = feedback::analyze(records, config);
        let cards = feedback::insights(&dashboard, &fb);
        (fb, cards)
    });

    if request.json {
        let mut out = json!({});
        if show_summary {
            out["dashboard"] = json!(dashboard);
        }
        if show_table {
            let state = view.state();
            let (shown, total) = view.showing();
            out["table"] = json!({
                "columns": view.columns(),
                "page": state.page,
                "page_count": view.page_count(),
                "shown": shown,
                "total": total,
                "search": state.search,
                "filter": state.filter,
                "sort": state.sort,
                "rows": view.page_rows(),
            });
        }
        if let Some((fb, cards)) = &comments {
            out["feedback"] = json!(fb);
            out["insights"] = json!(cards);
        }
        return Ok(serde_json::to_string_pretty(&out)
            .expect("serde_json::Value is always serializable"));
    }

    let mut blocks = Vec::new();
    if show_summary {
        blocks.push(format::dashboard(&dashboard));
    }
    if show_table {
        blocks.push(format::table(&view));
    }
    if let Some((fb, cards)) = &comments {
        blocks.push(format::feedback(fb, cards));
    }
    Ok(blocks.join("\n\n"))
}

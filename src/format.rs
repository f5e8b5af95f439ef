use std::fmt::Write;

use crate::feedback::{Feedback, FeedbackItem, Insight, fixed};
use crate::stats::{BAR_MAX_HEIGHT, Bar, Dashboard, RatingSummary};
use crate::table::TableView;
use crate::types::truncate_str;

/// Widest bar in the text charts, in characters.
const BAR_WIDTH: f64 = 24.0;
/// Cells longer than this are cut in the table view.
const CELL_MAX: usize = 32;

/// `# Survey: N responses` followed by one block per aggregate.
#[must_use]
pub fn dashboard(d: &Dashboard) -> String {
    let mut out = format!("# Survey: {} responses", d.total);

    if let Some(p) = &d.period {
        let _ = write!(
            out,
            "\nperiod: {} to {} ({} dated responses, {} days)",
            p.first.format("%d/%m/%Y"),
            p.last.format("%d/%m/%Y"),
            p.dated,
            p.distinct_days
        );
    }

    out.push_str("\n\n");
    out.push_str(&rating_block("experience", &d.experience));
    out.push_str("\n\n");
    out.push_str(&rating_block("schedule", &d.schedule));

    if let Some(a) = &d.age {
        let _ = write!(
            out,
            "\n\n## age: avg {:.1} | min {} | max {}\n",
            a.average, a.min, a.max
        );
        let buckets: Vec<String> = a
            .buckets
            .iter()
            .map(|(label, n)| format!("{label}: {n}"))
            .collect();
        out.push_str(&buckets.join("  "));
    }

    let e = &d.expectations;
    let [yes, partial, no] = e.widths();
    let _ = write!(
        out,
        "\n\n## expectations: yes {} | partial {} | no {}\n\
         yes     {}\npartial {}\nno      {}",
        e.yes,
        e.partial,
        e.no,
        pct_bar(yes),
        pct_bar(partial),
        pct_bar(no)
    );
    out
}

fn rating_block(name: &str, r: &RatingSummary) -> String {
    let mut out = format!(
        "## {name}: avg {} | {}% rated 4-5 ({} of {})",
        fixed(r.average, 2),
        r.satisfaction_rate,
        r.satisfied,
        r.count
    );
    for bar in &r.bars {
        let _ = write!(out, "\n{}", bar_line(bar));
    }
    out
}

fn bar_line(bar: &Bar) -> String {
    let len = (bar.height / BAR_MAX_HEIGHT * BAR_WIDTH).round() as usize;
    format!("  {} | {} {}", bar.score, "█".repeat(len), bar.count)
}

fn pct_bar(pct: f64) -> String {
    let len = (pct / 100.0 * BAR_WIDTH).round() as usize;
    format!("{} {pct:.0}%", "█".repeat(len))
}

/// Header line with paging/sort/search state, then the current page as a
/// pipe-separated table.
#[must_use]
pub fn table(view: &TableView<'_>) -> String {
    let state = view.state();
    let columns = view.columns();
    let (shown, total) = view.showing();

    let mut tags = vec![format!("page {}/{}", state.page, view.page_count())];
    if let Some(sort) = &state.sort {
        let label = columns.get(sort.column).map_or("?", |c| c.label.as_str());
        tags.push(format!("sort: {label} {}", sort.direction));
    }
    if !state.search.is_empty() {
        tags.push(format!("search: \"{}\"", state.search));
    }
    if !state.filter.is_empty() {
        tags.push(format!("filter: \"{}\"", state.filter));
    }

    let mut out = format!(
        "# Responses: showing {shown} of {total} [{}]\n\n",
        tags.join(", ")
    );

    let header: Vec<&str> = columns.iter().map(|c| c.label.as_str()).collect();
    out.push_str(&header.join(" | "));
    for row in view.page_rows() {
        let cells: Vec<&str> = columns
            .iter()
            .map(|c| truncate_str(row.get_lenient(&c.key), CELL_MAX))
            .collect();
        let _ = write!(out, "\n{}", cells.join(" | "));
    }
    out
}

/// Comment counts, the three comment lists and the insight cards.
#[must_use]
pub fn feedback(f: &Feedback, insights: &[Insight]) -> String {
    let mut out = format!(
        "# Feedback: {} comments | {} positive | {} suggestions",
        f.comments, f.positive, f.suggestions
    );
    for (title, items) in [
        ("rated 5", &f.excellent),
        ("rated 4", &f.good),
        ("suggestions", &f.suggestion_items),
    ] {
        let _ = write!(out, "\n\n## {title} ({})", items.len());
        for item in items {
            out.push('\n');
            out.push_str(&feedback_item(item));
        }
    }

    out.push_str("\n\n## insights");
    for card in insights {
        let _ = write!(out, "\n- {}: {}", card.title, card.content);
    }
    out
}

fn feedback_item(item: &FeedbackItem) -> String {
    format!("\"{}\" - {}, {}", item.comment, item.name, item.timestamp)
}

//! Table view over immutable records: search, exact-match filter, sort,
//! pagination and filtered export.
//!
//! Records are never reordered or modified. Sorting permutes an index
//! vector held in [`TableState`], stably with respect to the previous
//! order, so repeated sorts compose the way clicking column headers does.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::LensError;
use crate::export;
use crate::types::{ColumnDescriptor, Record, SortDirection};
use crate::values::{collate, extract_date, sort_number};

/// Current sort: which column, and which way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub column: usize,
    pub key: String,
    pub direction: SortDirection,
}

/// Mutable view state. Everything the user can change lives here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    /// Lower-cased search term; empty means no search.
    pub search: String,
    /// Exact value required in the filter column; empty means no filter.
    pub filter: String,
    /// 1-based. Not clamped.
    pub page: usize,
    pub page_size: usize,
    pub sort: Option<SortState>,
    /// Record indices in display order.
    order: Vec<usize>,
}

impl TableState {
    #[must_use]
    pub fn new(record_count: usize, page_size: usize) -> Self {
        Self {
            search: String::new(),
            filter: String::new(),
            page: 1,
            page_size,
            sort: None,
            order: (0..record_count).collect(),
        }
    }
}

/// The controller: borrowed records and column layout plus owned state.
pub struct TableView<'a> {
    records: &'a [Record],
    columns: &'a [ColumnDescriptor],
    filter_key: &'a str,
    date_column: Option<usize>,
    state: TableState,
}

impl<'a> TableView<'a> {
    #[must_use]
    pub fn new(records: &'a [Record], config: &'a Config) -> Self {
        Self {
            records,
            columns: &config.columns,
            filter_key: &config.fields.rating,
            date_column: config.date_column(),
            state: TableState::new(records.len(), config.page_size),
        }
    }

    /// Resume from a previously returned state. A state built for a record
    /// slice of another length keeps its search, filter and page but falls
    /// back to file order, unsorted.
    #[must_use]
    pub fn with_state(mut self, mut state: TableState) -> Self {
        if state.order.len() != self.records.len() {
            debug!(
                expected = self.records.len(),
                got = state.order.len(),
                "stale table state, resetting order"
            );
            state.order = (0..self.records.len()).collect();
            state.sort = None;
        }
        self.state = state;
        self
    }

    #[must_use]
    pub fn state(&self) -> &TableState {
        &self.state
    }

    #[must_use]
    pub fn into_state(self) -> TableState {
        self.state
    }

    #[must_use]
    pub fn columns(&self) -> &'a [ColumnDescriptor] {
        self.columns
    }

    pub fn set_search(&mut self, term: &str) {
        self.state.search = term.to_lowercase();
        self.state.page = 1;
    }

    pub fn set_filter(&mut self, value: &str) {
        self.state.filter = value.to_string();
        self.state.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.state.page = page;
    }

    /// Sort by display column. Same column again flips the direction; a new
    /// column starts ascending. Resets to page 1.
    pub fn sort_by(&mut self, column: usize) -> Result<(), LensError> {
        let desc = self.columns.get(column).ok_or(LensError::InvalidColumn {
            index: column,
            available: self.columns.len(),
        })?;

        let direction = match &self.state.sort {
            Some(s) if s.key == desc.key => s.direction.toggled(),
            _ => SortDirection::Ascending,
        };

        let by_date = self.date_column == Some(column);
        let records = self.records;
        let key = desc.key.as_str();
        self.state.order.sort_by(|&a, &b| {
            let ka = SortKey::read(records[a].get(key), by_date);
            let kb = SortKey::read(records[b].get(key), by_date);
            match direction {
                SortDirection::Ascending => ka.compare(&kb),
                SortDirection::Descending => kb.compare(&ka),
            }
        });

        debug!(column, %direction, "sorted table");
        self.state.sort = Some(SortState {
            column,
            key: desc.key.clone(),
            direction,
        });
        self.state.page = 1;
        Ok(())
    }

    fn matches(&self, record: &Record) -> bool {
        let state = &self.state;
        if !state.filter.is_empty() && record.get(self.filter_key) != state.filter {
            return false;
        }
        if state.search.is_empty() {
            return true;
        }
        self.columns.iter().any(|c| {
            record
                .get_lenient(&c.key)
                .to_lowercase()
                .contains(&state.search)
        })
    }

    /// Records passing search and filter, in current order.
    #[must_use]
    pub fn filtered(&self) -> Vec<&'a Record> {
        let records = self.records;
        self.state
            .order
            .iter()
            .map(|&i| &records[i])
            .filter(|r| self.matches(r))
            .collect()
    }

    #[must_use]
    pub fn filtered_count(&self) -> usize {
        self.state
            .order
            .iter()
            .filter(|&&i| self.matches(&self.records[i]))
            .count()
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.filtered_count().div_ceil(self.state.page_size)
    }

    /// Rows on the current page. An out-of-range page is simply empty.
    #[must_use]
    pub fn page_rows(&self) -> Vec<&'a Record> {
        let Some(start) = self
            .state
            .page
            .checked_sub(1)
            .and_then(|p| p.checked_mul(self.state.page_size))
        else {
            return Vec::new();
        };
        self.filtered()
            .into_iter()
            .skip(start)
            .take(self.state.page_size)
            .collect()
    }

    /// `(shown, total)`: rows up to the end of the current page, and the
    /// filtered total.
    #[must_use]
    pub fn showing(&self) -> (usize, usize) {
        let total = self.filtered_count();
        let end = self.state.page.saturating_mul(self.state.page_size);
        (total.min(end), total)
    }

    /// Filtered records as CSV text, or `None` when nothing matches.
    #[must_use]
    pub fn export_filtered(&self) -> Option<String> {
        let rows = self.filtered();
        let csv = export::to_csv(&rows);
        if let Some(ref text) = csv {
            debug!(rows = rows.len(), bytes = text.len(), "exported table");
        }
        csv
    }
}

/// Sort key for one cell. Numbers order before text so mixed columns
/// still get a total order.
#[derive(Debug)]
enum SortKey<'r> {
    Date(NaiveDate),
    Number(f64),
    Text(&'r str),
}

impl<'r> SortKey<'r> {
    fn read(value: &'r str, by_date: bool) -> Self {
        if by_date {
            return Self::Date(extract_date(value).unwrap_or_default());
        }
        match sort_number(value) {
            Some(n) => Self::Number(n),
            None => Self::Text(value),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => collate(a, b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
            (Self::Date(_), _) => Ordering::Less,
            (_, Self::Date(_)) => Ordering::Greater,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    fn config() -> Config {
        Config {
            columns: vec![
                ColumnDescriptor::new("when", "Data"),
                ColumnDescriptor::new("name", "Nome"),
                ColumnDescriptor::new("score", "Nota"),
            ],
            fields: crate::config::Fields {
                timestamp: "when".into(),
                rating: "score".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn names(rows: &[&Record]) -> Vec<String> {
        rows.iter().map(|r| r.get("name").to_string()).collect()
    }

    const THREE: &str = "when,name,score\n\
        2025/08/05 09:00,Bruno,3\n\
        2025/08/04 10:02,Ana,5\n\
        2025/08/06 08:30,Carla,4\n";

    #[test]
    fn empty_search_and_filter_keep_everything_in_order() {
        let records = parse(THREE);
        let cfg = config();
        let view = TableView::new(&records, &cfg);
        assert_eq!(names(&view.filtered()), ["Bruno", "Ana", "Carla"]);
    }

    #[test]
    fn sorting_same_column_twice_toggles() {
        let records = parse(THREE);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);

        view.sort_by(1).unwrap();
        assert_eq!(names(&view.filtered()), ["Ana", "Bruno", "Carla"]);
        assert_eq!(
            view.state().sort.as_ref().unwrap().direction,
            SortDirection::Ascending
        );

        view.sort_by(1).unwrap();
        assert_eq!(names(&view.filtered()), ["Carla", "Bruno", "Ana"]);
        assert_eq!(
            view.state().sort.as_ref().unwrap().direction,
            SortDirection::Descending
        );
    }

    #[test]
    fn new_column_starts_ascending() {
        let records = parse(THREE);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);
        view.sort_by(1).unwrap();
        view.sort_by(1).unwrap();
        view.sort_by(2).unwrap();
        assert_eq!(names(&view.filtered()), ["Bruno", "Carla", "Ana"]);
    }

    #[test]
    fn date_column_sorts_by_date_with_epoch_fallback() {
        let text = "when,name,score\n\
            2025/08/05,B,1\n\
            sem data,X,1\n\
            2024/12/31,A,1\n";
        let records = parse(text);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);
        view.sort_by(0).unwrap();
        assert_eq!(names(&view.filtered()), ["X", "A", "B"]);
    }

    #[test]
    fn numeric_values_compare_as_numbers() {
        let text = "when,name,score\nx,a,10\nx,b,9\nx,c,100\n";
        let records = parse(text);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);
        view.sort_by(2).unwrap();
        assert_eq!(names(&view.filtered()), ["b", "a", "c"]);
    }

    #[test]
    fn sort_rejects_unknown_column() {
        let records = parse(THREE);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);
        let err = view.sort_by(9).unwrap_err();
        assert!(matches!(
            err,
            LensError::InvalidColumn {
                index: 9,
                available: 3
            }
        ));
    }

    #[test]
    fn search_is_case_insensitive_over_display_columns() {
        let text = "when,name,score,hidden\nx,Ana Souza,5,zebra\nx,Bruno,4,ana\n";
        let records = parse(text);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);
        view.set_search("SOUZA");
        assert_eq!(names(&view.filtered()), ["Ana Souza"]);
        // "hidden" is not a display column.
        view.set_search("zebra");
        assert!(view.filtered().is_empty());
    }

    #[test]
    fn filter_is_exact_on_filter_column() {
        let text = "when,name,score\nx,a,5\nx,b,4\nx,c,5 \nx,d,15\n";
        let records = parse(text);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);
        view.set_filter("5");
        // "5 " is trimmed at parse time; "15" is not an exact match.
        assert_eq!(names(&view.filtered()), ["a", "c"]);
    }

    #[test]
    fn search_and_filter_both_apply() {
        let text = "when,name,score\nx,Ana,5\nx,Ana,4\nx,Bia,5\n";
        let records = parse(text);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);
        view.set_filter("5");
        view.set_search("ana");
        assert_eq!(view.filtered_count(), 1);
    }

    fn many(n: usize) -> Vec<Record> {
        let mut text = String::from("when,name,score\n");
        for i in 0..n {
            text.push_str(&format!("x,r{i},3\n"));
        }
        parse(&text)
    }

    #[test]
    fn pagination_25_rows_three_pages() {
        let records = many(25);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);
        assert_eq!(view.page_count(), 3);
        assert_eq!(view.page_rows().len(), 10);
        view.set_page(3);
        let last = view.page_rows();
        assert_eq!(last.len(), 5);
        assert_eq!(last[0].get("name"), "r20");
        assert_eq!(view.showing(), (25, 25));
    }

    #[test]
    fn out_of_range_pages_are_empty_not_clamped() {
        let records = many(5);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);
        view.set_page(4);
        assert_eq!(view.state().page, 4);
        assert!(view.page_rows().is_empty());
        view.set_page(0);
        assert!(view.page_rows().is_empty());
    }

    #[test]
    fn huge_page_numbers_are_empty() {
        let records = many(25);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);
        // (page - 1) * 10 wraps to 4 without a checked multiply.
        view.set_page(1_844_674_407_370_955_163);
        assert!(view.page_rows().is_empty());
        assert_eq!(view.showing(), (25, 25));
        view.set_page(usize::MAX);
        assert!(view.page_rows().is_empty());
    }

    #[test]
    fn search_filter_and_sort_reset_page() {
        let records = many(25);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);
        view.set_page(3);
        view.set_search("r");
        assert_eq!(view.state().page, 1);
        view.set_page(2);
        view.set_filter("3");
        assert_eq!(view.state().page, 1);
        view.set_page(2);
        view.sort_by(1).unwrap();
        assert_eq!(view.state().page, 1);
    }

    #[test]
    fn state_round_trips_through_view() {
        let records = parse(THREE);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);
        view.sort_by(1).unwrap();
        view.set_search("a");
        let state = view.into_state();

        let view = TableView::new(&records, &cfg).with_state(state.clone());
        assert_eq!(view.state(), &state);
        assert_eq!(names(&view.filtered()), ["Ana", "Carla"]);
    }

    #[test]
    fn state_from_other_records_falls_back_to_file_order() {
        let records = parse(THREE);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);
        view.sort_by(1).unwrap();
        view.set_search("a");
        let state = view.into_state();

        let fewer = parse("when,name,score
x,Carla,1
x,Ana,2
");
        let view = TableView::new(&fewer, &cfg).with_state(state);
        assert!(view.state().sort.is_none());
        assert_eq!(view.state().search, "a");
        assert_eq!(names(&view.filtered()), ["Carla", "Ana"]);
    }

    #[test]
    fn export_follows_filter_and_order() {
        let records = parse(THREE);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);
        view.sort_by(1).unwrap();
        view.set_filter("5");
        let csv = view.export_filtered().unwrap();
        assert_eq!(
            csv,
            "when,name,score\r\n\"2025/08/04 10:02\",\"Ana\",\"5\""
        );
    }

    #[test]
    fn export_with_no_matches_is_none() {
        let records = parse(THREE);
        let cfg = config();
        let mut view = TableView::new(&records, &cfg);
        view.set_search("nobody");
        assert!(view.export_filtered().is_none());
    }
}

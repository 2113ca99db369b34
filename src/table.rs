//! The share table and the pure sort/filter routines that operate on it.
//!
//! [`sort_order`] and [`filter_visibility`] compute a new row order and a
//! visibility mask without touching the table; [`ShareTable::sort`] and
//! [`ShareTable::filter`] apply them.

use crate::classify::{classify_column, parse_number, ClassifierPolicy, ColumnKind};
use crate::natural::{locale_compare, natural_compare};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("Column {index} is out of range (table has {columns} columns)")]
    InvalidColumn { index: usize, columns: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => f.write_str("asc"),
            Self::Descending => f.write_str("desc"),
        }
    }
}

/// Which column the user last activated and in which direction.
///
/// Only a header activation changes it; reloading the table does not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    pub column: Option<usize>,
    pub direction: SortDirection,
}

impl SortState {
    /// State after activating `column`: the same column flips from ascending
    /// to descending, anything else starts ascending.
    pub fn activate(self, column: usize) -> Self {
        let direction = if self.column == Some(column) && self.direction == SortDirection::Ascending
        {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        Self {
            column: Some(column),
            direction,
        }
    }
}

/// Header marker for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIndicator {
    Unsorted,
    Ascending,
    Descending,
}

impl SortIndicator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Unsorted => "⇕",
            Self::Ascending => "▲",
            Self::Descending => "▼",
        }
    }
}

/// Fixed knobs for sorting and searching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSettings {
    /// Column that always sorts in natural order and is matched by search
    pub name_column: usize,
    /// Thousands separator removed before parsing and comparing
    pub grouping_separator: char,
    pub classifier: ClassifierPolicy,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            name_column: 1,
            grouping_separator: ',',
            classifier: ClassifierPolicy::Strict,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<String>,
    /// Index of the row in source order
    pub position: usize,
    pub visible: bool,
}

impl Row {
    pub fn new(cells: Vec<String>, position: usize) -> Self {
        Self {
            cells,
            position,
            visible: true,
        }
    }

    /// Cell text, or "" when a ragged row has no cell at `column`
    pub fn cell(&self, column: usize) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShareTable {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    sorted: Option<(usize, SortDirection)>,
}

impl ShareTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(position, cells)| Row::new(cells, position))
            .collect();
        Self {
            headers,
            rows,
            sorted: None,
        }
    }

    /// Number of columns: the header count, or the widest row when there is no header
    pub fn column_count(&self) -> usize {
        if !self.headers.is_empty() {
            self.headers.len()
        } else {
            self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
        }
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|r| r.visible)
    }

    pub fn visible_count(&self) -> usize {
        self.visible_rows().count()
    }

    /// Column and direction of the last applied sort
    pub fn sorted(&self) -> Option<(usize, SortDirection)> {
        self.sorted
    }

    pub fn indicator(&self, column: usize) -> SortIndicator {
        match self.sorted {
            Some((c, SortDirection::Ascending)) if c == column => SortIndicator::Ascending,
            Some((c, SortDirection::Descending)) if c == column => SortIndicator::Descending,
            _ => SortIndicator::Unsorted,
        }
    }

    /// Reorder all rows (hidden ones included) by `column`.
    ///
    /// Sorting a table without rows does nothing; otherwise `column` must be
    /// below [`column_count`](Self::column_count).
    pub fn sort(
        &mut self,
        column: usize,
        direction: SortDirection,
        settings: &TableSettings,
    ) -> Result<(), TableError> {
        if self.rows.is_empty() {
            return Ok(());
        }
        check_column(column, self.column_count())?;
        let order = order_rows(&self.rows, column, direction, settings);
        let mut slots: Vec<Option<Row>> = std::mem::take(&mut self.rows)
            .into_iter()
            .map(Some)
            .collect();
        self.rows = order.into_iter().filter_map(|i| slots[i].take()).collect();
        self.sorted = Some((column, direction));
        Ok(())
    }

    /// Show only rows whose name column contains `query`.
    pub fn filter(&mut self, query: &str, settings: &TableSettings) {
        let visibility = filter_visibility(&self.rows, query, settings);
        for (row, visible) in self.rows.iter_mut().zip(visibility) {
            row.visible = visible;
        }
    }
}

fn check_column(column: usize, columns: usize) -> Result<(), TableError> {
    if column >= columns {
        return Err(TableError::InvalidColumn {
            index: column,
            columns,
        });
    }
    Ok(())
}

fn compare_numbers(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        // Unparsable values sort below every number
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compute the stable order of `rows` when sorted by `column`.
///
/// Returns indices into `rows`. An empty row set yields an empty order; a
/// column past the widest row is an error.
pub fn sort_order(
    rows: &[Row],
    column: usize,
    direction: SortDirection,
    settings: &TableSettings,
) -> Result<Vec<usize>, TableError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let width = rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
    check_column(column, width)?;
    Ok(order_rows(rows, column, direction, settings))
}

fn order_rows(
    rows: &[Row],
    column: usize,
    direction: SortDirection,
    settings: &TableSettings,
) -> Vec<usize> {
    let sep = settings.grouping_separator;
    let keys: Vec<String> = rows
        .iter()
        .map(|r| r.cell(column).chars().filter(|c| *c != sep).collect())
        .collect();

    let kind = if column == settings.name_column {
        ColumnKind::Textual
    } else {
        classify_column(keys.iter().map(String::as_str), settings.classifier, sep)
    };

    let mut order: Vec<usize> = (0..rows.len()).collect();
    if column == settings.name_column {
        order.sort_by(|&a, &b| directed(natural_compare(&keys[a], &keys[b]), direction));
    } else if kind == ColumnKind::Numeric {
        let numbers: Vec<Option<f64>> = keys.iter().map(|k| parse_number(k, sep)).collect();
        order.sort_by(|&a, &b| directed(compare_numbers(numbers[a], numbers[b]), direction));
    } else {
        order.sort_by(|&a, &b| directed(locale_compare(&keys[a], &keys[b]), direction));
    }
    order
}

fn directed(ord: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    }
}

/// Visibility of each row for a search query.
///
/// Case-insensitive substring match on the name column; an empty query shows everything.
pub fn filter_visibility(rows: &[Row], query: &str, settings: &TableSettings) -> Vec<bool> {
    if query.is_empty() {
        return vec![true; rows.len()];
    }
    let needle = query.to_lowercase();
    rows.iter()
        .map(|r| r.cell(settings.name_column).to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ShareTable {
        ShareTable::new(
            vec!["#".into(), "NAME".into(), "LTP".into()],
            vec![
                vec!["1".into(), "Zeta".into(), "10".into()],
                vec!["2".into(), "Alpha2".into(), "9".into()],
                vec!["3".into(), "Alpha10".into(), "20".into()],
            ],
        )
    }

    fn names(table: &ShareTable) -> Vec<&str> {
        table.rows.iter().map(|r| r.cell(1)).collect()
    }

    #[test]
    fn test_sort_state_activation_cycle() {
        let s = SortState::default();
        assert_eq!(s.column, None);
        let s = s.activate(2);
        assert_eq!((s.column, s.direction), (Some(2), SortDirection::Ascending));
        let s = s.activate(2);
        assert_eq!(s.direction, SortDirection::Descending);
        let s = s.activate(2);
        assert_eq!(s.direction, SortDirection::Ascending);
        let s = s.activate(2).activate(4);
        assert_eq!((s.column, s.direction), (Some(4), SortDirection::Ascending));
    }

    #[test]
    fn test_name_column_uses_natural_order() {
        let mut t = sample();
        t.sort(1, SortDirection::Ascending, &TableSettings::default())
            .unwrap();
        assert_eq!(names(&t), vec!["Alpha2", "Alpha10", "Zeta"]);
    }

    #[test]
    fn test_numeric_column_sorts_by_value() {
        let mut t = sample();
        t.sort(2, SortDirection::Ascending, &TableSettings::default())
            .unwrap();
        assert_eq!(names(&t), vec!["Alpha2", "Zeta", "Alpha10"]);
        t.sort(2, SortDirection::Descending, &TableSettings::default())
            .unwrap();
        assert_eq!(names(&t), vec!["Alpha10", "Zeta", "Alpha2"]);
    }

    #[test]
    fn test_grouping_separator_stripped() {
        let mut t = ShareTable::new(
            vec!["#".into(), "NAME".into(), "VOLUME".into()],
            vec![
                vec!["1".into(), "A".into(), "1,200".into()],
                vec!["2".into(), "B".into(), "950".into()],
            ],
        );
        t.sort(2, SortDirection::Ascending, &TableSettings::default())
            .unwrap();
        assert_eq!(names(&t), vec!["B", "A"]);
    }

    #[test]
    fn test_strict_policy_falls_back_to_text() {
        let mut t = ShareTable::new(
            vec!["#".into(), "NAME".into(), "CHANGE".into()],
            vec![
                vec!["1".into(), "A".into(), "9".into()],
                vec!["2".into(), "B".into(), "N/A".into()],
                vec!["3".into(), "C".into(), "10".into()],
            ],
        );
        t.sort(2, SortDirection::Ascending, &TableSettings::default())
            .unwrap();
        // Textual: "10" < "9" < "N/A"
        assert_eq!(names(&t), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_lenient_policy_puts_unparsable_first() {
        let settings = TableSettings {
            classifier: ClassifierPolicy::Lenient,
            ..TableSettings::default()
        };
        let mut t = ShareTable::new(
            vec!["#".into(), "NAME".into(), "CHANGE".into()],
            vec![
                vec!["1".into(), "A".into(), "9".into()],
                vec!["2".into(), "B".into(), "N/A".into()],
                vec!["3".into(), "C".into(), "10".into()],
            ],
        );
        t.sort(2, SortDirection::Ascending, &settings).unwrap();
        assert_eq!(names(&t), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_out_of_range_column_is_error() {
        let mut t = sample();
        let err = t
            .sort(3, SortDirection::Ascending, &TableSettings::default())
            .unwrap_err();
        assert_eq!(
            err,
            TableError::InvalidColumn {
                index: 3,
                columns: 3
            }
        );
        // Table untouched
        assert_eq!(names(&t), vec!["Zeta", "Alpha2", "Alpha10"]);
        assert_eq!(t.sorted(), None);
    }

    #[test]
    fn test_empty_table_sort_and_filter_are_noops() {
        let mut t = ShareTable::default();
        assert!(t
            .sort(5, SortDirection::Ascending, &TableSettings::default())
            .is_ok());
        t.filter("x", &TableSettings::default());
        assert!(t.rows.is_empty());
        assert!(sort_order(&[], 0, SortDirection::Ascending, &TableSettings::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_rows_without_cells_reject_every_column() {
        let mut t = ShareTable::new(vec![], vec![vec![], vec![]]);
        assert_eq!(
            t.sort(5, SortDirection::Ascending, &TableSettings::default()),
            Err(TableError::InvalidColumn {
                index: 5,
                columns: 0
            })
        );
        assert_eq!(t.sorted(), None);
        assert_eq!(t.indicator(5), SortIndicator::Unsorted);
    }

    #[test]
    fn test_indicator_follows_last_sort() {
        let mut t = sample();
        assert_eq!(t.indicator(1), SortIndicator::Unsorted);
        t.sort(1, SortDirection::Descending, &TableSettings::default())
            .unwrap();
        assert_eq!(t.indicator(1), SortIndicator::Descending);
        assert_eq!(t.indicator(0), SortIndicator::Unsorted);
        t.sort(0, SortDirection::Ascending, &TableSettings::default())
            .unwrap();
        assert_eq!(t.indicator(0), SortIndicator::Ascending);
        assert_eq!(t.indicator(1), SortIndicator::Unsorted);
        assert_eq!(SortIndicator::Unsorted.symbol(), "⇕");
    }

    #[test]
    fn test_filter_matches_name_case_insensitively() {
        let mut t = sample();
        t.filter("alpha", &TableSettings::default());
        let visible: Vec<&str> = t.visible_rows().map(|r| r.cell(1)).collect();
        assert_eq!(visible, vec!["Alpha2", "Alpha10"]);
        t.filter("", &TableSettings::default());
        assert_eq!(t.visible_count(), 3);
    }

    #[test]
    fn test_sort_keeps_hidden_rows() {
        let mut t = sample();
        t.filter("zeta", &TableSettings::default());
        t.sort(2, SortDirection::Descending, &TableSettings::default())
            .unwrap();
        assert_eq!(t.rows.len(), 3);
        assert_eq!(t.visible_count(), 1);
        assert_eq!(names(&t), vec!["Alpha10", "Zeta", "Alpha2"]);
    }
}

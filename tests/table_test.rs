use dsetui::{
    filter_visibility, sort_order, ClassifierPolicy, Row, ShareTable, SortDirection, SortIndicator,
    TableError, TableSettings,
};
use proptest::prelude::*;

mod common;
use common::{names, sample_table, visible_names};

#[test]
fn test_scenario_name_and_numeric_columns() {
    let settings = TableSettings::default();
    let mut table = sample_table();

    table.sort(1, SortDirection::Ascending, &settings).unwrap();
    assert_eq!(names(&table), vec!["Alpha2", "Alpha10", "Zeta"]);

    table.sort(2, SortDirection::Ascending, &settings).unwrap();
    assert_eq!(names(&table), vec!["Alpha2", "Zeta", "Alpha10"]);
    let positions: Vec<usize> = table.rows.iter().map(|r| r.position).collect();
    assert_eq!(positions, vec![1, 0, 2]);
}

#[test]
fn test_descending_is_reverse_of_ascending() {
    let settings = TableSettings::default();
    for column in 0..3 {
        let mut asc = sample_table();
        asc.sort(column, SortDirection::Ascending, &settings).unwrap();
        let mut desc = sample_table();
        desc.sort(column, SortDirection::Descending, &settings).unwrap();

        let mut reversed = names(&asc);
        reversed.reverse();
        assert_eq!(names(&desc), reversed, "column {}", column);
    }
}

#[test]
fn test_sort_is_idempotent() {
    let settings = TableSettings::default();
    let mut table = sample_table();
    table.sort(2, SortDirection::Ascending, &settings).unwrap();
    let first = names(&table);
    table.sort(2, SortDirection::Ascending, &settings).unwrap();
    assert_eq!(names(&table), first);
}

#[test]
fn test_filter_alpha_then_clear() {
    let settings = TableSettings::default();
    let mut table = sample_table();

    table.filter("alpha", &settings);
    assert_eq!(visible_names(&table), vec!["Alpha2", "Alpha10"]);
    assert!(!table.rows[0].visible);

    table.filter("", &settings);
    assert_eq!(table.visible_count(), 3);
    assert_eq!(names(&table), vec!["Zeta", "Alpha2", "Alpha10"]);
}

#[test]
fn test_filter_only_looks_at_name_column() {
    let settings = TableSettings::default();
    let table = sample_table();
    // "10" appears in the LTP column of Zeta but only in the name of Alpha10
    assert_eq!(
        filter_visibility(&table.rows, "10", &settings),
        vec![false, false, true]
    );
}

#[test]
fn test_sort_order_is_pure() {
    let settings = TableSettings::default();
    let table = sample_table();
    let order = sort_order(&table.rows, 1, SortDirection::Descending, &settings).unwrap();
    assert_eq!(order, vec![0, 2, 1]);
    // The table itself is untouched
    assert_eq!(names(&table), vec!["Zeta", "Alpha2", "Alpha10"]);
    assert_eq!(table.indicator(1), SortIndicator::Unsorted);
}

#[test]
fn test_sort_order_rejects_column_past_widest_row() {
    let table = sample_table();
    assert_eq!(
        sort_order(&table.rows, 7, SortDirection::Ascending, &TableSettings::default()),
        Err(TableError::InvalidColumn {
            index: 7,
            columns: 3
        })
    );
}

#[test]
fn test_sort_order_rejects_any_column_when_rows_have_no_cells() {
    let rows = vec![Row::new(vec![], 0)];
    assert_eq!(
        sort_order(&rows, 9, SortDirection::Ascending, &TableSettings::default()),
        Err(TableError::InvalidColumn {
            index: 9,
            columns: 0
        })
    );
    assert!(sort_order(&[], 9, SortDirection::Ascending, &TableSettings::default())
        .unwrap()
        .is_empty());
}

#[test]
fn test_strict_and_lenient_disagree_on_mixed_column() {
    let rows = vec![
        vec!["1".to_string(), "A".to_string(), "1,500".to_string()],
        vec!["2".to_string(), "B".to_string(), "-".to_string()],
        vec!["3".to_string(), "C".to_string(), "200".to_string()],
    ];
    let headers = vec!["#".to_string(), "CODE".to_string(), "VOLUME".to_string()];

    let mut strict = ShareTable::new(headers.clone(), rows.clone());
    strict
        .sort(2, SortDirection::Ascending, &TableSettings::default())
        .unwrap();
    // Textual after separator stripping: "-" < "1500" < "200"
    assert_eq!(names(&strict), vec!["B", "A", "C"]);

    let lenient_settings = TableSettings {
        classifier: ClassifierPolicy::Lenient,
        ..TableSettings::default()
    };
    let mut lenient = ShareTable::new(headers, rows);
    lenient
        .sort(2, SortDirection::Ascending, &lenient_settings)
        .unwrap();
    // Numeric with "-" below every number: -, 200, 1500
    assert_eq!(names(&lenient), vec!["B", "C", "A"]);
}

#[test]
fn test_ragged_rows_sort_missing_cells_as_empty() {
    let mut table = ShareTable::new(
        vec!["#".into(), "CODE".into(), "LTP".into()],
        vec![
            vec!["1".into(), "B".into(), "5".into()],
            vec!["2".into(), "A".into()],
        ],
    );
    table
        .sort(2, SortDirection::Ascending, &TableSettings::default())
        .unwrap();
    assert_eq!(names(&table), vec!["A", "B"]);
}

fn row_strategy() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(
        ("[A-Z]{1,3}[0-9]{0,2}", "[0-9]{1,4}(\\.[0-9]{1,2})?", "[a-z]{0,3}"),
        0..20,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (code, price, note))| vec![(i + 1).to_string(), code, price, note])
            .collect()
    })
}

proptest! {
    #[test]
    fn sorting_never_drops_or_duplicates_rows(rows in row_strategy(), column in 0usize..4, descending in any::<bool>()) {
        let headers = vec!["#".to_string(), "CODE".to_string(), "LTP".to_string(), "NOTE".to_string()];
        let mut table = ShareTable::new(headers, rows.clone());
        let direction = if descending { SortDirection::Descending } else { SortDirection::Ascending };
        table.sort(column, direction, &TableSettings::default()).unwrap();

        let mut positions: Vec<usize> = table.rows.iter().map(|r| r.position).collect();
        positions.sort_unstable();
        prop_assert_eq!(positions, (0..rows.len()).collect::<Vec<_>>());
    }

    #[test]
    fn clearing_the_query_restores_every_row(rows in row_strategy(), query in "[a-zA-Z0-9]{1,3}") {
        let headers = vec!["#".to_string(), "CODE".to_string(), "LTP".to_string(), "NOTE".to_string()];
        let settings = TableSettings::default();
        let mut table = ShareTable::new(headers, rows.clone());
        table.filter(&query, &settings);
        table.filter("", &settings);
        prop_assert_eq!(table.visible_count(), rows.len());
    }
}

/// How a column's values are compared when sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Textual,
}

/// Policy deciding when a column counts as numeric.
///
/// The viewer always sorts with [`ClassifierPolicy::Strict`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClassifierPolicy {
    /// Every value must parse as a number
    #[default]
    Strict,
    /// Only the first value must parse; values that don't parse sort below all numbers
    Lenient,
}

/// Parse a display value as a number after removing grouping separators.
///
/// Only finite values are accepted, so "NaN" and "inf" are not numbers.
pub fn parse_number(value: &str, separator: char) -> Option<f64> {
    let stripped: String = value.chars().filter(|c| *c != separator).collect();
    stripped
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Decide whether a column should be compared numerically.
///
/// An empty column is textual under both policies.
pub fn classify_column<'a, I>(values: I, policy: ClassifierPolicy, separator: char) -> ColumnKind
where
    I: IntoIterator<Item = &'a str>,
{
    let mut values = values.into_iter().peekable();
    if values.peek().is_none() {
        return ColumnKind::Textual;
    }

    let numeric = match policy {
        ClassifierPolicy::Strict => values.all(|v| parse_number(v, separator).is_some()),
        ClassifierPolicy::Lenient => values
            .next()
            .map(|v| parse_number(v, separator).is_some())
            .unwrap_or(false),
    };

    if numeric {
        ColumnKind::Numeric
    } else {
        ColumnKind::Textual
    }
}

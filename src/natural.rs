//! String orderings used by the share table.
//!
//! [`natural_compare`] orders embedded digit runs by value ("Item2" before
//! "Item10") and is used for the trading code column. [`locale_compare`] is the
//! fixed-locale ordering used for every other textual column.

use std::cmp::Ordering;

/// One run of a tokenized string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// One or more ASCII digits
    Digits(&'a str),
    /// One or more non-digit characters
    Text(&'a str),
}

/// Split a string into alternating runs of ASCII digits and non-digits.
///
/// A leading `-` is part of a text run, so signed and fractional numbers are
/// not recognised as such.
pub fn tokenize(s: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_digits = None;

    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != is_digit => {
                tokens.push(make_token(&s[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(is_digit);
    }
    if let Some(is_digit) = in_digits {
        tokens.push(make_token(&s[start..], is_digit));
    }
    tokens
}

fn make_token(run: &str, is_digit: bool) -> Token<'_> {
    if is_digit {
        Token::Digits(run)
    } else {
        Token::Text(run)
    }
}

/// Compare two digit runs by integer value without parsing them.
fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_tokens(a: &Token<'_>, b: &Token<'_>) -> Ordering {
    match (a, b) {
        (Token::Digits(x), Token::Digits(y)) => compare_digit_runs(x, y),
        // A digit run always sorts before a text run at the same position
        (Token::Digits(_), Token::Text(_)) => Ordering::Less,
        (Token::Text(_), Token::Digits(_)) => Ordering::Greater,
        (Token::Text(x), Token::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
    }
}

/// Natural-order comparison.
///
/// Tokens are compared position by position and the first unequal position
/// decides. When every compared position is equal the string with fewer
/// tokens sorts first.
pub fn natural_compare(a: &str, b: &str) -> Ordering {
    let ax = tokenize(a);
    let bx = tokenize(b);

    for (x, y) in ax.iter().zip(bx.iter()) {
        let ord = compare_tokens(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ax.len().cmp(&bx.len())
}

/// Fixed-locale text comparison.
///
/// Primary order ignores case. Strings that differ only in case put the
/// lowercase letter first at the first differing position, then fall back
/// to the raw strings so the result is a total order.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| {
            a.chars()
                .zip(b.chars())
                .find(|(x, y)| x != y)
                .map(|(x, y)| y.is_lowercase().cmp(&x.is_lowercase()))
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.cmp(b))
}

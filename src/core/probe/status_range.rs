/*!
Accepted-status expressions for HTTP probes.

An expression is a comma-separated list of bare 3-digit status codes or
`A-B` ranges, e.g. `"200-299,301,404"`. Validation runs when the
configuration is loaded; probe-time matching assumes a validated
expression and treats anything unparsable as a non-match.
*/

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

/// A 3-digit status code between 100 and 599.
fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(1[0-9]{2}|[2-5][0-9]{2})$").expect("status code pattern compiles")
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusExprError {
    #[error("accepted status list must be at least 3 characters")]
    TooShort,
    #[error("cannot start or end with comma")]
    EdgeComma,
    #[error("duplicated value at item {0}")]
    Duplicate(usize),
    #[error("value at item {0} is empty")]
    EmptyItem(usize),
    #[error("range at item {0} must have exactly one \"-\"")]
    MalformedRange(usize),
    #[error("range start value \"{value}\" at item {index} is not a number from 100-599")]
    RangeStart { index: usize, value: String },
    #[error("range end value \"{value}\" at item {index} is not a number from 100-599")]
    RangeEnd { index: usize, value: String },
    #[error("range start value has to be less than the end value at item {0}")]
    RangeOrder(usize),
    #[error("value \"{value}\" at item {index} is not a number from 100-599")]
    NotACode { index: usize, value: String },
}

/// Validate an acceptance expression.
///
/// Duplicate detection is exact string comparison, so `"200"` and
/// `"200-200"` are distinct tokens (the latter fails the order rule
/// anyway).
pub fn validate(expr: &str) -> Result<(), StatusExprError> {
    if expr.len() < 3 {
        return Err(StatusExprError::TooShort);
    }
    if expr.starts_with(',') || expr.ends_with(',') {
        return Err(StatusExprError::EdgeComma);
    }

    let mut seen = HashSet::new();
    for (index, item) in expr.split(',').enumerate() {
        if !seen.insert(item) {
            return Err(StatusExprError::Duplicate(index));
        }
        if item.is_empty() {
            return Err(StatusExprError::EmptyItem(index));
        }

        if item.contains('-') {
            let parts: Vec<&str> = item.split('-').collect();
            if parts.len() != 2 {
                return Err(StatusExprError::MalformedRange(index));
            }
            let (left, right) = (parts[0], parts[1]);
            if !code_pattern().is_match(left) {
                return Err(StatusExprError::RangeStart {
                    index,
                    value: left.to_string(),
                });
            }
            if !code_pattern().is_match(right) {
                return Err(StatusExprError::RangeEnd {
                    index,
                    value: right.to_string(),
                });
            }
            let lo: u16 = left.parse().map_err(|_| StatusExprError::RangeStart {
                index,
                value: left.to_string(),
            })?;
            let hi: u16 = right.parse().map_err(|_| StatusExprError::RangeEnd {
                index,
                value: right.to_string(),
            })?;
            if lo >= hi {
                return Err(StatusExprError::RangeOrder(index));
            }
        } else if !code_pattern().is_match(item) {
            return Err(StatusExprError::NotACode {
                index,
                value: item.to_string(),
            });
        }
    }

    Ok(())
}

/// True when any token of the expression accepts the status code.
///
/// An absent status (request died below the HTTP layer) never matches.
pub fn matches(status: Option<u16>, expr: &str) -> bool {
    let Some(code) = status else {
        return false;
    };

    expr.split(',').any(|item| match item.split_once('-') {
        Some((left, right)) => match (left.parse::<u16>(), right.parse::<u16>()) {
            (Ok(lo), Ok(hi)) => lo <= code && code <= hi,
            _ => false,
        },
        None => item.parse::<u16>().map_or(false, |single| single == code),
    })
}

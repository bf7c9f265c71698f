//! Inline expressions for data nodes, e.g. `ds_${0..1}.t_order_${[0, 1]}`.

use lazy_static::lazy_static;
use regex::Regex;

use super::Error;

lazy_static! {
    static ref SEGMENT: Regex = Regex::new(r"\$\{([^}]*)\}").unwrap();
}

/// Expand an inline expression into every name it describes,
/// in declaration order.
pub fn expand(expression: &str) -> Result<Vec<String>, Error> {
    let mut result = vec![String::new()];
    let mut last = 0;

    for capture in SEGMENT.captures_iter(expression) {
        let (Some(whole), Some(inner)) = (capture.get(0), capture.get(1)) else {
            continue;
        };
        let literal = &expression[last..whole.start()];
        let values = segment(inner.as_str())
            .ok_or_else(|| Error::InlineExpression(expression.to_string()))?;

        result = result
            .iter()
            .flat_map(|prefix| {
                values
                    .iter()
                    .map(move |value| format!("{}{}{}", prefix, literal, value))
            })
            .collect();
        last = whole.end();
    }

    let tail = &expression[last..];
    if tail.contains("${") {
        return Err(Error::InlineExpression(expression.to_string()));
    }

    Ok(result
        .into_iter()
        .map(|prefix| format!("{}{}", prefix, tail))
        .collect())
}

// `0..3` or `[a, 'b', 3]`
fn segment(inner: &str) -> Option<Vec<String>> {
    let inner = inner.trim();

    if let Some((start, end)) = inner.split_once("..") {
        let start: i64 = start.trim().parse().ok()?;
        let end: i64 = end.trim().parse().ok()?;
        if start > end {
            return None;
        }
        return Some((start..=end).map(|v| v.to_string()).collect());
    }

    let list = inner.strip_prefix('[')?.strip_suffix(']')?;
    let values = list
        .split(',')
        .map(|v| v.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>();

    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

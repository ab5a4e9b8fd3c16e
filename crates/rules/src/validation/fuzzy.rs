//! Operator suggestions and id style checks for the validation pass.

use crate::schema::SUPPORTED_OPERATORS;

/// Spellings people reach for that map onto a supported operator.
const OPERATOR_ALIASES: &[(&str, &str)] = &[
    ("==", "="),
    ("eq", "="),
    ("equals", "="),
    (">=", ">"),
    ("gt", ">"),
    ("<=", "<"),
    ("lt", "<"),
    ("one of", "IN"),
];

/// Supported operator closest to an unknown `symbol`, if any is close.
///
/// Case differences and known aliases win outright; otherwise the nearest
/// operator by edit distance is returned when it is within half the
/// longer length.
pub(crate) fn suggest_operator(symbol: &str) -> Option<&'static str> {
    let lowered = symbol.trim().to_lowercase();
    if let Some(op) = SUPPORTED_OPERATORS
        .iter()
        .find(|op| op.to_lowercase() == lowered)
    {
        return Some(*op);
    }
    if let Some((_, op)) = OPERATOR_ALIASES.iter().find(|(alias, _)| *alias == lowered) {
        return Some(*op);
    }

    let (op, distance) = SUPPORTED_OPERATORS
        .iter()
        .map(|op| (*op, levenshtein(&lowered, &op.to_lowercase())))
        .min_by_key(|(_, d)| *d)?;
    let longest = lowered.chars().count().max(op.chars().count());
    (distance <= longest / 2).then_some(op)
}

/// Edit distance (insert, delete, substitute) between two strings.
pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == *cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

/// `purchase-approval`, `rules-2024`: lowercase alphanumeric words joined by
/// single hyphens.
pub(crate) fn is_kebab_case(s: &str) -> bool {
    !s.is_empty()
        && s.split('-').all(|word| {
            !word.is_empty() && word.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

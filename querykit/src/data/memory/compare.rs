//! Value comparison and LIKE matching for JSON records

use std::cmp::Ordering;

use serde_json::Value;

use crate::data::filters::{Scalar, parse_datetime};

/// String form of a JSON value (strings unquoted)
pub(super) fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn integer_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Integers compare exactly; anything else falls back to `f64`
fn compare_integer(actual: &Value, expected: i64) -> Option<Ordering> {
    match integer_of(actual) {
        Some(a) => Some(a.cmp(&expected)),
        None => number_of(actual).and_then(|a| a.partial_cmp(&(expected as f64))),
    }
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Order a record value against an operand
///
/// Returns `None` when the two cannot be compared; null never compares.
/// Text operands compare numerically against numeric fields when they parse
/// as numbers, the same coercion SQLite applies to INTEGER/REAL columns.
pub(super) fn compare(actual: &Value, expected: &Scalar) -> Option<Ordering> {
    if actual.is_null() {
        return None;
    }

    match expected {
        Scalar::DateTime(dt) => {
            let Value::String(s) = actual else {
                return None;
            };
            parse_datetime(s).ok().map(|a| a.cmp(dt))
        }
        Scalar::Integer(i) => compare_integer(actual, *i),
        Scalar::Float(f) => number_of(actual).and_then(|a| a.partial_cmp(f)),
        Scalar::Bool(b) => match actual {
            Value::Bool(a) => Some(a.cmp(b)),
            _ => None,
        },
        Scalar::Text(s) => match actual {
            Value::Number(n) => match s.trim().parse::<i64>() {
                Ok(e) if n.is_i64() => compare_integer(actual, e),
                _ => match (n.as_f64(), s.trim().parse::<f64>()) {
                    (Some(a), Ok(e)) => a.partial_cmp(&e),
                    _ => Some(text_of(actual).as_str().cmp(s.as_str())),
                },
            },
            Value::String(a) => Some(a.as_str().cmp(s.as_str())),
            Value::Bool(_) => Some(text_of(actual).as_str().cmp(s.as_str())),
            _ => None,
        },
    }
}

/// SQL `LIKE` with `%`, `_` and `\` as the escape character (case-sensitive)
pub(super) fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern = tokenize(pattern);

    // dp[j]: text[..i] matches pattern[..j]
    let mut dp = vec![false; pattern.len() + 1];
    dp[0] = true;
    for (j, token) in pattern.iter().enumerate() {
        dp[j + 1] = dp[j] && matches!(token, Token::Any);
    }

    for c in &text {
        let mut next = vec![false; pattern.len() + 1];
        for (j, token) in pattern.iter().enumerate() {
            next[j + 1] = match token {
                Token::Any => next[j] || dp[j + 1],
                Token::One => dp[j],
                Token::Literal(l) => dp[j] && l == c,
            };
        }
        dp = next;
    }

    dp[pattern.len()]
}

enum Token {
    Any,
    One,
    Literal(char),
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => Token::Any,
            '_' => Token::One,
            '\\' => Token::Literal(chars.next().unwrap_or('\\')),
            other => Token::Literal(other),
        });
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_like_wildcards() {
        assert!(like("anna", "%an%"));
        assert!(like("anna", "an%"));
        assert!(!like("hannah", "an%"));
        assert!(like("hannah", "%ah"));
        assert!(like("bob", "b_b"));
        assert!(!like("bob", "b_"));
        assert!(like("", "%"));
        assert!(!like("", "_"));
    }

    #[test]
    fn test_like_escapes() {
        assert!(like("100%", "100\\%"));
        assert!(!like("1000", "100\\%"));
        assert!(like("a_b", "%\\_%"));
        assert!(!like("ab", "%\\_%"));
        assert!(like("c:\\dir", "%\\\\%"));
    }

    #[test]
    fn test_like_is_case_sensitive() {
        assert!(!like("Anna", "an%"));
    }

    #[test]
    fn test_compare_numbers() {
        assert_eq!(compare(&json!(34), &Scalar::from(30_i64)), Some(Ordering::Greater));
        assert_eq!(compare(&json!(34), &Scalar::from("30")), Some(Ordering::Greater));
        assert_eq!(compare(&json!(9), &Scalar::from("10")), Some(Ordering::Less));
        assert_eq!(compare(&json!(2.5), &Scalar::from(2.5)), Some(Ordering::Equal));
    }

    #[test]
    fn test_compare_large_integers_exactly() {
        let stored = json!(9_007_199_254_740_992_i64);
        assert_eq!(
            compare(&stored, &Scalar::from(9_007_199_254_740_993_i64)),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare(&stored, &Scalar::from("9007199254740993")),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare(&json!("9007199254740993"), &Scalar::from(9_007_199_254_740_993_i64)),
            Some(Ordering::Equal)
        );
        assert_eq!(compare(&json!(2.5), &Scalar::from(2_i64)), Some(Ordering::Greater));
    }

    #[test]
    fn test_compare_text_is_lexicographic() {
        assert_eq!(compare(&json!("9"), &Scalar::from("10")), Some(Ordering::Greater));
        assert_eq!(compare(&json!("Anna"), &Scalar::from("B")), Some(Ordering::Less));
    }

    #[test]
    fn test_compare_dates_chronologically() {
        let operand = Scalar::DateTime(parse_datetime("2024-01-01T00:00:00").unwrap());
        assert_eq!(
            compare(&json!("2024-06-01T00:00:00"), &operand),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare(&json!("2023-01-01T00:00:00"), &operand),
            Some(Ordering::Less)
        );
        assert_eq!(compare(&json!("soon"), &operand), None);
    }

    #[test]
    fn test_null_never_compares() {
        assert_eq!(compare(&Value::Null, &Scalar::from("x")), None);
        assert_eq!(compare(&Value::Null, &Scalar::from(1_i64)), None);
    }
}

//! Criteria parsing
//!
//! Parses JSON criteria lists into [`Criterion`] values with validation.

use crate::core::config::FiltersConfig;

use super::criterion::{Criterion, RawCriterion};
use super::error::FilterError;
use super::operation::Operation;
use super::path::FieldPath;

/// Parse criteria from a JSON array
///
/// Enforces the configured size and count limits, resolves operation tags and
/// validates each criterion before returning.
pub fn parse_criteria(
    json_str: &str,
    limits: &FiltersConfig,
) -> Result<Vec<Criterion>, FilterError> {
    if json_str.len() > limits.max_json_bytes {
        return Err(FilterError::TooLarge {
            max: limits.max_json_bytes,
        });
    }

    let raw: Vec<RawCriterion> =
        serde_json::from_str(json_str).map_err(|e| FilterError::InvalidJson(e.to_string()))?;

    if raw.len() > limits.max_criteria {
        return Err(FilterError::TooMany {
            max: limits.max_criteria,
        });
    }

    let criteria = raw
        .into_iter()
        .map(Criterion::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    for criterion in &criteria {
        validate_criterion(criterion)?;
    }

    tracing::debug!(count = criteria.len(), "Parsed filter criteria");
    Ok(criteria)
}

/// Check a criterion without a query context
///
/// Covers the key-path shape, value presence, value shape and date parsing.
/// Field and relation names can only be checked by a schema-aware builder.
pub fn validate_criterion(criterion: &Criterion) -> Result<(), FilterError> {
    let operation = criterion.operator();
    FieldPath::parse(criterion.key(), operation, operation.hops())?;

    if !operation.requires_value() {
        return Ok(());
    }

    match operation {
        Operation::In | Operation::NotIn => {
            criterion.list()?;
        }
        Operation::EqualDate
        | Operation::NotEqualDate
        | Operation::GreaterThanDate
        | Operation::LessThanDate
        | Operation::GreaterThanEqualDate
        | Operation::LessThanEqualDate => {
            criterion.scalar()?.to_datetime()?;
        }
        _ => {
            criterion.scalar()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> FiltersConfig {
        FiltersConfig::default()
    }

    #[test]
    fn parse_criteria_valid_json() {
        let json = r#"[
            {"key": "name", "operator": "MATCH", "value": "ann"}
        ]"#;
        let result = parse_criteria(json, &limits());
        assert!(result.is_ok());
        assert_eq!(result.unwrap().len(), 1);
    }

    #[test]
    fn parse_criteria_multiple() {
        let json = r#"[
            {"key": "name", "operator": "MATCH", "value": "ann"},
            {"key": "tags", "operator": "IS_EMPTY"},
            {"key": "birthDate", "operator": "GREATER_THAN_EQUAL_DATE", "value": "2000-01-01T00:00:00"}
        ]"#;
        let criteria = parse_criteria(json, &limits()).unwrap();
        assert_eq!(criteria.len(), 3);
        assert_eq!(criteria[1].operator(), Operation::IsEmpty);
    }

    #[test]
    fn parse_criteria_invalid_json() {
        let result = parse_criteria("not valid json", &limits());
        assert!(matches!(result, Err(FilterError::InvalidJson(_))));
    }

    #[test]
    fn parse_criteria_unknown_operation() {
        let json = r#"[{"key": "name", "operator": "SOUNDS_LIKE", "value": "ann"}]"#;
        let result = parse_criteria(json, &limits());
        assert!(matches!(result, Err(FilterError::UnknownOperation(_))));
    }

    #[test]
    fn parse_criteria_bad_join_key() {
        let json = r#"[{"key": "city", "operator": "MATCH_JOIN", "value": "x"}]"#;
        let result = parse_criteria(json, &limits());
        assert!(matches!(result, Err(FilterError::InvalidKeyPath { .. })));
    }

    #[test]
    fn parse_criteria_bad_date() {
        let json = r#"[{"key": "birthDate", "operator": "LESS_THAN_DATE", "value": "yesterday"}]"#;
        let result = parse_criteria(json, &limits());
        assert!(matches!(result, Err(FilterError::InvalidDate { .. })));
    }

    #[test]
    fn parse_criteria_missing_value() {
        let json = r#"[{"key": "name", "operator": "EQUAL"}]"#;
        let result = parse_criteria(json, &limits());
        assert!(matches!(result, Err(FilterError::MissingValue { .. })));
    }

    #[test]
    fn parse_criteria_too_large() {
        let config = FiltersConfig {
            max_json_bytes: 16,
            ..FiltersConfig::default()
        };
        let json = r#"[{"key": "name", "operator": "EQUAL", "value": "x"}]"#;
        let result = parse_criteria(json, &config);
        assert!(matches!(result, Err(FilterError::TooLarge { max: 16 })));
    }

    #[test]
    fn parse_criteria_too_many() {
        let config = FiltersConfig {
            max_criteria: 1,
            ..FiltersConfig::default()
        };
        let json = r#"[
            {"key": "a", "operator": "EQUAL_NULL"},
            {"key": "b", "operator": "EQUAL_NULL"}
        ]"#;
        let result = parse_criteria(json, &config);
        assert!(matches!(result, Err(FilterError::TooMany { max: 1 })));
    }

    #[test]
    fn validate_accepts_scalar_for_in() {
        let criterion = Criterion::new("status", Operation::In, "open");
        assert!(validate_criterion(&criterion).is_ok());
    }

    #[test]
    fn validate_rejects_list_for_match() {
        let criterion = Criterion::new("name", Operation::Match, vec!["a", "b"]);
        assert!(matches!(
            validate_criterion(&criterion),
            Err(FilterError::InvalidValue { .. })
        ));
    }
}

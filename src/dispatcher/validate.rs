//! Declared-parameter checks run before a handler is invoked.

use crate::error::DispatchError;
use crate::router::{ParamRule, RouteEntry};
use crate::spec::ParamType;
use serde_json::Value;
use std::collections::HashMap;

/// Fill absent parameters that declare a `default`.
pub(crate) fn apply_defaults(rules: &[ParamRule], params: &mut HashMap<String, String>) {
    for rule in rules {
        let Some(default) = &rule.param.default else {
            continue;
        };
        if params.contains_key(&rule.param.name) {
            continue;
        }
        let value = match default {
            Value::String(s) => s.clone(),
            Value::Null => continue,
            other => other.to_string(),
        };
        params.insert(rule.param.name.clone(), value);
    }
}

/// Check every declared URI, query and header parameter. All problems are collected so the
/// client sees them in one response.
pub(crate) fn validate_params(
    route: &RouteEntry,
    path_params: &HashMap<String, String>,
    query_params: &HashMap<String, String>,
    headers: &HashMap<String, String>,
) -> Result<(), DispatchError> {
    let mut problems = Vec::new();
    for rule in &route.uri_params {
        check(rule, path_params.get(&rule.param.name).map(String::as_str), &mut problems);
    }
    for rule in &route.query_params {
        check(rule, query_params.get(&rule.param.name).map(String::as_str), &mut problems);
    }
    for rule in &route.headers {
        let value = headers
            .get(&rule.param.name.to_ascii_lowercase())
            .map(String::as_str);
        check(rule, value, &mut problems);
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(DispatchError::InvalidParameters { details: problems })
    }
}

fn check(rule: &ParamRule, value: Option<&str>, problems: &mut Vec<String>) {
    let p = &rule.param;
    let Some(value) = value else {
        if p.required {
            problems.push(format!("missing required {} parameter '{}'", p.location, p.name));
        }
        return;
    };

    let mut fail = |msg: String| problems.push(format!("{} parameter '{}' {msg}", p.location, p.name));

    let numeric = match p.param_type {
        ParamType::Integer => match value.parse::<i64>() {
            Ok(n) => Some(n as f64),
            Err(_) => {
                fail(format!("must be an integer, got '{value}'"));
                return;
            }
        },
        ParamType::Number => match value.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(n),
            _ => {
                fail(format!("must be a number, got '{value}'"));
                return;
            }
        },
        ParamType::Boolean => {
            if value != "true" && value != "false" {
                fail(format!("must be 'true' or 'false', got '{value}'"));
            }
            None
        }
        _ => None,
    };

    if !p.enum_values.is_empty() && !p.enum_values.iter().any(|e| e == value) {
        fail(format!("must be one of [{}]", p.enum_values.join(", ")));
    }
    if let Some(re) = &rule.regex {
        if !re.is_match(value) {
            fail(format!("does not match pattern '{}'", re.as_str()));
        }
    }
    if let Some(n) = numeric {
        if let Some(min) = p.minimum.filter(|min| n < *min) {
            fail(format!("must be >= {min}"));
        }
        if let Some(max) = p.maximum.filter(|max| n > *max) {
            fail(format!("must be <= {max}"));
        }
    }
    let len = value.chars().count();
    if let Some(min) = p.min_length.filter(|min| len < *min) {
        fail(format!("must be at least {min} characters"));
    }
    if let Some(max) = p.max_length.filter(|max| len > *max) {
        fail(format!("must be at most {max} characters"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::RouteTable;
    use crate::spec::load_str;
    use std::sync::Arc;

    fn route(raml: &str) -> Arc<RouteEntry> {
        let table = RouteTable::compile(&load_str(raml).unwrap()).unwrap();
        Arc::clone(&table.entries()[0])
    }

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    const SEARCH: &str = r#"#%RAML 1.0
title: Search
/items/{id}:
  uriParameters:
    id:
      type: integer
      minimum: 1
  get:
    queryParameters:
      sort:
        enum: [asc, desc]
        default: asc
      code?:
        pattern: "[A-Z]{3}"
      flag?: boolean
    headers:
      X-Tenant:
        minLength: 2
"#;

    #[test]
    fn valid_request_passes() {
        let r = route(SEARCH);
        let mut query = map(&[("code", "ABC"), ("flag", "true")]);
        apply_defaults(&r.query_params, &mut query);
        assert_eq!(query.get("sort").map(String::as_str), Some("asc"));
        validate_params(&r, &map(&[("id", "7")]), &query, &map(&[("x-tenant", "acme")])).unwrap();
    }

    #[test]
    fn all_problems_are_reported() {
        let r = route(SEARCH);
        let err = validate_params(
            &r,
            &map(&[("id", "0")]),
            &map(&[("sort", "sideways"), ("code", "abc"), ("flag", "yes")]),
            &HashMap::new(),
        )
        .unwrap_err();
        let DispatchError::InvalidParameters { details } = err else {
            panic!("expected InvalidParameters");
        };
        assert_eq!(details.len(), 5, "{details:?}");
        assert!(details[0].contains("'id' must be >= 1"));
        assert!(details.iter().any(|d| d.contains("one of [asc, desc]")));
        assert!(details.iter().any(|d| d.contains("does not match pattern")));
        assert!(details.iter().any(|d| d.contains("'flag' must be 'true' or 'false'")));
        assert!(details.iter().any(|d| d.contains("missing required header parameter 'X-Tenant'")));
    }

    #[test]
    fn integer_type_is_enforced() {
        let r = route(SEARCH);
        let err = validate_params(
            &r,
            &map(&[("id", "abc")]),
            &map(&[("sort", "asc")]),
            &map(&[("x-tenant", "acme")]),
        )
        .unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(err.to_string().contains("must be an integer"));
    }
}

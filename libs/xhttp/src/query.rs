//! Query-string rewriting used by the GET and DELETE hooks.

use crate::config::Params;
use crate::error::BoxError;
use serde_json::Value;
use url::Url;

/// Stringify a parameter value for use in a query string.
///
/// Strings are used verbatim, numbers and booleans use their display form,
/// `null` becomes empty and arrays/objects are rendered as compact JSON.
pub fn query_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Percent-encode `params` as a query string, sorted by key.
///
/// # Errors
/// Returns an error if form encoding fails.
pub fn encode_params(params: &Params) -> Result<String, serde_urlencoded::ser::Error> {
    let pairs: Vec<(&str, String)> = params
        .iter()
        .map(|(key, value)| (key.as_str(), query_value(value)))
        .collect();
    serde_urlencoded::to_string(pairs)
}

/// Replace the query of `url` with the encoded `params`.
///
/// Any query already present in `url` is dropped. Empty `params` leave the
/// URL without a query string.
///
/// # Errors
/// Returns an error if `url` is not an absolute URL or encoding fails.
pub fn with_query(url: &str, params: &Params) -> Result<String, BoxError> {
    let mut parsed = Url::parse(url)?;
    let encoded = encode_params(params)?;
    parsed.set_query((!encoded.is_empty()).then_some(encoded.as_str()));
    Ok(parsed.into())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_query_value_forms() {
        assert_eq!(query_value(&json!("a b")), "a b");
        assert_eq!(query_value(&json!(42)), "42");
        assert_eq!(query_value(&json!(1.5)), "1.5");
        assert_eq!(query_value(&json!(true)), "true");
        assert_eq!(query_value(&json!(null)), "");
        assert_eq!(query_value(&json!([1, 2])), "[1,2]");
        assert_eq!(query_value(&json!({"k": "v"})), r#"{"k":"v"}"#);
    }

    #[test]
    fn test_encode_params_sorted_and_escaped() {
        let encoded = encode_params(&params(json!({"z": 1, "a": "x y", "m": "&="}))).unwrap();
        assert_eq!(encoded, "a=x+y&m=%26%3D&z=1");
    }

    #[test]
    fn test_with_query_appends_params() {
        let url = with_query("http://x/a", &params(json!({"q": "1"}))).unwrap();
        assert_eq!(url, "http://x/a?q=1");
    }

    #[test]
    fn test_with_query_empty_params_leaves_no_question_mark() {
        let url = with_query("http://x/a", &Params::new()).unwrap();
        assert_eq!(url, "http://x/a");
    }

    #[test]
    fn test_with_query_replaces_existing_query() {
        let params = params(json!({"q": "1"}));
        let url = with_query("http://x/a?b=2", &params).unwrap();
        assert_eq!(url, "http://x/a?q=1");
        assert_eq!(url.split_once('?').unwrap().1, encode_params(&params).unwrap());
    }

    #[test]
    fn test_with_query_empty_params_drops_existing_query() {
        let url = with_query("http://x/a?b=2", &Params::new()).unwrap();
        assert_eq!(url, "http://x/a");
    }

    #[test]
    fn test_with_query_rejects_relative_url() {
        assert!(with_query("/relative/path", &Params::new()).is_err());
    }
}

pub mod health;
pub mod messages;
pub mod threads;

use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{ApiError, ApiResult};

/// An id as it may arrive in a JSON body: a number or a numeric string.
/// Anything else is kept so it can be reported back.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdInput {
    Int(i64),
    Text(String),
    Other(serde_json::Value),
}

impl IdInput {
    pub fn parse(&self) -> Option<i64> {
        match self {
            IdInput::Int(id) => Some(*id),
            IdInput::Text(text) => text.trim().parse().ok(),
            IdInput::Other(_) => None,
        }
    }

    fn display(&self) -> String {
        match self {
            IdInput::Int(id) => id.to_string(),
            IdInput::Text(text) => text.clone(),
            IdInput::Other(value) => value.to_string(),
        }
    }
}

/// Parse a body id, naming the field in the error
pub(crate) fn body_id(field: &str, input: &IdInput) -> ApiResult<i64> {
    input
        .parse()
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid {} ID: {}", field, input.display())))
}

/// Parse an id taken from a query string or path segment
pub(crate) fn text_id(field: &str, raw: Option<&str>) -> ApiResult<i64> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required.", field)))?;
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("{} must be an integer.", field)))
}

/// `limit`/`offset` as raw query text
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[param(value_type = Option<u64>)]
    pub limit: Option<String>,
    #[param(value_type = Option<u64>)]
    pub offset: Option<String>,
}

/// Paging values that fail to parse fall back to the configured defaults
pub(crate) fn lenient_number(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_input_accepts_numbers_and_numeric_strings() {
        let ids: Vec<IdInput> = serde_json::from_str(r#"[1, "2", "x", 1.5, null]"#).unwrap();
        let parsed: Vec<Option<i64>> = ids.iter().map(IdInput::parse).collect();
        assert_eq!(parsed, vec![Some(1), Some(2), None, None, None]);
    }

    #[test]
    fn test_text_id_messages() {
        assert_eq!(text_id("user_id", Some("12")).unwrap(), 12);
        assert!(matches!(text_id("user_id", None), Err(ApiError::BadRequest(ref m)) if m == "user_id is required."));
        assert!(matches!(text_id("user_id", Some("")), Err(ApiError::BadRequest(_))));
        assert!(matches!(
            text_id("user_id", Some("abc")),
            Err(ApiError::BadRequest(ref m)) if m == "user_id must be an integer."
        ));
    }

    #[test]
    fn test_body_id_message() {
        let input = IdInput::Text("bob".into());
        assert!(matches!(
            body_id("participant", &input),
            Err(ApiError::BadRequest(ref m)) if m == "Invalid participant ID: bob"
        ));
    }

    #[test]
    fn test_lenient_number_ignores_garbage() {
        assert_eq!(lenient_number(Some("5")), Some(5));
        assert_eq!(lenient_number(Some("abc")), None);
        assert_eq!(lenient_number(Some("-1")), None);
        assert_eq!(lenient_number(None), None);
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

/// Body of `POST /api/mongo/insert`: `{ "doc": { ...fields } }`.
#[derive(Debug, Deserialize, Validate)]
pub struct InsertDocumentRequest {
    #[validate(custom(function = "validate_field_names"))]
    pub doc: Map<String, Value>,
}

/// Field names at every depth, including objects inside arrays, must be
/// non-empty and must not start with `$`.
fn validate_field_names(doc: &Map<String, Value>) -> Result<(), ValidationError> {
    for (name, value) in doc {
        if name.is_empty() {
            return Err(ValidationError::new("empty_field_name"));
        }
        if name.starts_with('$') {
            let mut err = ValidationError::new("operator_field_name");
            err.message = Some(format!("field name '{}' must not start with '$'", name).into());
            return Err(err);
        }
        validate_nested_names(value)?;
    }
    Ok(())
}

fn validate_nested_names(value: &Value) -> Result<(), ValidationError> {
    match value {
        Value::Object(fields) => validate_field_names(fields),
        Value::Array(items) => items.iter().try_for_each(validate_nested_names),
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResponse {
    pub inserted_id: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> Result<InsertDocumentRequest, serde_json::Error> {
        serde_json::from_value(body)
    }

    #[test]
    fn accepts_arbitrary_fields() {
        let req = parse(json!({ "doc": { "name": "alice", "tags": [1, 2], "nested": { "a": 1 } } }))
            .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.doc.len(), 3);
    }

    #[test]
    fn accepts_empty_document() {
        let req = parse(json!({ "doc": {} })).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn missing_doc_does_not_parse() {
        assert!(parse(json!({})).is_err());
        assert!(parse(json!({ "document": { "a": 1 } })).is_err());
    }

    #[test]
    fn non_object_doc_does_not_parse() {
        assert!(parse(json!({ "doc": "hello" })).is_err());
        assert!(parse(json!({ "doc": [1, 2, 3] })).is_err());
        assert!(parse(json!({ "doc": null })).is_err());
    }

    #[test]
    fn rejects_operator_and_empty_field_names() {
        let req = parse(json!({ "doc": { "$where": "1" } })).unwrap();
        assert!(req.validate().is_err());

        let req = parse(json!({ "doc": { "": 1 } })).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_operator_names_at_any_depth() {
        let req = parse(json!({ "doc": { "a": { "$where": 1 } } })).unwrap();
        assert!(req.validate().is_err());

        let req = parse(json!({ "doc": { "items": [{ "ok": 1 }, { "$gt": 2 }] } })).unwrap();
        assert!(req.validate().is_err());

        let req = parse(json!({ "doc": { "a": { "b": [[{ "": 0 }]] } } })).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn dollar_inside_values_is_allowed() {
        let req = parse(json!({ "doc": { "price": "$12", "tags": ["$sale"] } })).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn insert_response_uses_camel_case() {
        let body = serde_json::to_value(InsertResponse {
            inserted_id: json!("65a1f0c2e4b0a1b2c3d4e5f6"),
        })
        .unwrap();
        assert_eq!(body, json!({ "insertedId": "65a1f0c2e4b0a1b2c3d4e5f6" }));
    }
}

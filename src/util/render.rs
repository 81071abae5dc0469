//! Turning interpreter values into host-displayable forms.

use serde_json::{Value, json};

use crate::interpreter::Object;

/// Text of one print event: every value rendered, joined by a single space.
pub fn render_message(values: &[Object]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Structured JSON view of a value.
///
/// Every node carries `type` and a text `summary`; scalars add `value`,
/// lists add `items` and `len`, functions add `parameters`.
pub fn object_to_json(value: &Object) -> Value {
    let summary = value.to_string();
    match value {
        Object::Null => json!({ "type": "null", "value": Value::Null, "summary": summary }),
        Object::Bool(flag) => json!({ "type": "boolean", "value": flag, "summary": summary }),
        Object::Integer(number) => json!({ "type": "number", "value": number, "summary": summary }),
        Object::String(text) => json!({ "type": "string", "value": text, "summary": summary }),
        Object::List(items) => json!({
            "type": "list",
            "len": items.len(),
            "items": items.iter().map(object_to_json).collect::<Vec<_>>(),
            "summary": summary,
        }),
        Object::Function(closure) => json!({
            "type": "function",
            "parameters": closure.parameters,
            "summary": summary,
        }),
        Object::Builtin(builtin) => json!({
            "type": "builtin",
            "value": builtin.name,
            "summary": summary,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_joins_values_with_spaces() {
        let values = vec![
            Object::String("total:".into()),
            Object::Integer(3),
            Object::List(vec![Object::Integer(1), Object::String("a".into())]),
        ];
        assert_eq!(render_message(&values), "total: 3 [1,a]");
        assert_eq!(render_message(&[]), "");
    }

    #[test]
    fn test_list_json_includes_items_and_summary() {
        let value = Object::List(vec![Object::Integer(1), Object::Bool(false)]);
        let json = object_to_json(&value);
        let obj = json.as_object().expect("list renders as object");
        assert_eq!(obj.get("type").and_then(|v| v.as_str()), Some("list"));
        assert_eq!(obj.get("len").and_then(|v| v.as_u64()), Some(2));
        assert_eq!(obj.get("summary").and_then(|v| v.as_str()), Some("[1,false]"));
        let items = obj.get("items").and_then(|v| v.as_array()).unwrap();
        assert_eq!(items[0].get("type").and_then(|v| v.as_str()), Some("number"));
    }

    #[test]
    fn test_string_json_keeps_raw_text() {
        let json = object_to_json(&Object::String("hi".into()));
        assert_eq!(json.get("value").and_then(|v| v.as_str()), Some("hi"));
        assert_eq!(json.get("summary").and_then(|v| v.as_str()), Some("hi"));
    }
}

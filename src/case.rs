//! Request bodies arrive in camelCase; schemas and columns are snake_case.

use serde_json::{Map, Value};

/// "companyId" -> "company_id". Already snake_case input is returned unchanged.
pub fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.char_indices() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Rewrite every object key below `value` to snake_case. String values are left alone.
pub fn snake_case_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let renamed: Map<String, Value> = std::mem::take(map)
                .into_iter()
                .map(|(k, mut v)| {
                    snake_case_keys(&mut v);
                    (snake_case(&k), v)
                })
                .collect();
            *map = renamed;
        }
        Value::Array(items) => items.iter_mut().for_each(snake_case_keys),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identifiers() {
        assert_eq!(snake_case("fullName"), "full_name");
        assert_eq!(snake_case("companyId"), "company_id");
        assert_eq!(snake_case("full_name"), "full_name");
        assert_eq!(snake_case("token"), "token");
    }

    #[test]
    fn nested_keys_are_converted() {
        let mut v = json!({
            "pollTitle": "x",
            "questions": [{"optionPass": true, "choices": [{"textFieldsCount": 2}]}],
            "answerText": ["keepMe"]
        });
        snake_case_keys(&mut v);
        assert_eq!(v["poll_title"], "x");
        assert_eq!(v["questions"][0]["option_pass"], true);
        assert_eq!(v["questions"][0]["choices"][0]["text_fields_count"], 2);
        assert_eq!(v["answer_text"][0], "keepMe");
    }
}

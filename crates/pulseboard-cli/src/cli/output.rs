use serde_json::Value;

/// JSON for stdout: indented with `--pretty`, one line otherwise
pub fn render_json(value: &Value, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compact_is_single_line() {
        let out = render_json(&json!({"id": "t1", "status": "pending"}), false);
        assert!(!out.contains('\n'));
        assert!(out.contains("\"status\":\"pending\""));
    }

    #[test]
    fn test_pretty_is_indented() {
        let out = render_json(&json!({"id": "t1"}), true);
        assert_eq!(out, "{\n  \"id\": \"t1\"\n}");
    }
}

use serde_json::Value;

pub const OUT_OF_SCOPE: &str = "OUT_OF_SCOPE";

/// An error object a model stage returned in place of its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sentinel {
    OutOfScope { message: Option<String> },
    Reported { error: String },
}

/// Detects `{"error": ...}` objects emitted instead of a copy payload or plan.
pub fn detect(value: &Value) -> Option<Sentinel> {
    let error = value.as_object()?.get("error")?;
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string);
    match error.as_str() {
        Some(OUT_OF_SCOPE) => Some(Sentinel::OutOfScope { message }),
        Some(other) => Some(Sentinel::Reported {
            error: message.map_or_else(|| other.to_string(), |m| format!("{other}: {m}")),
        }),
        None => Some(Sentinel::Reported {
            error: error.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_out_of_scope() {
        assert_eq!(
            detect(&json!({"error": "OUT_OF_SCOPE", "message": "Only portfolio questions."})),
            Some(Sentinel::OutOfScope {
                message: Some("Only portfolio questions.".to_string())
            })
        );
        assert_eq!(
            detect(&json!({"error": "OUT_OF_SCOPE"})),
            Some(Sentinel::OutOfScope { message: None })
        );
    }

    #[test]
    fn other_errors_are_reported() {
        assert_eq!(
            detect(&json!({"error": "RATE_LIMITED", "message": "slow down"})),
            Some(Sentinel::Reported {
                error: "RATE_LIMITED: slow down".to_string()
            })
        );
    }

    #[test]
    fn plans_are_not_sentinels() {
        assert_eq!(detect(&json!({"components": []})), None);
        assert_eq!(detect(&json!([{"error": "x"}])), None);
    }
}

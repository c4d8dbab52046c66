use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::plan::normalize::{normalize_props, normalize_type};
use crate::spec::model::PAGE_SPEC_VERSION;
use crate::spec::{validate, PageSpec, ValidationError};

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("plan must be a JSON object or array, found {0}")]
    UnsupportedPlan(&'static str),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Normalizes a raw plan and validates the resulting candidate.
pub fn to_page_spec(plan: &Value) -> Result<PageSpec, AdapterError> {
    let candidate = build_candidate(plan)?;
    Ok(validate(&candidate)?)
}

/// Assembles the candidate document without validating it.
///
/// Block lists are taken from `blocks`, then `components`, then the plan
/// itself when it is an array; an object with none of these yields no blocks.
pub fn build_candidate(plan: &Value) -> Result<Value, AdapterError> {
    let raw_blocks: &[Value] = match plan {
        Value::Object(obj) => block_list(obj),
        Value::Array(items) => items,
        Value::Null => return Err(AdapterError::UnsupportedPlan("null")),
        Value::Bool(_) => return Err(AdapterError::UnsupportedPlan("boolean")),
        Value::Number(_) => return Err(AdapterError::UnsupportedPlan("number")),
        Value::String(_) => return Err(AdapterError::UnsupportedPlan("string")),
    };

    let blocks: Vec<Value> = raw_blocks
        .iter()
        .filter_map(Value::as_object)
        .map(normalize_block)
        .collect();
    debug!(raw = raw_blocks.len(), kept = blocks.len(), "normalized plan blocks");

    let mut candidate = Map::new();
    candidate.insert("version".to_string(), json!(PAGE_SPEC_VERSION));
    if let Some(theme) = plan.get("theme") {
        candidate.insert("theme".to_string(), theme.clone());
    }
    candidate.insert("blocks".to_string(), Value::Array(blocks));
    Ok(Value::Object(candidate))
}

fn block_list(plan: &Map<String, Value>) -> &[Value] {
    ["blocks", "components"]
        .iter()
        .find_map(|key| plan.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn normalize_block(block: &Map<String, Value>) -> Value {
    let raw_type = ["type", "componentType"]
        .iter()
        .find_map(|key| block.get(*key).and_then(Value::as_str).filter(|s| !s.is_empty()))
        .unwrap_or("");
    let type_name = normalize_type(raw_type);
    let props = normalize_props(&type_name, block.get("props").unwrap_or(&Value::Null));
    json!({ "type": type_name, "props": props })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Component;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_orchestrator_components_shape() {
        let spec = to_page_spec(&json!({
            "route": "/",
            "components": [{"type": "hero", "props": {"headline": "Hi"}, "from": "sections.hero"}]
        }))
        .unwrap();
        assert_eq!(spec.blocks().len(), 1);
        assert_eq!(spec.to_json()["blocks"][0], json!({"type": "Hero", "props": {"headline": "Hi"}}));
    }

    #[test]
    fn blocks_take_precedence_over_components() {
        let candidate = build_candidate(&json!({
            "blocks": [{"type": "Badge", "props": {"children": "A"}}],
            "components": [{"type": "Badge", "props": {"children": "B"}}]
        }))
        .unwrap();
        assert_eq!(candidate["blocks"][0]["props"]["children"], "A");
    }

    #[test]
    fn accepts_bare_array_plan() {
        let spec = to_page_spec(&json!([
            {"type": "separator"},
            {"componentType": "badge", "props": {"children": "New", "variant": "shiny"}},
            42
        ]))
        .unwrap();
        assert_eq!(spec.blocks().len(), 2);
        assert!(matches!(spec.blocks()[0], Component::Separator(_)));
        assert_eq!(spec.to_json()["blocks"][1]["props"]["variant"], "default");
    }

    #[test]
    fn copies_theme_through() {
        let candidate = build_candidate(&json!({"theme": "dark", "blocks": []})).unwrap();
        assert_eq!(candidate, json!({"version": "1", "theme": "dark", "blocks": []}));

        let candidate = build_candidate(&json!({"theme": null, "blocks": []})).unwrap();
        assert_eq!(candidate, json!({"version": "1", "theme": null, "blocks": []}));

        let candidate = build_candidate(&json!({"blocks": []})).unwrap();
        assert_eq!(candidate, json!({"version": "1", "blocks": []}));
    }

    #[test]
    fn null_theme_fails_validation() {
        let err = to_page_spec(&json!({
            "theme": null,
            "blocks": [{"type": "Hero", "props": {"headline": "x"}}]
        }))
        .unwrap_err();
        let AdapterError::Invalid(err) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(err.paths().collect::<Vec<_>>(), vec!["theme"]);
    }

    #[test]
    fn invalid_theme_is_left_for_validation() {
        let err = to_page_spec(&json!({
            "theme": "neon",
            "blocks": [{"type": "Hero", "props": {"headline": "x"}}]
        }))
        .unwrap_err();
        let AdapterError::Invalid(err) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(err.paths().collect::<Vec<_>>(), vec!["theme"]);
    }

    #[test]
    fn object_without_block_list_fails_validation() {
        let err = to_page_spec(&json!({"sections": []})).unwrap_err();
        let AdapterError::Invalid(err) = err else {
            panic!("expected validation failure");
        };
        assert!(err.violations[0].message.contains("at least 1"));
    }

    #[test]
    fn scalar_plans_are_rejected() {
        assert!(matches!(
            to_page_spec(&json!("just text")),
            Err(AdapterError::UnsupportedPlan("string"))
        ));
    }

    #[test]
    fn unknown_types_are_rejected() {
        let err = to_page_spec(&json!({"blocks": [{"type": "CustomWidget", "props": {}}]})).unwrap_err();
        let AdapterError::Invalid(err) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(err.paths().collect::<Vec<_>>(), vec!["blocks[0].type"]);
    }

    #[test]
    fn feature_grid_shortfall_surfaces_as_count_violation() {
        let err = to_page_spec(&json!({"blocks": [{
            "type": "featureGrid",
            "props": {"title": "Work", "items": [
                {"label": "A", "description": "a"},
                {"label": "B", "description": "b"},
                {"label": "C"}
            ]}
        }]}))
        .unwrap_err();
        let AdapterError::Invalid(err) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].path, "blocks[0].props.items");
        assert!(err.violations[0].message.contains("at least 3"));
    }

    #[test]
    fn missing_type_is_rejected_downstream() {
        let err = to_page_spec(&json!({"blocks": [{"props": {}}]})).unwrap_err();
        assert!(err.to_string().contains("unknown component type \"\""));
    }
}

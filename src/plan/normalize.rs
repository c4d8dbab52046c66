use serde_json::{json, Map, Value};
use tracing::warn;

use crate::spec::model::{
    AlertVariant, BadgeVariant, ButtonSize, ButtonVariant, ComponentKind, InputType, Orientation,
    MIN_FEATURE_ITEMS,
};

const DEFAULT_FEATURE_TITLE: &str = "Features";

const FEATURE_LABEL_KEYS: &[&str] = &["label", "title", "name", "heading", "text"];
const FEATURE_DESCRIPTION_KEYS: &[&str] = &["description", "desc", "body", "summary"];

/// Maps legacy and loosely spelled type names onto a registered component.
pub fn resolve_alias(raw: &str) -> Option<ComponentKind> {
    let kind = match raw {
        "Hero" | "hero" => ComponentKind::Hero,
        "FeatureGrid" | "featureGrid" | "feature-grid" | "feature_grid" | "featuregrid" => {
            ComponentKind::FeatureGrid
        }
        "Testimonial" | "testimonial" => ComponentKind::Testimonial,
        "Button" | "button" | "ctaButton" | "CTAButton" | "cta-button" => ComponentKind::Button,
        "Badge" | "badge" => ComponentKind::Badge,
        "Card" | "card" => ComponentKind::Card,
        "Alert" | "alert" => ComponentKind::Alert,
        "Input" | "input" => ComponentKind::Input,
        "Label" | "label" => ComponentKind::Label,
        "Textarea" | "textarea" => ComponentKind::Textarea,
        "Progress" | "progress" => ComponentKind::Progress,
        "Separator" | "separator" => ComponentKind::Separator,
        _ => return None,
    };
    Some(kind)
}

/// Canonical type name for `raw`, or `raw` itself when it is not aliased.
pub fn normalize_type(raw: &str) -> String {
    match resolve_alias(raw) {
        Some(kind) => kind.as_str().to_string(),
        None => raw.to_string(),
    }
}

/// Coerces raw props into the current prop shape of `type_name`.
///
/// Lenient by construction: out-of-set enum values fall back to their
/// default, legacy shapes are flattened, synonymous field names are folded.
/// It never invents required content, so shortfalls still fail validation.
pub fn normalize_props(type_name: &str, raw: &Value) -> Value {
    let props = match raw {
        Value::Null => Map::new(),
        Value::Object(props) => props.clone(),
        other => return other.clone(),
    };
    let Some(kind) = ComponentKind::from_canonical(type_name) else {
        return Value::Object(props);
    };

    let normalized = match kind {
        ComponentKind::Hero => hero(props),
        ComponentKind::FeatureGrid => feature_grid(&props),
        ComponentKind::Testimonial => testimonial(&props),
        ComponentKind::Button => {
            let mut props = fold_children(props, &["children", "label", "text"]);
            coerce_enum(&mut props, "variant", ButtonVariant::VALUES, ButtonVariant::default().as_str());
            coerce_enum(&mut props, "size", ButtonSize::VALUES, ButtonSize::default().as_str());
            props
        }
        ComponentKind::Badge => {
            let mut props = fold_children(props, &["children", "label", "text"]);
            coerce_enum(&mut props, "variant", BadgeVariant::VALUES, BadgeVariant::default().as_str());
            props
        }
        ComponentKind::Alert => {
            let mut props = props;
            coerce_enum(&mut props, "variant", AlertVariant::VALUES, AlertVariant::default().as_str());
            props
        }
        ComponentKind::Input => {
            let mut props = props;
            coerce_enum(&mut props, "type", InputType::VALUES, InputType::default().as_str());
            props
        }
        ComponentKind::Separator => {
            let mut props = props;
            coerce_enum(&mut props, "orientation", Orientation::VALUES, Orientation::default().as_str());
            props
        }
        ComponentKind::Label => fold_children(props, &["children", "text"]),
        ComponentKind::Card | ComponentKind::Textarea | ComponentKind::Progress => props,
    };
    Value::Object(normalized)
}

/// First candidate that is present, non-null and not an empty string.
fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|key| obj.get(*key)).find(|value| match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

/// First non-empty string candidate, trimmed.
fn first_str(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(|s| s.trim().to_string())
}

fn put(out: &mut Map<String, Value>, key: &str, value: Option<&Value>) {
    if let Some(value) = value {
        out.insert(key.to_string(), value.clone());
    }
}

fn coerce_enum(props: &mut Map<String, Value>, key: &str, allowed: &[&str], default: &str) {
    if let Some(value) = props.get_mut(key) {
        let in_set = value.as_str().is_some_and(|s| allowed.contains(&s));
        if !in_set {
            *value = Value::String(default.to_string());
        }
    }
}

fn fold_children(mut props: Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    if let Some(children) = first_present(&props, keys).cloned() {
        props.insert("children".to_string(), children);
    }
    props
}

fn hero(props: Map<String, Value>) -> Map<String, Value> {
    let mut out = match props.get("content").and_then(Value::as_object) {
        Some(content) => {
            let mut flat = Map::new();
            put(&mut flat, "eyebrow", first_present(&props, &["eyebrow"]));
            put(
                &mut flat,
                "headline",
                first_present(content, &["heading"]).or_else(|| first_present(&props, &["headline"])),
            );
            put(
                &mut flat,
                "subhead",
                first_present(content, &["subheading"]).or_else(|| first_present(&props, &["subhead"])),
            );
            match first_present(content, &["ctaLabel"]) {
                Some(label) => {
                    let href = first_present(content, &["ctaHref"]).or_else(|| {
                        props
                            .get("cta")
                            .and_then(Value::as_object)
                            .and_then(|cta| first_present(cta, &["href"]))
                    });
                    let mut cta = Map::new();
                    cta.insert("label".to_string(), label.clone());
                    put(&mut cta, "href", href);
                    flat.insert("cta".to_string(), Value::Object(cta));
                }
                None => put(&mut flat, "cta", first_present(&props, &["cta"])),
            }
            flat
        }
        None => props,
    };

    if let Some(Value::Object(cta)) = out.get_mut("cta") {
        coerce_enum(cta, "variant", ButtonVariant::VALUES, ButtonVariant::default().as_str());
    }
    out
}

fn feature_grid(props: &Map<String, Value>) -> Map<String, Value> {
    let items: Vec<Value> = props
        .get("items")
        .and_then(Value::as_array)
        .map(|raw| {
            raw.iter()
                .filter_map(Value::as_object)
                .filter_map(|item| {
                    let label = first_str(item, FEATURE_LABEL_KEYS).filter(|s| !s.is_empty())?;
                    let description =
                        first_str(item, FEATURE_DESCRIPTION_KEYS).filter(|s| !s.is_empty())?;
                    let mut out = Map::new();
                    put(&mut out, "icon", first_present(item, &["icon"]));
                    out.insert("label".to_string(), Value::String(label));
                    out.insert("description".to_string(), Value::String(description));
                    Some(Value::Object(out))
                })
                .collect()
        })
        .unwrap_or_default();

    if items.len() < MIN_FEATURE_ITEMS {
        warn!(
            valid_items = items.len(),
            minimum = MIN_FEATURE_ITEMS,
            "FeatureGrid has too few usable items; leaving it to validation"
        );
    }

    let title = first_str(props, &["title", "heading", "name"])
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_FEATURE_TITLE.to_string());

    let mut out = Map::new();
    out.insert("title".to_string(), Value::String(title));
    out.insert("items".to_string(), Value::Array(items));
    out
}

fn testimonial(props: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    let quote = first_present(props, &["quote", "text", "content"])
        .cloned()
        .unwrap_or_else(|| json!(""));
    out.insert("quote".to_string(), quote);
    put(&mut out, "author", first_present(props, &["author", "name"]));
    put(&mut out, "role", first_present(props, &["role", "title"]));
    out
}

use std::fmt;

use reqwest::Url;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::spec::model::{
    AlertProps, AlertVariant, BadgeProps, BadgeVariant, ButtonProps, ButtonSize, ButtonVariant,
    CallToAction, CardProps, Component, ComponentKind, FeatureGridProps, FeatureItem, HeroProps,
    InputProps, InputType, LabelProps, Orientation, PageSpec, ProgressProps, SeparatorProps,
    TestimonialProps, TextareaProps, Theme, MAX_BLOCKS, MAX_FEATURE_ITEMS, MIN_BLOCKS,
    MIN_FEATURE_ITEMS, PAGE_SPEC_VERSION,
};

/// One violated constraint, addressed by a dotted path into the candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("page spec failed validation: {}", summarize(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.path.as_str())
    }
}

fn summarize(violations: &[Violation]) -> String {
    let listed = violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    format!("{} violation(s): {listed}", violations.len())
}

/// Validates a candidate document and builds the typed page from it.
///
/// Every enumerable violation is collected before failing; the candidate is
/// never coerced. Defaults of optional enum props are materialized in the
/// typed result only.
pub fn validate(candidate: &Value) -> Result<PageSpec, ValidationError> {
    let mut checker = Checker::default();
    let spec = checker.page(candidate);
    if checker.violations.is_empty() {
        Ok(spec)
    } else {
        Err(ValidationError {
            violations: checker.violations,
        })
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Default)]
struct Checker {
    violations: Vec<Violation>,
}

impl Checker {
    fn fail(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            path: path.into(),
            message: message.into(),
        });
    }

    fn page(&mut self, candidate: &Value) -> PageSpec {
        let Some(doc) = candidate.as_object() else {
            self.fail("", format!("expected an object, found {}", type_name(candidate)));
            return PageSpec::new(None, Vec::new());
        };

        match doc.get("version") {
            None => self.fail("version", "is required"),
            Some(Value::String(v)) if v == PAGE_SPEC_VERSION => {}
            Some(other) => self.fail(
                "version",
                format!("expected literal \"{PAGE_SPEC_VERSION}\", found {other}"),
            ),
        }

        let theme = self.optional_enum(doc, "theme", "", Theme::parse, Theme::VALUES);

        let blocks = match doc.get("blocks") {
            None => {
                self.fail("blocks", "is required");
                Vec::new()
            }
            Some(Value::Array(raw)) => {
                if raw.len() < MIN_BLOCKS {
                    self.fail(
                        "blocks",
                        format!("must contain at least {MIN_BLOCKS} block(s), found {}", raw.len()),
                    );
                }
                if raw.len() > MAX_BLOCKS {
                    self.fail(
                        "blocks",
                        format!("must contain at most {MAX_BLOCKS} block(s), found {}", raw.len()),
                    );
                }
                raw.iter()
                    .enumerate()
                    .filter_map(|(i, block)| self.block(block, &format!("blocks[{i}]")))
                    .collect()
            }
            Some(other) => {
                self.fail("blocks", format!("expected an array, found {}", type_name(other)));
                Vec::new()
            }
        };

        PageSpec::new(theme, blocks)
    }

    fn block(&mut self, block: &Value, path: &str) -> Option<Component> {
        let Some(block) = block.as_object() else {
            self.fail(path, format!("expected an object, found {}", type_name(block)));
            return None;
        };

        let type_path = join(path, "type");
        let kind = match block.get("type") {
            None => {
                self.fail(type_path, "is required");
                return None;
            }
            Some(Value::String(name)) => match ComponentKind::from_canonical(name) {
                Some(kind) => kind,
                None => {
                    self.fail(type_path, format!("unknown component type \"{name}\""));
                    return None;
                }
            },
            Some(other) => {
                self.fail(type_path, format!("expected a string, found {}", type_name(other)));
                return None;
            }
        };

        let props_path = join(path, "props");
        let empty = Map::new();
        let props = match block.get("props") {
            Some(Value::Object(props)) => props,
            None if kind == ComponentKind::Separator => &empty,
            None => {
                self.fail(props_path, "is required");
                return None;
            }
            Some(other) => {
                self.fail(props_path, format!("expected an object, found {}", type_name(other)));
                return None;
            }
        };

        Some(self.props(kind, props, &props_path))
    }

    fn props(&mut self, kind: ComponentKind, props: &Map<String, Value>, path: &str) -> Component {
        match kind {
            ComponentKind::Hero => Component::Hero(HeroProps {
                eyebrow: self.optional_str(props, "eyebrow", path),
                headline: self.required_str(props, "headline", path),
                subhead: self.optional_str(props, "subhead", path),
                cta: self.call_to_action(props, path),
            }),
            ComponentKind::FeatureGrid => Component::FeatureGrid(FeatureGridProps {
                title: self.required_str(props, "title", path),
                items: self.feature_items(props, path),
            }),
            ComponentKind::Testimonial => Component::Testimonial(TestimonialProps {
                quote: self.required_str(props, "quote", path),
                author: self.optional_str(props, "author", path),
                role: self.optional_str(props, "role", path),
            }),
            ComponentKind::Button => Component::Button(ButtonProps {
                variant: self
                    .optional_enum(props, "variant", path, ButtonVariant::parse, ButtonVariant::VALUES)
                    .unwrap_or_default(),
                size: self
                    .optional_enum(props, "size", path, ButtonSize::parse, ButtonSize::VALUES)
                    .unwrap_or_default(),
                href: self.optional_url(props, "href", path),
                children: self.required_str(props, "children", path),
                disabled: self.optional_bool(props, "disabled", path),
            }),
            ComponentKind::Badge => Component::Badge(BadgeProps {
                variant: self
                    .optional_enum(props, "variant", path, BadgeVariant::parse, BadgeVariant::VALUES)
                    .unwrap_or_default(),
                children: self.required_str(props, "children", path),
            }),
            ComponentKind::Card => Component::Card(CardProps {
                children: self.optional_str(props, "children", path),
                class_name: self.optional_str(props, "className", path),
            }),
            ComponentKind::Alert => Component::Alert(AlertProps {
                variant: self
                    .optional_enum(props, "variant", path, AlertVariant::parse, AlertVariant::VALUES)
                    .unwrap_or_default(),
                title: self.optional_str(props, "title", path),
                description: self.required_str(props, "description", path),
            }),
            ComponentKind::Input => Component::Input(InputProps {
                input_type: self
                    .optional_enum(props, "type", path, InputType::parse, InputType::VALUES)
                    .unwrap_or_default(),
                placeholder: self.optional_str(props, "placeholder", path),
                value: self.optional_str(props, "value", path),
                disabled: self.optional_bool(props, "disabled", path),
            }),
            ComponentKind::Label => Component::Label(LabelProps {
                children: self.required_str(props, "children", path),
                html_for: self.optional_str(props, "htmlFor", path),
            }),
            ComponentKind::Textarea => Component::Textarea(TextareaProps {
                placeholder: self.optional_str(props, "placeholder", path),
                value: self.optional_str(props, "value", path),
                disabled: self.optional_bool(props, "disabled", path),
                rows: self.optional_number(props, "rows", path, 1.0, 20.0),
            }),
            ComponentKind::Progress => Component::Progress(ProgressProps {
                value: self.required_number(props, "value", path, 0.0, 100.0),
            }),
            ComponentKind::Separator => Component::Separator(SeparatorProps {
                orientation: self
                    .optional_enum(props, "orientation", path, Orientation::parse, Orientation::VALUES)
                    .unwrap_or_default(),
            }),
        }
    }

    fn call_to_action(&mut self, props: &Map<String, Value>, path: &str) -> Option<CallToAction> {
        let cta_path = join(path, "cta");
        match props.get("cta")? {
            Value::Object(cta) => Some(CallToAction {
                label: self.required_str(cta, "label", &cta_path),
                href: self.optional_str(cta, "href", &cta_path),
                variant: self.optional_enum(
                    cta,
                    "variant",
                    &cta_path,
                    ButtonVariant::parse,
                    ButtonVariant::VALUES,
                ),
            }),
            other => {
                self.fail(cta_path, format!("expected an object, found {}", type_name(other)));
                None
            }
        }
    }

    fn feature_items(&mut self, props: &Map<String, Value>, path: &str) -> Vec<FeatureItem> {
        let items_path = join(path, "items");
        let raw = match props.get("items") {
            None => {
                self.fail(items_path, "is required");
                return Vec::new();
            }
            Some(Value::Array(raw)) => raw,
            Some(other) => {
                self.fail(items_path, format!("expected an array, found {}", type_name(other)));
                return Vec::new();
            }
        };

        if raw.len() < MIN_FEATURE_ITEMS {
            self.fail(
                items_path.clone(),
                format!("must contain at least {MIN_FEATURE_ITEMS} item(s), found {}", raw.len()),
            );
        }
        if raw.len() > MAX_FEATURE_ITEMS {
            self.fail(
                items_path.clone(),
                format!("must contain at most {MAX_FEATURE_ITEMS} item(s), found {}", raw.len()),
            );
        }

        let mut items = Vec::with_capacity(raw.len());
        for (i, item) in raw.iter().enumerate() {
            let item_path = format!("{items_path}[{i}]");
            let Some(item) = item.as_object() else {
                self.fail(item_path, format!("expected an object, found {}", type_name(item)));
                continue;
            };
            items.push(FeatureItem {
                icon: self.optional_str(item, "icon", &item_path),
                label: self.required_str(item, "label", &item_path),
                description: self.required_str(item, "description", &item_path),
            });
        }
        items
    }

    fn required_str(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> String {
        let field = join(path, key);
        match obj.get(key) {
            None => {
                self.fail(field, "is required");
                String::new()
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.fail(field, "must not be empty");
                String::new()
            }
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                self.fail(field, format!("expected a string, found {}", type_name(other)));
                String::new()
            }
        }
    }

    fn optional_str(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        match obj.get(key)? {
            Value::String(s) => Some(s.clone()),
            other => {
                self.fail(join(path, key), format!("expected a string, found {}", type_name(other)));
                None
            }
        }
    }

    fn optional_url(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        let raw = self.optional_str(obj, key, path)?;
        match Url::parse(&raw) {
            Ok(_) => Some(raw),
            Err(err) => {
                self.fail(join(path, key), format!("must be a valid URL ({err})"));
                None
            }
        }
    }

    fn optional_bool(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<bool> {
        match obj.get(key)? {
            Value::Bool(b) => Some(*b),
            other => {
                self.fail(join(path, key), format!("expected a boolean, found {}", type_name(other)));
                None
            }
        }
    }

    fn optional_enum<E>(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        path: &str,
        parse: fn(&str) -> Option<E>,
        allowed: &[&str],
    ) -> Option<E> {
        let value = obj.get(key)?;
        match value.as_str().and_then(parse) {
            Some(parsed) => Some(parsed),
            None => {
                self.fail(
                    join(path, key),
                    format!("expected one of {}, found {value}", allowed.join("|")),
                );
                None
            }
        }
    }

    fn required_number(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        path: &str,
        min: f64,
        max: f64,
    ) -> f64 {
        let field = join(path, key);
        match obj.get(key) {
            None => {
                self.fail(field, "is required");
                min
            }
            Some(Value::Number(n)) => {
                let value = n.as_f64().unwrap_or(f64::NAN);
                if !(min..=max).contains(&value) {
                    self.fail(field, format!("must be between {min} and {max}, found {n}"));
                }
                value
            }
            Some(other) => {
                self.fail(field, format!("expected a number, found {}", type_name(other)));
                min
            }
        }
    }

    fn optional_number(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        path: &str,
        min: f64,
        max: f64,
    ) -> Option<f64> {
        let field = join(path, key);
        match obj.get(key)? {
            Value::Number(n) => {
                let value = n.as_f64().unwrap_or(f64::NAN);
                if (min..=max).contains(&value) {
                    Some(value)
                } else {
                    self.fail(field, format!("must be between {min} and {max}, found {n}"));
                    None
                }
            }
            other => {
                self.fail(field, format!("expected a number, found {}", type_name(other)));
                None
            }
        }
    }
}

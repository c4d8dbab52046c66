use serde_json::{json, Map, Value};

use crate::rules::RulesBundle;
use crate::spec::model::{
    AlertVariant, BadgeVariant, ButtonSize, ButtonVariant, ComponentKind, InputType, Orientation,
};

const JSON_ONLY_INSTRUCTIONS: &str = "## Instructions

You must return ONLY valid JSON. Do not include:
- Markdown code blocks (three backticks with json or plain)
- Explanatory text before or after the JSON
- Any text outside the JSON object
- Comments or annotations

The response must start with { and end with }. Nothing else.";

const ORCHESTRATOR_OUTPUT_SHAPE: &str = r#"Your output must match this exact structure:
{
  "route": "/string",
  "components": [
    {
      "type": "Hero",
      "props": { ... },
      "from": "sections.hero"
    }
  ],
  "used_copy_keys": ["meta", "sections.hero"],
  "notes": "string (optional)"
}"#;

const QA_INSTRUCTIONS: &str = "## Instructions

You are an AI assistant that answers questions about Charles Pfaff and his work. You must:
- Only answer questions related to Charles Pfaff, his background, experience, projects, or creative work
- Politely decline questions unrelated to Charles Pfaff
- Be helpful, respectful, and on-topic
- Use the agent rules above to provide accurate information about Charles";

/// Facts the copywriter is allowed to draw on.
pub fn profile_data() -> Value {
    json!({
        "bio": {
            "name": "Charles Pfaff",
            "title": "Creative Technologist & Front-End Engineer",
            "location": "Richmond, VA",
            "summary": "I bridge design and engineering to craft human-centered, performant experiences. I build thoughtful interfaces, design systems, and AI-assisted workflows.",
            "email": "hello@pfaff.design",
            "site": "https://pfaff.design"
        },
        "skills": {
            "engineering": ["React", "TypeScript", "Next.js", "Node.js", "Tailwind CSS", "Storybook", "Supabase", "Postmark", "GSAP"],
            "design": ["Figma", "Framer", "Design Systems", "Prototyping", "Accessibility"],
            "other": ["UX Writing", "Prompt Design", "CI/CD", "Testing (Jest)"]
        },
        "caseStudies": {
            "fridgepal": {
                "name": "FridgePal",
                "summary": "Smart grocery & meal planning with AI receipt parsing and Supabase.",
                "highlights": ["Email parsing of Instacart receipts", "Feature-based React architecture", "Supabase Edge Functions for notifications"]
            },
            "catalyst": {
                "name": "Catalyst Design System",
                "summary": "Token-driven React + Tailwind component library documented in Storybook.",
                "highlights": ["Radix UI primitives", "CVA token patterns", "Theming via CSS variables"]
            },
            "makeNoise": {
                "name": "Make Noise",
                "summary": "Personal brand + portfolio blending music, art, and tech.",
                "highlights": ["Editorial layout", "Simple color system", "Fast iteration workflow"]
            }
        },
        "experience": [
            {"role": "UX Engineer / Front-End", "org": "Agencies & Startups", "summary": "Bridged design systems and app delivery across teams."}
        ],
        "testimonials": [
            {"author": "Design Lead", "quote": "Charles bridges aesthetics and engineering with rare clarity."},
            {"author": "PM", "quote": "He ships clean, reliable interfaces, fast."}
        ],
        "links": {
            "github": "https://github.com/charlespfaff",
            "linkedin": "https://www.linkedin.com/in/charlespfaff/"
        }
    })
}

fn one_of(values: &[&str], default: Option<&str>) -> String {
    match default {
        Some(default) => format!("{} (default: {default})", values.join(" | ")),
        None => format!("{} (optional)", values.join(" | ")),
    }
}

fn catalog_entry(kind: ComponentKind) -> Value {
    match kind {
        ComponentKind::Hero => json!({
            "description": "Composed hero section with eyebrow, headline, subhead, and optional CTA",
            "props": {
                "eyebrow": "string (optional)",
                "headline": "string (required)",
                "subhead": "string (optional)",
                "cta": {
                    "label": "string (required if cta provided)",
                    "href": "string (optional)",
                    "variant": one_of(ButtonVariant::VALUES, None)
                }
            }
        }),
        ComponentKind::FeatureGrid => json!({
            "description": "Grid of feature items (3-6 items)",
            "props": {
                "title": "string (required)",
                "items": [{
                    "icon": "string (optional)",
                    "label": "string (required)",
                    "description": "string (required)"
                }]
            }
        }),
        ComponentKind::Testimonial => json!({
            "description": "Testimonial card with quote, author, and optional role",
            "props": {
                "quote": "string (required)",
                "author": "string (optional)",
                "role": "string (optional)"
            }
        }),
        ComponentKind::Button => json!({
            "description": "Button",
            "props": {
                "variant": one_of(ButtonVariant::VALUES, Some("default")),
                "size": one_of(ButtonSize::VALUES, Some("default")),
                "href": "string (absolute URL, optional)",
                "children": "string (required - button text)",
                "disabled": "boolean (optional)"
            }
        }),
        ComponentKind::Badge => json!({
            "description": "Badge",
            "props": {
                "variant": one_of(BadgeVariant::VALUES, Some("default")),
                "children": "string (required)"
            }
        }),
        ComponentKind::Card => json!({
            "description": "Card",
            "props": {
                "children": "string (optional)",
                "className": "string (optional)"
            }
        }),
        ComponentKind::Alert => json!({
            "description": "Alert",
            "props": {
                "variant": one_of(AlertVariant::VALUES, Some("default")),
                "title": "string (optional)",
                "description": "string (required)"
            }
        }),
        ComponentKind::Input => json!({
            "description": "Input",
            "props": {
                "type": one_of(InputType::VALUES, Some("text")),
                "placeholder": "string (optional)",
                "value": "string (optional)",
                "disabled": "boolean (optional)"
            }
        }),
        ComponentKind::Label => json!({
            "description": "Label",
            "props": {
                "children": "string (required)",
                "htmlFor": "string (optional)"
            }
        }),
        ComponentKind::Textarea => json!({
            "description": "Textarea",
            "props": {
                "placeholder": "string (optional)",
                "value": "string (optional)",
                "disabled": "boolean (optional)",
                "rows": "number 1-20 (optional)"
            }
        }),
        ComponentKind::Progress => json!({
            "description": "Progress bar",
            "props": {
                "value": "number 0-100 (required)"
            }
        }),
        ComponentKind::Separator => json!({
            "description": "Separator rule",
            "props": {
                "orientation": one_of(Orientation::VALUES, Some("horizontal"))
            }
        }),
    }
}

/// Catalog of every registered component, keyed by canonical type name.
pub fn component_catalog() -> Value {
    let catalog: Map<String, Value> = ComponentKind::ALL
        .into_iter()
        .map(|kind| (kind.as_str().to_string(), catalog_entry(kind)))
        .collect();
    Value::Object(catalog)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn copywriter_system_prompt(rules: &RulesBundle) -> String {
    format!(
        "{}\n\n## Static Data\n\n{}\n\n{JSON_ONLY_INSTRUCTIONS}",
        rules.copywriter,
        pretty(&profile_data())
    )
}

pub fn copywriter_message(brief: &str, style: Option<&str>) -> String {
    match style.map(str::trim).filter(|s| !s.is_empty()) {
        Some(style) => format!("Brief: {brief}\n\nStyle: {style}"),
        None => format!("Brief: {brief}"),
    }
}

pub fn orchestrator_system_prompt(rules: &RulesBundle) -> String {
    format!(
        "{}\n\n## Component Catalog\n\n{}\n\n{JSON_ONLY_INSTRUCTIONS}\n\n{ORCHESTRATOR_OUTPUT_SHAPE}",
        rules.orchestrator,
        pretty(&component_catalog())
    )
}

pub fn orchestrator_message(intent: &str, copy: &Value) -> String {
    format!("Intent: {intent}\n\nCopy payload:\n{}", pretty(copy))
}

pub fn qa_system_prompt(rules: &RulesBundle) -> String {
    format!(
        "{}\n\n---\n\n{}\n\n---\n\n{QA_INSTRUCTIONS}",
        rules.orchestrator, rules.copywriter
    )
}

use serde::{Serialize, Serializer};

/// The only page spec version this bridge produces or accepts.
pub const PAGE_SPEC_VERSION: &str = "1";

pub const MIN_BLOCKS: usize = 1;
pub const MAX_BLOCKS: usize = 12;

pub const MIN_FEATURE_ITEMS: usize = 3;
pub const MAX_FEATURE_ITEMS: usize = 6;

/// Declares a closed string enum with its wire spelling, allowed values and default.
macro_rules! closed_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? } default $default:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub const VALUES: &'static [&'static str] = &[$($text),+];

            pub fn parse(raw: &str) -> Option<Self> {
                match raw {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }
    };
}

closed_enum!(Theme { Light => "light", Dark => "dark" } default Light);

closed_enum!(ButtonVariant {
    Default => "default",
    Secondary => "secondary",
    Destructive => "destructive",
    Ghost => "ghost",
    Link => "link",
    Outline => "outline",
} default Default);

closed_enum!(ButtonSize {
    Default => "default",
    Sm => "sm",
    Lg => "lg",
    Icon => "icon",
} default Default);

closed_enum!(BadgeVariant {
    Default => "default",
    Secondary => "secondary",
    Destructive => "destructive",
    Outline => "outline",
} default Default);

closed_enum!(AlertVariant { Default => "default", Destructive => "destructive" } default Default);

closed_enum!(InputType {
    Text => "text",
    Email => "email",
    Password => "password",
    Number => "number",
} default Text);

closed_enum!(Orientation { Horizontal => "horizontal", Vertical => "vertical" } default Horizontal);

/// Registered component types. Every match over this enum is the single
/// place a new component has to be wired in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Hero,
    FeatureGrid,
    Testimonial,
    Button,
    Badge,
    Card,
    Alert,
    Input,
    Label,
    Textarea,
    Progress,
    Separator,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 12] = [
        ComponentKind::Hero,
        ComponentKind::FeatureGrid,
        ComponentKind::Testimonial,
        ComponentKind::Button,
        ComponentKind::Badge,
        ComponentKind::Card,
        ComponentKind::Alert,
        ComponentKind::Input,
        ComponentKind::Label,
        ComponentKind::Textarea,
        ComponentKind::Progress,
        ComponentKind::Separator,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Hero => "Hero",
            ComponentKind::FeatureGrid => "FeatureGrid",
            ComponentKind::Testimonial => "Testimonial",
            ComponentKind::Button => "Button",
            ComponentKind::Badge => "Badge",
            ComponentKind::Card => "Card",
            ComponentKind::Alert => "Alert",
            ComponentKind::Input => "Input",
            ComponentKind::Label => "Label",
            ComponentKind::Textarea => "Textarea",
            ComponentKind::Progress => "Progress",
            ComponentKind::Separator => "Separator",
        }
    }

    /// Case-sensitive lookup of a canonical type name.
    pub fn from_canonical(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecVersion;

impl Serialize for SpecVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(PAGE_SPEC_VERSION)
    }
}

/// A validated page. Only the validator constructs one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSpec {
    version: SpecVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    theme: Option<Theme>,
    blocks: Vec<Component>,
}

impl PageSpec {
    pub(crate) fn new(theme: Option<Theme>, blocks: Vec<Component>) -> Self {
        Self {
            version: SpecVersion,
            theme,
            blocks,
        }
    }

    pub fn version(&self) -> &'static str {
        PAGE_SPEC_VERSION
    }

    pub fn theme(&self) -> Option<Theme> {
        self.theme
    }

    pub fn blocks(&self) -> &[Component] {
        &self.blocks
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Serializing plain strings, bools and finite numbers cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "props")]
pub enum Component {
    Hero(HeroProps),
    FeatureGrid(FeatureGridProps),
    Testimonial(TestimonialProps),
    Button(ButtonProps),
    Badge(BadgeProps),
    Card(CardProps),
    Alert(AlertProps),
    Input(InputProps),
    Label(LabelProps),
    Textarea(TextareaProps),
    Progress(ProgressProps),
    Separator(SeparatorProps),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Hero(_) => ComponentKind::Hero,
            Component::FeatureGrid(_) => ComponentKind::FeatureGrid,
            Component::Testimonial(_) => ComponentKind::Testimonial,
            Component::Button(_) => ComponentKind::Button,
            Component::Badge(_) => ComponentKind::Badge,
            Component::Card(_) => ComponentKind::Card,
            Component::Alert(_) => ComponentKind::Alert,
            Component::Input(_) => ComponentKind::Input,
            Component::Label(_) => ComponentKind::Label,
            Component::Textarea(_) => ComponentKind::Textarea,
            Component::Progress(_) => ComponentKind::Progress,
            Component::Separator(_) => ComponentKind::Separator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeroProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eyebrow: Option<String>,
    pub headline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subhead: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta: Option<CallToAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallToAction {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<ButtonVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureGridProps {
    pub title: String,
    pub items: Vec<FeatureItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestimonialProps {
    pub quote: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ButtonProps {
    pub variant: ButtonVariant,
    pub size: ButtonSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub children: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeProps {
    pub variant: BadgeVariant,
    pub children: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<String>,
    #[serde(rename = "className", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertProps {
    pub variant: AlertVariant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputProps {
    #[serde(rename = "type")]
    pub input_type: InputType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelProps {
    pub children: String,
    #[serde(rename = "htmlFor", skip_serializing_if = "Option::is_none")]
    pub html_for: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextareaProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressProps {
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeparatorProps {
    pub orientation: Orientation,
}

//! Form input discovery and semantic input kinds.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use feature_discovery_core::{Action, Attributes, DiscoveredFeature, DriverResult, FeatureType};
use feature_discovery_driver::Driver;

use crate::discovery::{actions_if_interactive, DiscoveryContext, FeatureDiscovery};

/// Form controls a user can type into or choose from.
pub const INPUT_SELECTOR: &str =
    "input:not([type=\"hidden\"]), textarea, select, [contenteditable=\"true\"]";

/// Semantic kind of a form control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// Free text
    Text,
    /// E-mail address
    Email,
    /// Password
    Password,
    /// Number
    Number,
    /// Telephone number
    Tel,
    /// URL
    Url,
    /// Search query
    Search,
    /// Calendar date
    Date,
    /// Time of day
    Time,
    /// Local date and time
    DateTimeLocal,
    /// Year and month
    Month,
    /// Year and week
    Week,
    /// Colour
    Color,
    /// Slider
    Range,
    /// Checkbox
    Checkbox,
    /// Radio button
    Radio,
    /// File picker
    File,
    /// Multi-line text
    Textarea,
    /// Select box
    Select,
}

impl InputKind {
    /// All kinds.
    pub const ALL: [InputKind; 19] = [
        InputKind::Text,
        InputKind::Email,
        InputKind::Password,
        InputKind::Number,
        InputKind::Tel,
        InputKind::Url,
        InputKind::Search,
        InputKind::Date,
        InputKind::Time,
        InputKind::DateTimeLocal,
        InputKind::Month,
        InputKind::Week,
        InputKind::Color,
        InputKind::Range,
        InputKind::Checkbox,
        InputKind::Radio,
        InputKind::File,
        InputKind::Textarea,
        InputKind::Select,
    ];

    /// HTML name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Email => "email",
            InputKind::Password => "password",
            InputKind::Number => "number",
            InputKind::Tel => "tel",
            InputKind::Url => "url",
            InputKind::Search => "search",
            InputKind::Date => "date",
            InputKind::Time => "time",
            InputKind::DateTimeLocal => "datetime-local",
            InputKind::Month => "month",
            InputKind::Week => "week",
            InputKind::Color => "color",
            InputKind::Range => "range",
            InputKind::Checkbox => "checkbox",
            InputKind::Radio => "radio",
            InputKind::File => "file",
            InputKind::Textarea => "textarea",
            InputKind::Select => "select",
        }
    }

    /// Representative valid value for the kind.
    pub fn test_value(&self) -> &'static str {
        match self {
            InputKind::Text => "Test input",
            InputKind::Email => "test@example.com",
            InputKind::Password => "TestPass123!",
            InputKind::Number => "42",
            InputKind::Tel => "+1-555-0100",
            InputKind::Url => "https://example.com",
            InputKind::Search => "test search",
            InputKind::Date => "2024-01-15",
            InputKind::Time => "12:30",
            InputKind::DateTimeLocal => "2024-01-15T12:30",
            InputKind::Month => "2024-01",
            InputKind::Week => "2024-W03",
            InputKind::Color => "#3366ff",
            InputKind::Range => "50",
            InputKind::Checkbox | InputKind::Radio => "on",
            InputKind::File => "",
            InputKind::Textarea => "Test message content",
            InputKind::Select => "",
        }
    }

    /// Whether a value is typed into the control.
    pub fn is_fillable(&self) -> bool {
        !matches!(
            self,
            InputKind::Checkbox | InputKind::Radio | InputKind::File | InputKind::Select
        )
    }

    /// Infer the kind from the tag and attributes.
    ///
    /// The `type` attribute wins when it names a specific kind; otherwise
    /// `name`, `id`, `placeholder` and `autocomplete` are searched for hints.
    pub fn infer(tag: &str, attributes: &Attributes) -> Self {
        match tag {
            "textarea" => return InputKind::Textarea,
            "select" => return InputKind::Select,
            _ => {}
        }
        if let Some(kind) = attributes
            .get("type")
            .and_then(|t| t.parse::<InputKind>().ok())
            .filter(|k| !matches!(k, InputKind::Text | InputKind::Textarea | InputKind::Select))
        {
            return kind;
        }
        if attributes.contains_key("contenteditable") && tag != "input" {
            return InputKind::Textarea;
        }

        let hints: Vec<String> = ["name", "id", "placeholder", "autocomplete", "aria-label"]
            .iter()
            .filter_map(|name| attributes.get(*name))
            .flat_map(|v| {
                v.split(|c: char| !c.is_ascii_alphanumeric())
                    .filter(|t| !t.is_empty())
                    .map(str::to_ascii_lowercase)
                    .collect::<Vec<_>>()
            })
            .collect();
        // Short words must match a whole token; longer ones may be embedded.
        let mentions = |word: &str| {
            hints
                .iter()
                .any(|token| token == word || (word.len() >= 5 && token.contains(word)))
        };
        const HINTS: [(&[&str], InputKind); 7] = [
            (&["email", "mail"], InputKind::Email),
            (&["password", "passwd", "pwd"], InputKind::Password),
            (&["phone", "tel", "mobile"], InputKind::Tel),
            (&["url", "website", "homepage"], InputKind::Url),
            (&["search", "query"], InputKind::Search),
            (&["birthday", "dob", "date"], InputKind::Date),
            (&["age", "quantity", "amount", "zip", "postal"], InputKind::Number),
        ];
        HINTS
            .iter()
            .find(|(words, _)| words.iter().any(|w| mentions(w)))
            .map(|(_, kind)| *kind)
            .unwrap_or(InputKind::Text)
    }

    /// Infer the kind of a discovered feature.
    pub fn of_feature(feature: &DiscoveredFeature) -> Self {
        let tag = feature.tag.as_deref().unwrap_or(match feature.feature_type {
            FeatureType::Dropdown => "select",
            _ => "input",
        });
        match &feature.attributes {
            Some(attributes) => Self::infer(tag, attributes),
            None => Self::infer(tag, &Attributes::new()),
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputKind {
    type Err = feature_discovery_core::Error;

    fn from_str(s: &str) -> feature_discovery_core::Result<Self> {
        let s = s.trim();
        InputKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                feature_discovery_core::Error::InvalidInput(format!("unknown input type: {s}"))
            })
    }
}

/// Representative value for an input type name; unknown names get the text value.
///
/// # Example
/// ```
/// use feature_discovery_detector::services::get_test_value_for_input;
///
/// assert_eq!(get_test_value_for_input("email"), "test@example.com");
/// assert_eq!(get_test_value_for_input("date"), "2024-01-15");
/// assert_eq!(get_test_value_for_input("nonsense"), "Test input");
/// ```
pub fn get_test_value_for_input(input_type: &str) -> &'static str {
    input_type
        .parse::<InputKind>()
        .unwrap_or(InputKind::Text)
        .test_value()
}

/// Discovers form controls and infers their semantic kind.
#[derive(Debug, Clone, Default)]
pub struct InputDiscovery {
    include_disabled: bool,
}

impl InputDiscovery {
    /// Create an input discovery that skips disabled controls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also report disabled controls.
    pub fn include_disabled(mut self, include: bool) -> Self {
        self.include_disabled = include;
        self
    }

    /// Representative value for an input type name.
    pub fn get_test_value_for_input(&self, input_type: &str) -> &'static str {
        get_test_value_for_input(input_type)
    }

    fn actions(kind: InputKind) -> &'static [Action] {
        match kind {
            InputKind::Checkbox => &[Action::Click, Action::Check, Action::Uncheck],
            InputKind::Radio => &[Action::Click, Action::Check],
            InputKind::Select => &[Action::Select, Action::Focus],
            InputKind::File => &[Action::Click],
            _ => &[Action::Fill, Action::Focus, Action::Press],
        }
    }
}

#[async_trait]
impl FeatureDiscovery for InputDiscovery {
    fn name(&self) -> &'static str {
        "input"
    }

    fn priority(&self) -> u32 {
        70
    }

    async fn discover(
        &self,
        driver: &dyn Driver,
        context: &DiscoveryContext,
    ) -> DriverResult<Vec<DiscoveredFeature>> {
        let mut features = Vec::new();
        let mut seen = HashSet::new();

        for (position, (handle, snapshot)) in context
            .elements(driver, INPUT_SELECTOR)
            .await?
            .into_iter()
            .enumerate()
        {
            if !snapshot.enabled && !self.include_disabled {
                continue;
            }
            let kind = InputKind::infer(&snapshot.tag, &snapshot.attributes);
            let feature_type = if kind == InputKind::Select {
                FeatureType::Dropdown
            } else {
                FeatureType::Input
            };
            let Some(feature) = context
                .feature(driver, handle.as_ref(), &snapshot, feature_type, position)
                .await
            else {
                continue;
            };
            if !seen.insert(feature.selector.clone()) {
                continue;
            }
            tracing::debug!("input '{}' inferred as {}", feature.selector, kind);
            let actions = actions_if_interactive(&snapshot, Self::actions(kind));
            features.push(feature.with_actions(actions));
        }
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_infer_from_type() {
        assert_eq!(InputKind::infer("input", &attrs(&[("type", "email")])), InputKind::Email);
        assert_eq!(
            InputKind::infer("input", &attrs(&[("type", "DATETIME-LOCAL")])),
            InputKind::DateTimeLocal
        );
        assert_eq!(InputKind::infer("textarea", &attrs(&[])), InputKind::Textarea);
        assert_eq!(InputKind::infer("select", &attrs(&[("type", "email")])), InputKind::Select);
    }

    #[test]
    fn test_infer_from_hints() {
        assert_eq!(
            InputKind::infer("input", &attrs(&[("type", "text"), ("name", "user_email")])),
            InputKind::Email
        );
        assert_eq!(
            InputKind::infer("input", &attrs(&[("placeholder", "Your phone")])),
            InputKind::Tel
        );
        assert_eq!(
            InputKind::infer("input", &attrs(&[("autocomplete", "current-password")])),
            InputKind::Password
        );
        assert_eq!(InputKind::infer("input", &attrs(&[("name", "first")])), InputKind::Text);
    }

    #[test]
    fn test_type_attribute_beats_hints() {
        assert_eq!(
            InputKind::infer("input", &attrs(&[("type", "password"), ("name", "email")])),
            InputKind::Password
        );
    }

    #[test]
    fn test_test_values_are_plausible() {
        assert!(InputKind::Email.test_value().contains('@'));
        let password = InputKind::Password.test_value();
        assert!(password.len() >= 8);
        assert!(password.chars().any(|c| c.is_ascii_uppercase()));
        assert!(password.chars().any(|c| c.is_ascii_digit()));
        assert!(password.chars().any(|c| !c.is_ascii_alphanumeric()));
        assert_eq!(InputKind::Date.test_value(), "2024-01-15");
        for kind in InputKind::ALL {
            if kind.is_fillable() {
                assert!(!kind.test_value().is_empty(), "{kind}");
            }
        }
    }

    #[test]
    fn test_of_feature_uses_tag() {
        let feature =
            DiscoveredFeature::new("Bio", FeatureType::Input, "textarea").with_tag("textarea");
        assert_eq!(InputKind::of_feature(&feature), InputKind::Textarea);

        let dropdown = DiscoveredFeature::new("Plan", FeatureType::Dropdown, "select");
        assert_eq!(InputKind::of_feature(&dropdown), InputKind::Select);

        let bare = DiscoveredFeature::new("x", FeatureType::Input, "input");
        assert_eq!(InputKind::of_feature(&bare), InputKind::Text);
    }
}

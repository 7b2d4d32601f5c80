//! Discovered feature tree.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// DOM attributes captured for a feature, keyed by attribute name.
///
/// Absence of the whole map (`None` on the feature) and an attribute missing
/// from the map are distinct: the first means nothing was captured.
pub type Attributes = BTreeMap<String, String>;

/// Category of a discovered feature.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    /// Clickable button
    Button,
    /// Menu or menubar
    Menu,
    /// Generic panel / region
    Panel,
    /// Text-like form control
    Input,
    /// Chart or canvas visualisation
    Chart,
    /// Data table
    Table,
    /// Dialog
    Modal,
    /// Select or dropdown widget
    Dropdown,
    /// Tab list
    Tab,
    /// Navigation container
    Navigation,
    /// Anything else
    Other,
}

impl FeatureType {
    /// All feature types, in declaration order.
    pub const ALL: [FeatureType; 11] = [
        FeatureType::Button,
        FeatureType::Menu,
        FeatureType::Panel,
        FeatureType::Input,
        FeatureType::Chart,
        FeatureType::Table,
        FeatureType::Modal,
        FeatureType::Dropdown,
        FeatureType::Tab,
        FeatureType::Navigation,
        FeatureType::Other,
    ];

    /// Get the type name as used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::Button => "button",
            FeatureType::Menu => "menu",
            FeatureType::Panel => "panel",
            FeatureType::Input => "input",
            FeatureType::Chart => "chart",
            FeatureType::Table => "table",
            FeatureType::Modal => "modal",
            FeatureType::Dropdown => "dropdown",
            FeatureType::Tab => "tab",
            FeatureType::Navigation => "navigation",
            FeatureType::Other => "other",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        FeatureType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::Error::InvalidInput(format!("unknown feature type: {s}")))
    }
}

/// Interaction verb a feature supports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Click
    Click,
    /// Type a value
    Fill,
    /// Pointer hover
    Hover,
    /// Keyboard focus
    Focus,
    /// Choose an option
    Select,
    /// Tick a checkbox or radio
    Check,
    /// Untick a checkbox
    Uncheck,
    /// Key press
    Press,
}

/// Visibility and enabled state observed at discovery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ElementState {
    /// Rendered and not hidden
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
}

impl ElementState {
    /// Whether a user could interact with the element.
    pub fn is_interactive(&self) -> bool {
        self.visible && self.enabled
    }
}

/// UI element discovered on a live page, possibly with nested child features.
///
/// Children are owned by their parent; the tree has no sharing and no cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredFeature {
    /// Human-readable name
    pub name: String,
    /// Feature category
    #[serde(rename = "type")]
    pub feature_type: FeatureType,
    /// Selector resolving to the element on the live page
    pub selector: String,
    /// Lower-case tag name of the element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Visible text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Captured attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    /// Nested features, in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DiscoveredFeature>,
    /// Supported interactions
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub actions: BTreeSet<Action>,
    /// Base64-encoded screenshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    /// Visibility/enabled state at discovery time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ElementState>,
    /// Number of descendant elements (composite components)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descendant_count: Option<usize>,
}

impl DiscoveredFeature {
    /// Create a feature with the required fields only.
    pub fn new(
        name: impl Into<String>,
        feature_type: FeatureType,
        selector: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            feature_type,
            selector: selector.into(),
            tag: None,
            text: None,
            attributes: None,
            children: Vec::new(),
            actions: BTreeSet::new(),
            screenshot: None,
            state: None,
            descendant_count: None,
        }
    }

    /// Set the element's tag name.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.tag = (!tag.is_empty()).then_some(tag);
        self
    }

    /// Set text content. Empty or whitespace-only text is treated as absent.
    pub fn with_text(mut self, text: Option<String>) -> Self {
        self.text = text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    /// Set captured attributes.
    pub fn with_attributes(mut self, attributes: Option<Attributes>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set child features.
    pub fn with_children(mut self, children: Vec<DiscoveredFeature>) -> Self {
        self.children = children;
        self
    }

    /// Set supported actions.
    pub fn with_actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions = actions.into_iter().collect();
        self
    }

    /// Set observed state.
    pub fn with_state(mut self, state: ElementState) -> Self {
        self.state = Some(state);
        self
    }

    /// Set screenshot payload.
    pub fn with_screenshot(mut self, screenshot: Option<String>) -> Self {
        self.screenshot = screenshot;
        self
    }

    /// Set descendant count.
    pub fn with_descendant_count(mut self, count: usize) -> Self {
        self.descendant_count = Some(count);
        self
    }

    /// Look up a captured attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .as_ref()
            .and_then(|attrs| attrs.get(name))
            .map(String::as_str)
    }

    /// Whether the feature supports any interaction.
    pub fn is_interactive(&self) -> bool {
        !self.actions.is_empty()
    }

    /// Whether the feature has non-empty text.
    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Total number of features in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(|c| c.subtree_len()).sum::<usize>()
    }
}

//! One-shot element inspection.

use feature_discovery_core::{Attributes, DriverResult, ElementState};
use feature_discovery_driver::ElementHandle;

use crate::selector::ElementInfo;

/// Attributes captured for every inspected element.
pub const BASE_ATTRIBUTES: [&str; 19] = [
    "id",
    "class",
    "name",
    "type",
    "href",
    "role",
    "aria-label",
    "placeholder",
    "title",
    "alt",
    "for",
    "value",
    "autocomplete",
    "disabled",
    "checked",
    "required",
    "contenteditable",
    "data-component",
    "data-widget",
];

/// Everything discovery reads from one element, read once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSnapshot {
    /// Lower-case tag name
    pub tag: String,
    /// Trimmed text content, `None` when blank
    pub text: Option<String>,
    /// Attributes that were present
    pub attributes: Attributes,
    /// Rendered and not hidden
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
}

impl ElementSnapshot {
    /// Read tag, text, the named attributes and state from `handle`.
    pub async fn capture(
        handle: &dyn ElementHandle,
        attribute_names: &[String],
    ) -> DriverResult<Self> {
        let tag = handle.tag_name().await?.to_ascii_lowercase();
        let text = handle
            .text_content()
            .await?
            .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|t| !t.is_empty());

        let mut attributes = Attributes::new();
        for name in attribute_names {
            if attributes.contains_key(name) {
                continue;
            }
            if let Some(value) = handle.get_attribute(name).await? {
                attributes.insert(name.clone(), value);
            }
        }

        let visible = handle.is_visible().await?;
        let enabled = handle.is_enabled().await?;
        tracing::debug!(
            "inspected <{}> {}[{}] visible={} enabled={}",
            tag,
            handle.selector(),
            handle.index(),
            visible,
            enabled
        );

        Ok(Self {
            tag,
            text,
            attributes,
            visible,
            enabled,
        })
    }

    /// Observed state.
    pub fn state(&self) -> ElementState {
        ElementState {
            visible: self.visible,
            enabled: self.enabled,
        }
    }

    /// Input for the selector generator.
    pub fn element_info(&self) -> ElementInfo {
        ElementInfo {
            tag: self.tag.clone(),
            attributes: self.attributes.clone(),
        }
    }

    /// Attribute value, if captured.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Best human-readable label: text, then labelling attributes.
    pub fn label(&self) -> Option<String> {
        self.text
            .clone()
            .or_else(|| {
                ["aria-label", "title", "placeholder", "name", "id", "alt", "value"]
                    .iter()
                    .find_map(|name| self.attribute(name).map(str::trim).filter(|v| !v.is_empty()))
                    .map(str::to_string)
            })
            .map(|label| truncate(&label, 60))
    }
}

/// Attribute names to capture: the base set plus `extra`, without duplicates.
pub fn attribute_names(extra: &[String]) -> Vec<String> {
    let mut names: Vec<String> = BASE_ATTRIBUTES.iter().map(|s| s.to_string()).collect();
    for name in extra {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars).collect();
        out.push('…');
        out
    }
}

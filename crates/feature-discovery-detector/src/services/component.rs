//! Composite component discovery.

use std::collections::HashSet;

use async_trait::async_trait;

use feature_discovery_core::{Action, DiscoveredFeature, DriverResult, FeatureType};
use feature_discovery_driver::Driver;

use crate::discovery::{actions_if_interactive, DiscoveryContext, FeatureDiscovery};

/// Component markers, in scan order. `None` means the type comes from the
/// marker attribute's value.
const MARKERS: [(&str, Option<FeatureType>); 9] = [
    ("[data-component]", None),
    ("[data-widget]", None),
    ("[role=\"dialog\"], dialog", Some(FeatureType::Modal)),
    ("[role=\"tablist\"]", Some(FeatureType::Tab)),
    ("[role=\"menu\"], [role=\"menubar\"]", Some(FeatureType::Menu)),
    ("table", Some(FeatureType::Table)),
    ("[data-chart], canvas", Some(FeatureType::Chart)),
    ("[role=\"listbox\"]", Some(FeatureType::Dropdown)),
    ("[role=\"region\"], [role=\"tabpanel\"]", Some(FeatureType::Panel)),
];

/// Map a `data-component` / `data-widget` value to a feature type.
pub fn classify_component(value: &str) -> FeatureType {
    let value = value.to_ascii_lowercase();
    const RULES: [(&[&str], FeatureType); 7] = [
        (&["modal", "dialog", "popup"], FeatureType::Modal),
        (&["table", "grid"], FeatureType::Table),
        (&["tab"], FeatureType::Tab),
        (&["menu"], FeatureType::Menu),
        (&["chart", "graph", "plot"], FeatureType::Chart),
        (&["dropdown", "select", "combobox"], FeatureType::Dropdown),
        (&["nav"], FeatureType::Navigation),
    ];
    RULES
        .iter()
        .find(|(words, _)| words.iter().any(|w| value.contains(w)))
        .map(|(_, t)| *t)
        .unwrap_or(FeatureType::Panel)
}

/// Discovers composite components by marker attributes and ARIA roles.
///
/// Reports each component's descendant count instead of expanding its
/// subtree into child features.
#[derive(Debug, Clone, Default)]
pub struct ComponentDiscovery;

impl ComponentDiscovery {
    /// Create a component discovery.
    pub fn new() -> Self {
        Self
    }

    fn actions(feature_type: FeatureType) -> &'static [Action] {
        match feature_type {
            FeatureType::Tab | FeatureType::Dropdown => &[Action::Click],
            FeatureType::Menu => &[Action::Click, Action::Hover],
            _ => &[],
        }
    }
}

#[async_trait]
impl FeatureDiscovery for ComponentDiscovery {
    fn name(&self) -> &'static str {
        "component"
    }

    fn priority(&self) -> u32 {
        90
    }

    async fn discover(
        &self,
        driver: &dyn Driver,
        context: &DiscoveryContext,
    ) -> DriverResult<Vec<DiscoveredFeature>> {
        let mut features = Vec::new();
        let mut seen = HashSet::new();

        for (marker, fixed_type) in MARKERS {
            for (position, (handle, snapshot)) in context
                .elements(driver, marker)
                .await?
                .into_iter()
                .enumerate()
            {
                let marker_value = snapshot
                    .attribute("data-component")
                    .or_else(|| snapshot.attribute("data-widget"))
                    .map(str::to_string);
                let feature_type = fixed_type.unwrap_or_else(|| {
                    classify_component(marker_value.as_deref().unwrap_or_default())
                });

                let Some(mut feature) = context
                    .feature(driver, handle.as_ref(), &snapshot, feature_type, position)
                    .await
                else {
                    continue;
                };
                if !seen.insert(feature.selector.clone()) {
                    continue;
                }
                if let Some(value) = marker_value.filter(|v| !v.trim().is_empty()) {
                    feature.name = value;
                }

                let descendants = driver
                    .locate(&format!("{} *", feature.selector))
                    .count()
                    .await?;
                let actions = actions_if_interactive(&snapshot, Self::actions(feature_type));
                features.push(
                    feature
                        .with_descendant_count(descendants)
                        .with_actions(actions),
                );
            }
        }
        Ok(features)
    }
}

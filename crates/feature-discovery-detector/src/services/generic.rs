//! Category-agnostic discovery built only from `count` and `nth`.

use std::collections::HashSet;

use async_trait::async_trait;

use feature_discovery_core::{Action, DiscoveredFeature, DriverResult, FeatureType};
use feature_discovery_driver::Driver;

use crate::discovery::{actions_if_interactive, DiscoveryContext, FeatureDiscovery};
use crate::services::input::InputKind;

/// Probes run by the generic scan: selector, feature type.
const PROBES: [(&str, FeatureType); 8] = [
    (
        "button, input[type=\"button\"], input[type=\"submit\"], [role=\"button\"]",
        FeatureType::Button,
    ),
    ("input:not([type=\"hidden\"]), textarea", FeatureType::Input),
    ("select", FeatureType::Dropdown),
    ("nav, [role=\"navigation\"]", FeatureType::Navigation),
    ("[role=\"tab\"]", FeatureType::Tab),
    ("[role=\"dialog\"], dialog", FeatureType::Modal),
    ("[role=\"menu\"]", FeatureType::Menu),
    ("table", FeatureType::Table),
];

/// Approximates every category with one flat pass per probe selector.
///
/// Each probe counts its matches, then resolves them one index at a time
/// since a live collection may shift between calls. Needs nothing beyond
/// `locate`, `count` and `nth`, so it works on any backend. Produces no child
/// features.
#[derive(Debug, Clone, Default)]
pub struct GenericDiscoveryService;

impl GenericDiscoveryService {
    /// Create a generic discovery service.
    pub fn new() -> Self {
        Self
    }

    fn actions(feature_type: FeatureType, kind: InputKind) -> &'static [Action] {
        match (feature_type, kind) {
            (FeatureType::Input, InputKind::Checkbox | InputKind::Radio) => &[Action::Check],
            (FeatureType::Input, InputKind::File) => &[Action::Click],
            (FeatureType::Input, _) => &[Action::Fill],
            (FeatureType::Dropdown, _) => &[Action::Select],
            (FeatureType::Button | FeatureType::Tab | FeatureType::Menu, _) => &[Action::Click],
            _ => &[],
        }
    }
}

#[async_trait]
impl FeatureDiscovery for GenericDiscoveryService {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn priority(&self) -> u32 {
        50
    }

    async fn discover(
        &self,
        driver: &dyn Driver,
        context: &DiscoveryContext,
    ) -> DriverResult<Vec<DiscoveredFeature>> {
        let include_disabled = context.settings().include_disabled;
        let mut features = Vec::new();
        let mut seen = HashSet::new();

        for (selector, feature_type) in PROBES {
            for (position, (handle, snapshot)) in context
                .elements(driver, selector)
                .await?
                .into_iter()
                .enumerate()
            {
                if !snapshot.enabled && !include_disabled {
                    continue;
                }
                let Some(feature) = context
                    .feature(driver, handle.as_ref(), &snapshot, feature_type, position)
                    .await
                else {
                    continue;
                };
                if !seen.insert(feature.selector.clone()) {
                    continue;
                }
                let kind = InputKind::infer(&snapshot.tag, &snapshot.attributes);
                let actions = actions_if_interactive(&snapshot, Self::actions(feature_type, kind));
                features.push(feature.with_actions(actions));
            }
        }
        Ok(features)
    }
}

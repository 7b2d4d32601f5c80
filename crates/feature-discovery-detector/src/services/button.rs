//! Button discovery.

use std::collections::HashSet;

use async_trait::async_trait;

use feature_discovery_core::{Action, DiscoveredFeature, DriverResult, FeatureType};
use feature_discovery_driver::Driver;

use crate::discovery::{actions_if_interactive, DiscoveryContext, FeatureDiscovery};

/// Everything a user would recognise as a button.
pub const BUTTON_SELECTOR: &str = "button, input[type=\"button\"], input[type=\"submit\"], \
     input[type=\"reset\"], [role=\"button\"]";

/// Discovers buttons.
///
/// Disabled buttons are skipped unless `include_disabled` is set. Hidden
/// buttons are kept with their state so tests can assert on it.
#[derive(Debug, Clone, Default)]
pub struct ButtonDiscovery {
    include_disabled: bool,
}

impl ButtonDiscovery {
    /// Create a button discovery that skips disabled buttons.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also report disabled buttons.
    pub fn include_disabled(mut self, include: bool) -> Self {
        self.include_disabled = include;
        self
    }
}

#[async_trait]
impl FeatureDiscovery for ButtonDiscovery {
    fn name(&self) -> &'static str {
        "button"
    }

    fn priority(&self) -> u32 {
        60
    }

    async fn discover(
        &self,
        driver: &dyn Driver,
        context: &DiscoveryContext,
    ) -> DriverResult<Vec<DiscoveredFeature>> {
        let mut features = Vec::new();
        let mut seen = HashSet::new();

        for (position, (handle, snapshot)) in context
            .elements(driver, BUTTON_SELECTOR)
            .await?
            .into_iter()
            .enumerate()
        {
            if !snapshot.enabled && !self.include_disabled {
                tracing::debug!("skipping disabled button {:?}", snapshot.text);
                continue;
            }
            let Some(feature) = context
                .feature(driver, handle.as_ref(), &snapshot, FeatureType::Button, position)
                .await
            else {
                continue;
            };
            if !seen.insert(feature.selector.clone()) {
                continue;
            }
            let actions =
                actions_if_interactive(&snapshot, &[Action::Click, Action::Hover, Action::Focus]);
            features.push(feature.with_actions(actions));
        }
        Ok(features)
    }
}

//! Navigation container discovery.

use std::collections::HashSet;

use async_trait::async_trait;

use feature_discovery_core::{Action, DiscoveredFeature, DriverResult, FeatureType};
use feature_discovery_driver::Driver;

use crate::discovery::{DiscoveryContext, FeatureDiscovery};

/// Navigation containers.
pub const NAVIGATION_SELECTOR: &str = "nav, [role=\"navigation\"]";

/// Discovers navigation containers and their links.
///
/// Each link becomes a child feature carrying its text and `href`. Link
/// selectors are scoped to their container unless they already carry an id
/// or test identifier.
#[derive(Debug, Clone, Default)]
pub struct NavigationDiscovery;

impl NavigationDiscovery {
    /// Create a navigation discovery.
    pub fn new() -> Self {
        Self
    }

    async fn links(
        &self,
        driver: &dyn Driver,
        context: &DiscoveryContext,
        container: &str,
    ) -> DriverResult<Vec<DiscoveredFeature>> {
        let mut links = Vec::new();
        let mut seen = HashSet::new();

        for (position, (handle, snapshot)) in context
            .elements(driver, &format!("{container} a[href]"))
            .await?
            .into_iter()
            .enumerate()
        {
            let Some(selector) = context
                .unique_selector(driver, handle.as_ref(), &snapshot, Some(container))
                .await
            else {
                continue;
            };
            if !seen.insert(selector.clone()) {
                continue;
            }

            let name = snapshot
                .label()
                .unwrap_or_else(|| format!("link {}", position + 1));
            let actions = if snapshot.visible {
                vec![Action::Click]
            } else {
                Vec::new()
            };
            links.push(
                DiscoveredFeature::new(name, FeatureType::Other, selector)
                    .with_tag(snapshot.tag.clone())
                    .with_text(snapshot.text.clone())
                    .with_attributes(Some(snapshot.attributes.clone()))
                    .with_state(snapshot.state())
                    .with_actions(actions),
            );
        }
        Ok(links)
    }
}

#[async_trait]
impl FeatureDiscovery for NavigationDiscovery {
    fn name(&self) -> &'static str {
        "navigation"
    }

    fn priority(&self) -> u32 {
        80
    }

    async fn discover(
        &self,
        driver: &dyn Driver,
        context: &DiscoveryContext,
    ) -> DriverResult<Vec<DiscoveredFeature>> {
        let mut features = Vec::new();
        let mut seen = HashSet::new();

        for (position, (handle, snapshot)) in context
            .elements(driver, NAVIGATION_SELECTOR)
            .await?
            .into_iter()
            .enumerate()
        {
            let Some(feature) = context
                .feature(driver, handle.as_ref(), &snapshot, FeatureType::Navigation, position)
                .await
            else {
                continue;
            };
            if !seen.insert(feature.selector.clone()) {
                continue;
            }

            let links = self.links(driver, context, &feature.selector).await?;
            tracing::debug!("navigation '{}' has {} links", feature.selector, links.len());
            let actions = if links.iter().any(|l| l.is_interactive()) {
                vec![Action::Click]
            } else {
                Vec::new()
            };
            features.push(feature.with_children(links).with_actions(actions));
        }
        Ok(features)
    }
}

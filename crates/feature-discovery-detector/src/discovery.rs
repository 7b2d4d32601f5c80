//! Discovery traits, shared per-run context and the aggregate service.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;

use feature_discovery_core::{
    Action, CategoryOutcome, DiscoveredFeature, DiscoveryMode, DiscoverySettings, DriverResult,
    FeatureType, PageMetrics,
};
use feature_discovery_driver::{Driver, ElementHandle, ScreenshotOptions};

use crate::inspect::{attribute_names, ElementSnapshot};
use crate::selector::{optimize_selector, structural_selectors, SelectorGenerator};
use crate::services::{
    ButtonDiscovery, ComponentDiscovery, GenericDiscoveryService, InputDiscovery,
    NavigationDiscovery,
};

/// Reference ID generator.
///
/// Generates unique IDs in the format `type_counter` (e.g. "button_1", "input_2").
#[derive(Debug, Clone, Default)]
pub struct RefIdGenerator {
    counters: HashMap<String, usize>,
}

impl RefIdGenerator {
    /// Create a new RefIdGenerator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next ID for a given type.
    ///
    /// # Example
    /// ```
    /// use feature_discovery_detector::discovery::RefIdGenerator;
    ///
    /// let mut gen = RefIdGenerator::new();
    /// assert_eq!(gen.next("button"), "button_1");
    /// assert_eq!(gen.next("button"), "button_2");
    /// assert_eq!(gen.next("input"), "input_1");
    /// ```
    pub fn next(&mut self, kind: &str) -> String {
        let counter = self.counters.entry(kind.to_string()).or_insert(0);
        *counter += 1;
        format!("{kind}_{counter}")
    }

    /// Reset all counters.
    pub fn reset(&mut self) {
        self.counters.clear();
    }
}

/// State shared by the services of one discovery pass.
#[derive(Debug, Clone)]
pub struct DiscoveryContext {
    settings: DiscoverySettings,
    generator: SelectorGenerator,
    attribute_names: Vec<String>,
    claimed: HashSet<String>,
}

impl DiscoveryContext {
    /// Create a context for `settings`.
    pub fn new(settings: DiscoverySettings) -> Self {
        let generator = SelectorGenerator::new(settings.test_id_attributes.iter().cloned());
        let attribute_names = attribute_names(generator.test_id_attributes());
        Self {
            settings,
            generator,
            attribute_names,
            claimed: HashSet::new(),
        }
    }

    /// Settings of this pass.
    pub fn settings(&self) -> &DiscoverySettings {
        &self.settings
    }

    /// Selector generator configured with the test-identifier attributes.
    pub fn generator(&self) -> &SelectorGenerator {
        &self.generator
    }

    /// Whether a higher-priority service already reported `selector`.
    pub fn is_claimed(&self, selector: &str) -> bool {
        self.claimed.contains(selector)
    }

    /// Claim a feature's selector and those of its children.
    pub fn claim(&mut self, feature: &DiscoveredFeature) {
        self.claimed.insert(feature.selector.clone());
        for child in &feature.children {
            self.claim(child);
        }
    }

    /// Snapshot every element matching `selector`, up to the per-category cap.
    ///
    /// Counts first, then resolves each index. An element that disappears
    /// between the count and its lookup is skipped.
    pub async fn elements(
        &self,
        driver: &dyn Driver,
        selector: &str,
    ) -> DriverResult<Vec<(Box<dyn ElementHandle>, ElementSnapshot)>> {
        let locator = driver.locate(selector);
        let count = locator.count().await?;
        let limit = count.min(self.settings.max_elements_per_category);
        if limit < count {
            tracing::debug!("'{}' matched {} elements, inspecting {}", selector, count, limit);
        }

        let mut elements = Vec::with_capacity(limit);
        for index in 0..limit {
            let handle = locator.nth(index);
            match ElementSnapshot::capture(handle.as_ref(), &self.attribute_names).await {
                Ok(snapshot) => elements.push((handle, snapshot)),
                Err(e) if e.is_not_found() => {
                    tracing::debug!("'{}'[{}] vanished during discovery", selector, index);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(elements)
    }

    /// A selector matching only the element behind `handle`.
    pub async fn selector_for(
        &self,
        driver: &dyn Driver,
        handle: &dyn ElementHandle,
        snapshot: &ElementSnapshot,
    ) -> Option<String> {
        self.unique_selector(driver, handle, snapshot, None).await
    }

    /// A selector matching only the element behind `handle`, built under
    /// `scope` when given.
    ///
    /// Tries the generator's candidates tier by tier and takes the first that
    /// matches exactly one element. Scoped candidates are prefixed with
    /// `scope` unless they start with an id or attribute. When no tier is
    /// unique, falls back to the element's `:nth-of-type` path.
    pub async fn unique_selector(
        &self,
        driver: &dyn Driver,
        handle: &dyn ElementHandle,
        snapshot: &ElementSnapshot,
        scope: Option<&str>,
    ) -> Option<String> {
        for candidate in self.generator.candidates(Some(&snapshot.element_info())) {
            let candidate = match scope {
                Some(scope) if !candidate.starts_with(&['#', '['][..]) => {
                    format!("{scope} {candidate}")
                }
                _ => candidate,
            };
            if let Some(selector) = self.verify(driver, &candidate).await {
                return Some(selector);
            }
        }

        let path = match handle.structural_path().await {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!("no structural path for <{}>: {}", snapshot.tag, e);
                return None;
            }
        };
        for candidate in structural_selectors(&path) {
            if let Some(selector) = self.verify(driver, &candidate).await {
                return Some(selector);
            }
        }
        tracing::debug!("no unique selector for <{}>", snapshot.tag);
        None
    }

    /// `selector` if it matches exactly one element, optimized when enabled.
    ///
    /// Optimization preserves the match count, so the result stays unique.
    pub async fn verify(&self, driver: &dyn Driver, selector: &str) -> Option<String> {
        match driver.locate(selector).count().await {
            Ok(1) => {}
            Ok(count) => {
                tracing::debug!("selector '{}' matches {} elements", selector, count);
                return None;
            }
            Err(e) => {
                tracing::debug!("generated selector '{}' not usable: {}", selector, e);
                return None;
            }
        }
        if self.settings.optimize_selectors {
            Some(optimize_selector(selector, Some(driver)).await)
        } else {
            Some(selector.to_string())
        }
    }

    /// Build a feature from an inspected element.
    ///
    /// `None` when no verifiable selector exists or the selector is already
    /// claimed.
    pub async fn feature(
        &self,
        driver: &dyn Driver,
        handle: &dyn ElementHandle,
        snapshot: &ElementSnapshot,
        feature_type: FeatureType,
        position: usize,
    ) -> Option<DiscoveredFeature> {
        let selector = self.selector_for(driver, handle, snapshot).await?;
        if self.is_claimed(&selector) {
            tracing::debug!("'{}' already claimed", selector);
            return None;
        }

        let name = snapshot
            .label()
            .unwrap_or_else(|| format!("{} {}", feature_type, position + 1));
        let attributes = (!snapshot.attributes.is_empty()).then(|| snapshot.attributes.clone());
        let screenshot = if self.settings.capture_feature_screenshots && snapshot.visible {
            capture(handle).await
        } else {
            None
        };

        Some(
            DiscoveredFeature::new(name, feature_type, selector)
                .with_tag(snapshot.tag.clone())
                .with_text(snapshot.text.clone())
                .with_attributes(attributes)
                .with_state(snapshot.state())
                .with_screenshot(screenshot),
        )
    }
}

impl Default for DiscoveryContext {
    fn default() -> Self {
        Self::new(DiscoverySettings::default())
    }
}

async fn capture(handle: &dyn ElementHandle) -> Option<String> {
    match handle.screenshot(ScreenshotOptions::default()).await {
        Ok(bytes) => Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
        Err(e) => {
            tracing::debug!("feature screenshot failed: {}", e);
            None
        }
    }
}

/// Actions available on an element in `snapshot`'s state.
pub(crate) fn actions_if_interactive(
    snapshot: &ElementSnapshot,
    actions: &[Action],
) -> Vec<Action> {
    if snapshot.state().is_interactive() {
        actions.to_vec()
    } else {
        Vec::new()
    }
}

/// A category scanner.
#[async_trait]
pub trait FeatureDiscovery: Send + Sync {
    /// Category name, used in logs and per-category outcomes.
    fn name(&self) -> &'static str;

    /// Priority (higher = runs first, claims selectors).
    ///
    /// Typical priorities:
    /// - 90: Composite components
    /// - 80-70: Navigation and form inputs
    /// - 60: Buttons
    fn priority(&self) -> u32;

    /// Discover this category's features on the current page.
    async fn discover(
        &self,
        driver: &dyn Driver,
        context: &DiscoveryContext,
    ) -> DriverResult<Vec<DiscoveredFeature>>;

    /// Discover with default settings and no claimed selectors.
    async fn discover_page(&self, driver: &dyn Driver) -> DriverResult<Vec<DiscoveredFeature>> {
        self.discover(driver, &DiscoveryContext::default()).await
    }
}

/// Result of one aggregate discovery pass.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    /// Features in service priority order, then document order
    pub features: Vec<Arc<DiscoveredFeature>>,
    /// One outcome per service that ran
    pub categories: Vec<CategoryOutcome>,
    /// Page-level counts, when collected and available
    pub page_metrics: Option<PageMetrics>,
}

/// Runs category services in priority order and merges their features.
///
/// A failing service contributes an empty outcome with the failure as its
/// reason; the remaining services still run.
pub struct DiscoveryService {
    services: Vec<Arc<dyn FeatureDiscovery>>,
    settings: DiscoverySettings,
}

impl DiscoveryService {
    /// Create the service set for `settings.mode`.
    pub fn new(settings: DiscoverySettings) -> Self {
        let mut service = Self::empty(settings);
        match service.settings.mode {
            DiscoveryMode::Standard => {
                let include_disabled = service.settings.include_disabled;
                service.add_service(Arc::new(ComponentDiscovery::new()));
                service.add_service(Arc::new(NavigationDiscovery::new()));
                service.add_service(Arc::new(
                    InputDiscovery::new().include_disabled(include_disabled),
                ));
                service.add_service(Arc::new(
                    ButtonDiscovery::new().include_disabled(include_disabled),
                ));
            }
            DiscoveryMode::Generic => {
                service.add_service(Arc::new(GenericDiscoveryService::new()));
            }
        }
        service
    }

    /// Create a service with no category services.
    pub fn empty(settings: DiscoverySettings) -> Self {
        Self {
            services: Vec::new(),
            settings,
        }
    }

    /// Add a category service.
    pub fn add_service(&mut self, service: Arc<dyn FeatureDiscovery>) {
        self.services.push(service);
        self.services
            .sort_by_key(|s| std::cmp::Reverse(s.priority()));
    }

    /// Names of the registered services, in run order.
    pub fn service_names(&self) -> Vec<&'static str> {
        self.services.iter().map(|s| s.name()).collect()
    }

    /// Run every service against the current page.
    pub async fn discover(&self, driver: &dyn Driver) -> DiscoveryOutcome {
        let mut context = DiscoveryContext::new(self.settings.clone());
        let mut outcome = DiscoveryOutcome::default();

        for service in &self.services {
            match service.discover(driver, &context).await {
                Ok(features) => {
                    tracing::info!(
                        "{} discovery found {} features",
                        service.name(),
                        features.len()
                    );
                    outcome
                        .categories
                        .push(CategoryOutcome::discovered(service.name(), features.len()));
                    for feature in features {
                        context.claim(&feature);
                        outcome.features.push(Arc::new(feature));
                    }
                }
                Err(e) => {
                    tracing::warn!("{} discovery failed, treating as empty: {}", service.name(), e);
                    outcome
                        .categories
                        .push(CategoryOutcome::empty(service.name(), e.to_string()));
                }
            }
        }

        if self.settings.collect_page_metrics {
            match driver.page_metrics().await {
                Ok(metrics) => outcome.page_metrics = Some(metrics),
                Err(e) => tracing::warn!("page metrics unavailable: {}", e),
            }
        }
        outcome
    }

    /// Run every service and return only the merged features.
    pub async fn discover_features(&self, driver: &dyn Driver) -> Vec<Arc<DiscoveredFeature>> {
        self.discover(driver).await.features
    }
}

//! Test case synthesis from discovered features.

use std::sync::Arc;

use feature_discovery_core::{
    Action, Assertion, AssertionType, Attributes, DiscoveredFeature, Expected, FeatureType,
    StepAction, TestCase, TestStep,
};
use feature_discovery_detector::{InputKind, RefIdGenerator};

/// Value typed into inputs when no value source is configured.
pub const DEFAULT_FILL_VALUE: &str = "test value";

/// Selector asserted visible after a navigation click.
pub const PAGE_ROOT_SELECTOR: &str = "body";

/// Supplies the value typed into an input feature.
pub trait ValueSource: Send + Sync {
    /// Value for `feature`; `None` falls back to [`DEFAULT_FILL_VALUE`].
    fn value_for(&self, feature: &DiscoveredFeature) -> Option<String>;
}

/// Values from the input-kind table (`email` gets an address, and so on).
#[derive(Debug, Clone, Copy, Default)]
pub struct InputKindValues;

impl ValueSource for InputKindValues {
    fn value_for(&self, feature: &DiscoveredFeature) -> Option<String> {
        let value = InputKind::of_feature(feature).test_value();
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Turns a navigation feature into click steps.
pub trait NavigationHandler: Send + Sync {
    /// Steps exercising `navigation`'s links.
    fn link_steps(&self, navigation: &DiscoveredFeature) -> Vec<TestStep>;
}

/// Clicks every clickable link of a navigation container, in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickEachLink;

impl NavigationHandler for ClickEachLink {
    fn link_steps(&self, navigation: &DiscoveredFeature) -> Vec<TestStep> {
        navigation
            .children
            .iter()
            .filter(|link| link.actions.contains(&Action::Click))
            .map(|link| {
                TestStep::new(
                    StepAction::Click,
                    link.selector.clone(),
                    format!("Click link '{}'", link.name),
                )
            })
            .collect()
    }
}

/// Maps discovered features to executable test cases.
///
/// Dispatch is by feature type:
/// - button: click, then assert visible and enabled; assertion-only when the
///   button was hidden or disabled
/// - input: fill with a value from the value source, then assert the value
///   stuck; checkboxes and radios are checked instead
/// - dropdown: assert visible
/// - navigation: click links through the navigation handler, or one
///   representative link without one, then assert the page rendered
/// - anything else: assertion-only
#[derive(Clone, Default)]
pub struct TestCaseSynthesizer {
    value_source: Option<Arc<dyn ValueSource>>,
    navigation: Option<Arc<dyn NavigationHandler>>,
}

impl TestCaseSynthesizer {
    /// Create a synthesizer with no value source and no navigation handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `source` for input values.
    pub fn with_value_source(mut self, source: Arc<dyn ValueSource>) -> Self {
        self.value_source = Some(source);
        self
    }

    /// Use `handler` for navigation features.
    pub fn with_navigation_handler(mut self, handler: Arc<dyn NavigationHandler>) -> Self {
        self.navigation = Some(handler);
        self
    }

    /// Synthesize test cases for `features`, in input order.
    ///
    /// Every case references one of the given features.
    pub fn generate_test_cases(&self, features: &[Arc<DiscoveredFeature>]) -> Vec<TestCase> {
        let mut ids = RefIdGenerator::new();
        let cases: Vec<TestCase> = features
            .iter()
            .map(|feature| self.synthesize(feature, &mut ids))
            .collect();
        tracing::info!(
            "synthesized {} test cases from {} features",
            cases.len(),
            features.len()
        );
        cases
    }

    fn synthesize(&self, feature: &Arc<DiscoveredFeature>, ids: &mut RefIdGenerator) -> TestCase {
        let (name, steps, assertions) = match feature.feature_type {
            FeatureType::Button => button_case(feature),
            FeatureType::Input => self.input_case(feature),
            FeatureType::Navigation => self.navigation_case(feature),
            _ => assertion_only_case(feature),
        };
        TestCase {
            id: ids.next(feature.feature_type.as_str()),
            name,
            feature: Arc::clone(feature),
            steps,
            assertions,
        }
    }

    fn input_case(&self, feature: &DiscoveredFeature) -> CaseParts {
        if !is_usable(feature) {
            return assertion_only_case(feature);
        }
        let selector = &feature.selector;
        match InputKind::of_feature(feature) {
            InputKind::Checkbox | InputKind::Radio => (
                format!("Check {}", feature.name),
                vec![TestStep::new(
                    StepAction::Check,
                    selector.clone(),
                    format!("Check '{}'", feature.name),
                )],
                vec![
                    visible(feature),
                    Assertion::new(
                        AssertionType::Enabled,
                        selector.clone(),
                        format!("'{}' is enabled", feature.name),
                    ),
                ],
            ),
            InputKind::File | InputKind::Select => assertion_only_case(feature),
            _ => {
                let value = self
                    .value_source
                    .as_ref()
                    .and_then(|source| source.value_for(feature))
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| DEFAULT_FILL_VALUE.to_string());
                let expected: Attributes = [("value".to_string(), value.clone())].into();
                (
                    format!("Fill {}", feature.name),
                    vec![TestStep::new(
                        StepAction::Fill,
                        selector.clone(),
                        format!("Fill '{}' with '{}'", feature.name, value),
                    )
                    .with_value(value)],
                    vec![Assertion::new(
                        AssertionType::Attribute,
                        selector.clone(),
                        format!("'{}' accepted the value", feature.name),
                    )
                    .expecting(Expected::Attributes(expected))],
                )
            }
        }
    }

    fn navigation_case(&self, feature: &DiscoveredFeature) -> CaseParts {
        let mut steps = match &self.navigation {
            Some(handler) => handler.link_steps(feature),
            None => representative_click(feature).into_iter().collect(),
        };
        if steps.is_empty() && is_usable(feature) {
            steps = representative_click(feature).into_iter().collect();
        }
        if steps.is_empty() {
            return assertion_only_case(feature);
        }
        (
            format!("Navigate via {}", feature.name),
            steps,
            vec![Assertion::new(
                AssertionType::Visible,
                PAGE_ROOT_SELECTOR,
                "Page is rendered after navigation",
            )],
        )
    }
}

type CaseParts = (String, Vec<TestStep>, Vec<Assertion>);

/// Whether the feature was visible and enabled when discovered. Features
/// without recorded state are assumed usable.
fn is_usable(feature: &DiscoveredFeature) -> bool {
    feature.state.map_or(true, |s| s.is_interactive())
}

fn visible(feature: &DiscoveredFeature) -> Assertion {
    Assertion::new(
        AssertionType::Visible,
        feature.selector.clone(),
        format!("'{}' is visible", feature.name),
    )
}

fn button_case(feature: &DiscoveredFeature) -> CaseParts {
    if !is_usable(feature) {
        return assertion_only_case(feature);
    }
    (
        format!("Click {}", feature.name),
        vec![TestStep::new(
            StepAction::Click,
            feature.selector.clone(),
            format!("Click '{}'", feature.name),
        )],
        vec![
            visible(feature),
            Assertion::new(
                AssertionType::Enabled,
                feature.selector.clone(),
                format!("'{}' is enabled", feature.name),
            ),
        ],
    )
}

/// First clickable link, or the container itself when it has no links.
fn representative_click(feature: &DiscoveredFeature) -> Option<TestStep> {
    if feature.children.is_empty() {
        return is_usable(feature).then(|| {
            TestStep::new(
                StepAction::Click,
                feature.selector.clone(),
                format!("Click '{}'", feature.name),
            )
        });
    }
    feature
        .children
        .iter()
        .find(|link| link.actions.contains(&Action::Click))
        .map(|link| {
            TestStep::new(
                StepAction::Click,
                link.selector.clone(),
                format!("Click link '{}'", link.name),
            )
        })
}

/// Verify the state the feature was discovered in, without interacting.
fn assertion_only_case(feature: &DiscoveredFeature) -> CaseParts {
    let selector = &feature.selector;
    let mut assertions = Vec::new();
    match feature.state {
        Some(state) if !state.visible => assertions.push(Assertion::new(
            AssertionType::Hidden,
            selector.clone(),
            format!("'{}' is hidden", feature.name),
        )),
        Some(state) if !state.enabled => {
            assertions.push(visible(feature));
            assertions.push(Assertion::new(
                AssertionType::Disabled,
                selector.clone(),
                format!("'{}' is disabled", feature.name),
            ));
        }
        _ => assertions.push(visible(feature)),
    }
    if let Some(count) = feature.descendant_count {
        assertions.push(
            Assertion::new(
                AssertionType::Count,
                format!("{selector} *"),
                format!("'{}' has {} descendants", feature.name, count),
            )
            .expecting(Expected::Count(count)),
        );
    }
    (format!("Verify {}", feature.name), Vec::new(), assertions)
}

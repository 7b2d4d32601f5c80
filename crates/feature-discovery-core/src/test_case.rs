//! Synthesized test cases and their results.

use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::feature::{Attributes, DiscoveredFeature};

/// Interaction performed by a test step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    /// Click the element
    Click,
    /// Fill the element with `value`
    Fill,
    /// Hover the pointer over the element
    Hover,
    /// Focus the element
    Focus,
    /// Select option `value`
    Select,
    /// Check a checkbox/radio
    Check,
    /// Uncheck a checkbox
    Uncheck,
    /// Press key `value`
    Press,
    /// Capture the element, optionally to path `value`
    Screenshot,
}

impl StepAction {
    /// Action name as it appears in reports and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepAction::Click => "click",
            StepAction::Fill => "fill",
            StepAction::Hover => "hover",
            StepAction::Focus => "focus",
            StepAction::Select => "select",
            StepAction::Check => "check",
            StepAction::Uncheck => "uncheck",
            StepAction::Press => "press",
            StepAction::Screenshot => "screenshot",
        }
    }

    /// Whether the step needs a `value` to run.
    pub fn requires_value(&self) -> bool {
        matches!(
            self,
            StepAction::Fill | StepAction::Select | StepAction::Press
        )
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single interaction within a test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TestStep {
    /// Interaction to perform
    pub action: StepAction,
    /// Target selector
    pub selector: String,
    /// Input for fill/select/press, or output path for screenshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Human-readable description
    pub description: String,
}

impl TestStep {
    /// Create a step without a value.
    pub fn new(
        action: StepAction,
        selector: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action,
            selector: selector.into(),
            value: None,
            description: description.into(),
        }
    }

    /// Attach a value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Kind of check performed by an assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssertionType {
    /// Element is visible
    Visible,
    /// Element is hidden (or absent)
    Hidden,
    /// Element is enabled
    Enabled,
    /// Element is disabled
    Disabled,
    /// Element text contains the expected string
    Text,
    /// Selector matches exactly the expected number of elements
    Count,
    /// Element attributes equal the expected mapping
    Attribute,
    /// Element carries the expected class
    Class,
}

impl AssertionType {
    /// Assertion name as it appears in reports and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssertionType::Visible => "visible",
            AssertionType::Hidden => "hidden",
            AssertionType::Enabled => "enabled",
            AssertionType::Disabled => "disabled",
            AssertionType::Text => "text",
            AssertionType::Count => "count",
            AssertionType::Attribute => "attribute",
            AssertionType::Class => "class",
        }
    }
}

/// Expected value of an assertion; its shape depends on the assertion type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Expected {
    /// Match count (count assertions)
    Count(usize),
    /// Text or class name (text/class assertions)
    Text(String),
    /// Attribute name to value (attribute assertions)
    Attributes(Attributes),
}

/// Post-condition checked after the steps of a test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Assertion {
    /// Kind of check
    #[serde(rename = "type")]
    pub assertion_type: AssertionType,
    /// Target selector
    pub selector: String,
    /// Expected value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Expected>,
    /// Human-readable description
    pub description: String,
}

impl Assertion {
    /// Create an assertion without an expected value.
    pub fn new(
        assertion_type: AssertionType,
        selector: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            assertion_type,
            selector: selector.into(),
            expected: None,
            description: description.into(),
        }
    }

    /// Attach an expected value.
    pub fn expecting(mut self, expected: Expected) -> Self {
        self.expected = Some(expected);
        self
    }
}

/// Executable scenario derived from one discovered feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Stable identifier, e.g. `button_1`
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Feature under test
    pub feature: Arc<DiscoveredFeature>,
    /// Steps, executed in order
    pub steps: Vec<TestStep>,
    /// Assertions, evaluated in order after the steps
    pub assertions: Vec<Assertion>,
}

impl TestCase {
    /// Whether the case only checks state and performs no interaction.
    pub fn is_assertion_only(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Outcome of executing one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Identifier of the originating test case
    pub test_case_id: String,
    /// Name of the feature under test
    pub feature_name: String,
    /// Every step and assertion completed
    pub success: bool,
    /// Failure message when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Elapsed wall-clock time in milliseconds
    pub duration_ms: u64,
    /// Steps completed before the run stopped
    pub steps_completed: usize,
    /// Assertions passed before the run stopped
    pub assertions_passed: usize,
}

impl TestResult {
    /// Build a passing result.
    pub fn passed(test_case: &TestCase, duration_ms: u64) -> Self {
        Self {
            test_case_id: test_case.id.clone(),
            feature_name: test_case.feature.name.clone(),
            success: true,
            error: None,
            duration_ms,
            steps_completed: test_case.steps.len(),
            assertions_passed: test_case.assertions.len(),
        }
    }

    /// Build a failing result. An empty message is replaced by a generic one.
    pub fn failed(
        test_case: &TestCase,
        error: impl Into<String>,
        duration_ms: u64,
        steps_completed: usize,
        assertions_passed: usize,
    ) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "test case failed".to_string();
        }
        Self {
            test_case_id: test_case.id.clone(),
            feature_name: test_case.feature.name.clone(),
            success: false,
            error: Some(error),
            duration_ms,
            steps_completed,
            assertions_passed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureType;

    fn sample_case() -> TestCase {
        let feature = Arc::new(DiscoveredFeature::new("Submit", FeatureType::Button, "#submit"));
        TestCase {
            id: "button_1".to_string(),
            name: "Click Submit".to_string(),
            feature,
            steps: vec![TestStep::new(StepAction::Click, "#submit", "Click Submit")],
            assertions: vec![Assertion::new(
                AssertionType::Visible,
                "#submit",
                "Submit is visible",
            )],
        }
    }

    #[test]
    fn test_requires_value() {
        assert!(StepAction::Fill.requires_value());
        assert!(StepAction::Press.requires_value());
        assert!(!StepAction::Click.requires_value());
        assert!(!StepAction::Screenshot.requires_value());
    }

    #[test]
    fn test_expected_untagged_shapes() {
        let count: Expected = serde_json::from_str("3").unwrap();
        assert_eq!(count, Expected::Count(3));

        let text: Expected = serde_json::from_str("\"Submit\"").unwrap();
        assert_eq!(text, Expected::Text("Submit".to_string()));

        let attrs: Expected = serde_json::from_str(r#"{"value":"x"}"#).unwrap();
        assert!(matches!(attrs, Expected::Attributes(map) if map["value"] == "x"));
    }

    #[test]
    fn test_assertion_serializes_type_field() {
        let assertion = Assertion::new(AssertionType::Count, "li", "three items")
            .expecting(Expected::Count(3));
        let json = serde_json::to_value(&assertion).unwrap();
        assert_eq!(json["type"], "count");
        assert_eq!(json["expected"], 3);
    }

    #[test]
    fn test_result_constructors() {
        let case = sample_case();

        let ok = TestResult::passed(&case, 12);
        assert!(ok.success);
        assert!(ok.error.is_none());
        assert_eq!(ok.steps_completed, 1);
        assert_eq!(ok.assertions_passed, 1);

        let failed = TestResult::failed(&case, "", 5, 0, 0);
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("test case failed"));
        assert_eq!(failed.test_case_id, "button_1");
        assert_eq!(failed.feature_name, "Submit");
    }

    #[test]
    fn test_case_serializes_feature_inline() {
        let json = serde_json::to_value(sample_case()).unwrap();
        assert_eq!(json["feature"]["selector"], "#submit");
        assert_eq!(json["steps"][0]["action"], "click");
    }
}

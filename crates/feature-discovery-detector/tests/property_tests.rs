//! Property-based tests for the selector engine.
//!
//! Uses proptest to generate random inputs and verify selector invariants.

use proptest::prelude::*;

use feature_discovery_detector::selector::shortening_candidates;
use feature_discovery_detector::{
    generate_selector, is_valid_selector, optimize_selector, ElementInfo,
};
use feature_discovery_driver::{Driver, NodeFixture, PageFixture, StaticDriver};

/// Generate a random identifier.
fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,10}"
}

/// Generate arbitrary element info, including empty and odd values.
fn element_info() -> impl Strategy<Value = ElementInfo> {
    (
        prop_oneof![Just(String::new()), ident()],
        prop::collection::btree_map(
            prop_oneof![
                Just("id".to_string()),
                Just("class".to_string()),
                Just("name".to_string()),
                Just("data-testid".to_string()),
                Just("href".to_string()),
                ident(),
            ],
            ".{0,12}",
            0..5,
        ),
    )
        .prop_map(|(tag, attributes)| ElementInfo { tag, attributes })
}

/// Selectors built from the fixture page's vocabulary.
fn page_selector() -> impl Strategy<Value = String> {
    let compound = prop_oneof![
        Just("main".to_string()),
        Just("section".to_string()),
        Just("div".to_string()),
        Just("button".to_string()),
        Just("#app".to_string()),
        Just(".card".to_string()),
        Just("div.card".to_string()),
        Just("button.primary".to_string()),
        Just("[data-testid=\"save\"]".to_string()),
        Just("section#settings".to_string()),
    ];
    prop::collection::vec((compound, prop_oneof![Just(" "), Just(" > ")]), 1..4).prop_map(
        |parts| {
            let mut selector = String::new();
            for (i, (compound, combinator)) in parts.iter().enumerate() {
                if i > 0 {
                    selector.push_str(combinator);
                }
                selector.push_str(compound);
            }
            selector
        },
    )
}

fn fixture_driver() -> StaticDriver {
    StaticDriver::with_page(
        "http://localhost/",
        PageFixture::new("Settings").node(
            NodeFixture::new("main").attr("id", "app").child(
                NodeFixture::new("section")
                    .attr("id", "settings")
                    .child(
                        NodeFixture::new("div")
                            .attr("class", "card")
                            .child(
                                NodeFixture::new("button")
                                    .attr("class", "primary")
                                    .attr("data-testid", "save")
                                    .text("Save"),
                            )
                            .child(NodeFixture::new("button").text("Cancel")),
                    )
                    .child(
                        NodeFixture::new("div")
                            .attr("class", "card")
                            .child(NodeFixture::new("button").attr("class", "primary").text("Go")),
                    ),
            ),
        ),
    )
}

proptest! {
    /// Generation never panics and whatever it returns is well formed.
    #[test]
    fn generate_is_total(element in element_info()) {
        if let Some(selector) = generate_selector(Some(&element)) {
            prop_assert!(!selector.is_empty());
            prop_assert!(is_valid_selector(Some(&selector)), "{}", selector);
        }
    }

    /// Tagless input never yields a selector.
    #[test]
    fn generate_tagless_is_none(mut element in element_info()) {
        element.tag.clear();
        prop_assert_eq!(generate_selector(Some(&element)), None);
    }

    /// Validation never panics on arbitrary text.
    #[test]
    fn validate_is_total(input in ".{0,40}") {
        let _ = is_valid_selector(Some(&input));
    }

    /// Doubled id or class delimiters are always rejected.
    #[test]
    fn doubled_delimiters_rejected(
        name in ident(),
        delimiter in prop_oneof![Just("##"), Just("..")]
    ) {
        let selector = format!("{delimiter}{name}");
        prop_assert!(!is_valid_selector(Some(&selector)));
    }

    /// Simple well-formed selectors are accepted.
    #[test]
    fn well_formed_accepted(name in ident(), value in "[a-zA-Z0-9 _-]{0,10}") {
        let id = format!("#{name}");
        let class = format!(".{name}");
        let attribute = format!("[data-{name}=\"{value}\"]");
        prop_assert!(is_valid_selector(Some(&id)));
        prop_assert!(is_valid_selector(Some(&class)));
        prop_assert!(is_valid_selector(Some(&attribute)));
    }

    /// Candidates are always strictly shorter than their source.
    #[test]
    fn candidates_shorter(selector in page_selector()) {
        for candidate in shortening_candidates(&selector) {
            prop_assert!(candidate.len() < selector.len());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Optimization preserves the match count.
    #[test]
    fn optimize_preserves_count(selector in page_selector()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let driver = fixture_driver();
            let before = driver.locate(&selector).count().await.unwrap();
            let optimized = optimize_selector(&selector, Some(&driver as &dyn Driver)).await;
            let after = driver.locate(&optimized).count().await.unwrap();
            prop_assert_eq!(before, after, "{} -> {}", selector, optimized);
            prop_assert!(optimized.len() <= selector.len());
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Without a driver the selector is returned untouched.
    #[test]
    fn optimize_without_driver_is_identity(selector in ".{0,30}") {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let optimized = runtime.block_on(optimize_selector(&selector, None));
        prop_assert_eq!(optimized, selector);
    }
}

//! Selector generation, validation and optimization.
//!
//! All three operations are total: bad input yields `None`, `false` or the
//! unchanged selector, never an error.

use lazy_static::lazy_static;
use regex::Regex;

use feature_discovery_core::Attributes;
use feature_discovery_driver::{Driver, PathStep};

/// Attributes whose value identifies an element for testing, most preferred first.
pub const DEFAULT_TEST_ID_ATTRIBUTES: [&str; 5] =
    ["data-testid", "data-test-id", "data-test", "data-cy", "data-qa"];

/// Attributes that distinguish an element of a given tag, most preferred first.
const DISTINGUISHING_ATTRIBUTES: [&str; 12] = [
    "name",
    "data-component",
    "data-widget",
    "type",
    "href",
    "aria-label",
    "placeholder",
    "role",
    "title",
    "alt",
    "for",
    "value",
];

/// Classes that describe transient state rather than identity.
const STATE_CLASSES: [&str; 12] = [
    "active", "disabled", "hidden", "selected", "open", "focus", "focused", "hover", "visible",
    "show", "collapsed", "expanded",
];

const MAX_CLASSES: usize = 2;

lazy_static! {
    static ref IDENT: Regex = Regex::new(r"^-?[_a-zA-Z][_a-zA-Z0-9-]*$").unwrap();

    /// Class names that look machine-generated (CSS modules, styled-components).
    static ref GENERATED_CLASS: Regex =
        Regex::new(r"(^css-|^sc-|^jsx-|__[a-zA-Z0-9]{5,}$|[_-][a-f0-9]{6,}$|\d{4,})").unwrap();

    /// Syntactic shape of a selector list.
    static ref SELECTOR_LIST: Regex = {
        let ident = r"-?(?:[_a-zA-Z]|[^\x00-\x7F]|\\.)(?:[_a-zA-Z0-9-]|[^\x00-\x7F]|\\.)*";
        let value = r#"(?:"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|[^\]\s"']+)"#;
        let attr = format!(r"\[\s*{ident}\s*(?:[~|^$*]?=\s*{value}\s*(?:[iIsS]\s*)?)?\]");
        let args = r"\((?:[^()]|\([^()]*\))*\)";
        let pseudo = format!(r"::?{ident}(?:{args})?");
        let suffix = format!(r"(?:#{ident}|\.{ident}|{attr}|{pseudo})");
        let compound = format!(r"(?:(?:\*|{ident}){suffix}*|{suffix}+)");
        let complex = format!(r"{compound}(?:\s*[>+~]\s*{compound}|\s+{compound})*");
        Regex::new(&format!(r"^\s*{complex}(?:\s*,\s*{complex})*\s*$")).unwrap()
    };
}

/// What the generator knows about one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementInfo {
    /// Lower-case tag name; empty when unknown
    pub tag: String,
    /// Captured attributes, including `id` and `class`
    pub attributes: Attributes,
}

impl ElementInfo {
    /// Create element info for `tag`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: Attributes::new(),
        }
    }

    /// Add an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Non-empty `id`.
    pub fn id(&self) -> Option<&str> {
        self.attributes
            .get("id")
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
    }

    /// Whitespace-separated classes.
    pub fn classes(&self) -> Vec<&str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// Quote `value` as a CSS string literal.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\a "),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Generates selectors in a fixed preference order:
///
/// 1. a test-identifier attribute (`[data-testid="..."]`)
/// 2. the element id (`#id`)
/// 3. stable classes (`button.primary`)
/// 4. tag plus a distinguishing attribute (`input[name="email"]`)
/// 5. the tag alone
#[derive(Debug, Clone)]
pub struct SelectorGenerator {
    test_id_attributes: Vec<String>,
}

impl SelectorGenerator {
    /// Create a generator that recognises `test_id_attributes`.
    pub fn new<I, S>(test_id_attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            test_id_attributes: test_id_attributes
                .into_iter()
                .map(Into::into)
                .filter(|a: &String| !a.trim().is_empty())
                .collect(),
        }
    }

    /// Test-identifier attributes, most preferred first.
    pub fn test_id_attributes(&self) -> &[String] {
        &self.test_id_attributes
    }

    /// Generate a selector for `element`. `None` for absent or tagless input.
    pub fn generate(&self, element: Option<&ElementInfo>) -> Option<String> {
        self.candidates(element).into_iter().next()
    }

    /// Every selector the tiers can build for `element`, most preferred
    /// first: test identifier, id, stable classes, each distinguishing
    /// attribute, then the bare tag. All of them match `element`; none is
    /// guaranteed to match it alone.
    pub fn candidates(&self, element: Option<&ElementInfo>) -> Vec<String> {
        let Some(element) = element else {
            return Vec::new();
        };
        let tag = element.tag.trim();
        if tag.is_empty() {
            return Vec::new();
        }
        let tag = IDENT.is_match(tag).then_some(tag);

        let mut candidates: Vec<String> = [self.by_test_id(element), by_id(element)]
            .into_iter()
            .flatten()
            .collect();
        if let Some(tag) = tag {
            candidates.extend(by_classes(tag, element));
            candidates.extend(by_attributes(tag, element));
            candidates.push(tag.to_string());
        }
        candidates.dedup();
        candidates
    }

    fn by_test_id(&self, element: &ElementInfo) -> Option<String> {
        self.test_id_attributes.iter().find_map(|name| {
            let value = element.attributes.get(name)?;
            (!value.trim().is_empty() && IDENT.is_match(name))
                .then(|| format!("[{}={}]", name, quote(value)))
        })
    }
}

impl Default for SelectorGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TEST_ID_ATTRIBUTES)
    }
}

fn by_id(element: &ElementInfo) -> Option<String> {
    let id = element.id()?;
    if IDENT.is_match(id) {
        Some(format!("#{id}"))
    } else {
        Some(format!("[id={}]", quote(id)))
    }
}

fn by_classes(tag: &str, element: &ElementInfo) -> Option<String> {
    let stable: Vec<&str> = element
        .classes()
        .into_iter()
        .filter(|c| IDENT.is_match(c))
        .filter(|c| !GENERATED_CLASS.is_match(c))
        .filter(|c| !STATE_CLASSES.contains(&c.to_ascii_lowercase().as_str()))
        .take(MAX_CLASSES)
        .collect();
    if stable.is_empty() {
        return None;
    }
    Some(format!("{}.{}", tag, stable.join(".")))
}

fn by_attributes(tag: &str, element: &ElementInfo) -> Vec<String> {
    DISTINGUISHING_ATTRIBUTES
        .iter()
        .filter_map(|name| {
            let value = element.attributes.get(*name)?;
            (!value.trim().is_empty()).then(|| format!("{}[{}={}]", tag, name, quote(value)))
        })
        .collect()
}

/// Child-combinator paths to the element `path` ends at, most specific
/// anchor first.
///
/// The first is anchored at the nearest ancestor with a usable id, the last
/// at `body`. Empty when `path` is empty or holds a tag that is not a plain
/// identifier.
///
/// # Example
/// ```
/// use feature_discovery_detector::selector::structural_selectors;
/// use feature_discovery_driver::PathStep;
///
/// let path = [PathStep::new("div", 1).with_id("toolbar"), PathStep::new("button", 3)];
/// assert_eq!(
///     structural_selectors(&path),
///     vec![
///         "#toolbar > button:nth-of-type(3)".to_string(),
///         "body > div:nth-of-type(1) > button:nth-of-type(3)".to_string(),
///     ]
/// );
/// ```
pub fn structural_selectors(path: &[PathStep]) -> Vec<String> {
    if path.is_empty() || !path.iter().all(|step| IDENT.is_match(&step.tag)) {
        return Vec::new();
    }
    let chain = |steps: &[PathStep]| -> String {
        steps
            .iter()
            .map(|step| format!(" > {}:nth-of-type({})", step.tag, step.nth_of_type))
            .collect()
    };

    let mut selectors = Vec::with_capacity(2);
    let anchor = path[..path.len() - 1]
        .iter()
        .rposition(|step| step.id.as_deref().is_some_and(|id| IDENT.is_match(id)));
    if let Some(at) = anchor {
        if let Some(id) = &path[at].id {
            selectors.push(format!("#{}{}", id, chain(&path[at + 1..])));
        }
    }
    selectors.push(format!("body{}", chain(path)));
    selectors
}

/// Generate a selector with the default test-identifier attributes.
///
/// # Example
/// ```
/// use feature_discovery_detector::selector::{generate_selector, ElementInfo};
///
/// let button = ElementInfo::new("button").attr("data-testid", "submit");
/// assert_eq!(generate_selector(Some(&button)).as_deref(), Some("[data-testid=\"submit\"]"));
/// assert_eq!(generate_selector(None), None);
/// ```
pub fn generate_selector(element: Option<&ElementInfo>) -> Option<String> {
    SelectorGenerator::default().generate(element)
}

/// Whether `selector` is syntactically well formed.
///
/// # Example
/// ```
/// use feature_discovery_detector::selector::is_valid_selector;
///
/// assert!(is_valid_selector(Some("form > input[name='q']:first-child")));
/// assert!(!is_valid_selector(Some("##bad")));
/// assert!(!is_valid_selector(None));
/// ```
pub fn is_valid_selector(selector: Option<&str>) -> bool {
    match selector {
        Some(s) if !s.trim().is_empty() => SELECTOR_LIST.is_match(s),
        _ => false,
    }
}

/// One compound of a complex selector and the combinator joining it to the
/// previous compound (`' '`, `'>'`, `'+'`, `'~'`; `None` for the first).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    combinator: Option<char>,
    compound: String,
}

/// Split a single complex selector into compounds. `None` for selector lists
/// or unbalanced input.
fn split_compounds(selector: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut pending: Option<char> = None;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in selector.trim().chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        if let Some(q) = quote {
            current.push(c);
            match c {
                '\\' => escaped = true,
                _ if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '\\' => {
                current.push(c);
                escaped = true;
            }
            '"' | '\'' => {
                current.push(c);
                quote = Some(c);
            }
            '[' | '(' => {
                depth += 1;
                current.push(c);
            }
            ']' | ')' => {
                depth = depth.checked_sub(1)?;
                current.push(c);
            }
            ',' if depth == 0 => return None,
            ' ' | '\t' | '\n' | '>' | '+' | '~' if depth == 0 => {
                if !current.is_empty() {
                    segments.push(Segment {
                        combinator: if segments.is_empty() { None } else { pending.take() },
                        compound: std::mem::take(&mut current),
                    });
                    pending = Some(' ');
                }
                if c != ' ' && c != '\t' && c != '\n' {
                    pending = Some(c);
                }
            }
            _ => current.push(c),
        }
    }
    if depth != 0 || quote.is_some() {
        return None;
    }
    if !current.is_empty() {
        segments.push(Segment {
            combinator: if segments.is_empty() { None } else { pending },
            compound: current,
        });
    }
    (!segments.is_empty()).then_some(segments)
}

fn join(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            match segment.combinator.unwrap_or(' ') {
                ' ' => out.push(' '),
                c => {
                    out.push(' ');
                    out.push(c);
                    out.push(' ');
                }
            }
        }
        out.push_str(&segment.compound);
    }
    out
}

/// `#id` component of a compound, if any.
fn id_component(compound: &str) -> Option<String> {
    let start = compound.find('#')?;
    if compound[..start].contains(&['[', '('][..]) {
        return None;
    }
    let id: String = compound[start + 1..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    (!id.is_empty()).then(|| format!("#{id}"))
}

/// The compound without its leading type selector, if anything remains.
fn without_tag(compound: &str) -> Option<String> {
    let rest = compound.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-');
    let stripped = rest.len() < compound.len();
    (stripped && rest.starts_with(&['#', '.', '[', ':'][..])).then(|| rest.to_string())
}

/// Shorter forms of `selector`, shortest first.
///
/// Every candidate keeps the subject (last) compound or a part of it, so it
/// matches a superset of the original's elements: an equal match count means
/// the same elements. Candidates are strictly shorter than the input and
/// syntactically valid.
pub fn shortening_candidates(selector: &str) -> Vec<String> {
    let Some(segments) = split_compounds(selector) else {
        return Vec::new();
    };
    let Some(subject) = segments.last().map(|s| s.compound.clone()) else {
        return Vec::new();
    };

    let mut candidates: Vec<String> = [id_component(&subject), without_tag(&subject)]
        .into_iter()
        .flatten()
        .collect();
    for start in 1..segments.len() {
        let mut suffix = segments[start..].to_vec();
        suffix[0].combinator = None;
        candidates.push(join(&suffix));
    }

    let original_len = selector.trim().len();
    candidates.retain(|c| c.len() < original_len && is_valid_selector(Some(c)));
    candidates.sort_by_key(|c| c.len());
    candidates.dedup();
    candidates
}

/// Shorten `selector` while preserving its match count under `driver`.
///
/// Without a driver the selector is returned unchanged. With one, each
/// candidate from [`shortening_candidates`] is tried shortest first and the
/// first whose match count equals the original's wins. A selector matching
/// nothing, or one the driver cannot count, is returned unchanged.
pub async fn optimize_selector(selector: &str, driver: Option<&dyn Driver>) -> String {
    let Some(driver) = driver else {
        return selector.to_string();
    };

    let original = match driver.locate(selector).count().await {
        Ok(0) => return selector.to_string(),
        Ok(count) => count,
        Err(e) => {
            tracing::debug!("cannot count '{}', keeping it: {}", selector, e);
            return selector.to_string();
        }
    };

    for candidate in shortening_candidates(selector) {
        match driver.locate(&candidate).count().await {
            Ok(count) if count == original => {
                tracing::debug!("optimized '{}' to '{}'", selector, candidate);
                return candidate;
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("candidate '{}' rejected: {}", candidate, e),
        }
    }
    selector.to_string()
}

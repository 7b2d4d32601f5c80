//! Dependency-free backend serving pages from a [`StaticSite`] fixture.
//!
//! Interactions mutate an in-memory document so that tests observe their
//! effects: `fill` sets `value`, `check` sets `checked`, `select_option`
//! updates the select, and clicking a link to another fixture page navigates.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use feature_discovery_core::{DriverError, DriverResult};

use crate::driver::{
    ClickOptions, Driver, ElementHandle, Locator, NavigateOptions, PathStep, ScreenshotOptions,
};
use crate::fixture::{NodeFixture, PageFixture, StaticSite};
use crate::matcher::{ElementTree, SelectorList};

/// 1x1 PNG returned for every capture.
const PLACEHOLDER_PNG: [u8; 68] = [
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x04, 0x00, 0x00, 0x00, 0xb5,
    0x1c, 0x0c, 0x02, 0x00, 0x00, 0x00, 0x0b, 0x49, 0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0x64,
    0x60, 0x00, 0x00, 0x00, 0x06, 0x00, 0x02, 0x30, 0x81, 0xd0, 0x2f, 0x00, 0x00, 0x00, 0x00,
    0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// Input types that cannot be filled with text.
const NON_TEXT_INPUT_TYPES: [&str; 9] = [
    "checkbox", "radio", "button", "submit", "reset", "file", "image", "hidden", "range",
];

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: Option<String>,
    hidden: bool,
    parent: Option<usize>,
    children: Vec<usize>,
}

const BODY: usize = 1;

/// In-memory document; node 0 is `<html>`, node 1 is `<body>`.
#[derive(Debug, Clone)]
struct Dom {
    nodes: Vec<Node>,
}

impl Dom {
    fn from_page(page: &PageFixture) -> Self {
        let mut dom = Dom { nodes: Vec::new() };
        let html = dom.push(&NodeFixture::new("html"), None);
        let body = dom.push(&NodeFixture::new("body"), Some(html));
        for node in &page.body {
            dom.push(node, Some(body));
        }
        dom
    }

    fn blank() -> Self {
        Self::from_page(&PageFixture::default())
    }

    fn push(&mut self, fixture: &NodeFixture, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node {
            tag: fixture.tag.to_ascii_lowercase(),
            attributes: fixture
                .attributes
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                .collect(),
            text: fixture.text.clone(),
            hidden: fixture.hidden,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            self.nodes[p].children.push(index);
        }
        for child in &fixture.children {
            self.push(child, Some(index));
        }
        index
    }

    fn text_content(&self, node: usize) -> String {
        let mut text = self.nodes[node].text.clone().unwrap_or_default();
        for &child in &self.nodes[node].children {
            let child_text = self.text_content(child);
            if !child_text.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(&child_text);
            }
        }
        text
    }

    fn renders(&self, node: usize) -> bool {
        let n = &self.nodes[node];
        let style = n
            .attributes
            .get("style")
            .map(|s| s.replace(' ', "").to_ascii_lowercase())
            .unwrap_or_default();
        !(n.hidden
            || n.attributes.contains_key("hidden")
            || style.contains("display:none")
            || style.contains("visibility:hidden")
            || (n.tag == "input" && n.attributes.get("type").map(String::as_str) == Some("hidden")))
    }

    fn is_visible(&self, node: usize) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if !self.renders(n) {
                return false;
            }
            current = self.nodes[n].parent;
        }
        true
    }

    fn is_enabled(&self, node: usize) -> bool {
        !self.nodes[node].attributes.contains_key("disabled")
    }

    fn descendants(&self, node: usize) -> Vec<usize> {
        let mut out = Vec::new();
        for &child in &self.nodes[node].children {
            out.push(child);
            out.extend(self.descendants(child));
        }
        out
    }

    /// Steps from the first node below `<body>` down to `node`.
    fn path(&self, node: usize) -> Vec<PathStep> {
        let mut steps = Vec::new();
        let mut current = Some(node).filter(|&n| n > BODY);
        while let Some(n) = current {
            let tag = &self.nodes[n].tag;
            let parent = self.nodes[n].parent;
            let nth_of_type = parent.map_or(1, |p| {
                self.nodes[p]
                    .children
                    .iter()
                    .take_while(|&&c| c != n)
                    .filter(|&&c| self.nodes[c].tag == *tag)
                    .count()
                    + 1
            });
            steps.push(PathStep {
                tag: tag.clone(),
                id: self.nodes[n].attributes.get("id").cloned(),
                nth_of_type,
            });
            current = parent.filter(|&p| p > BODY);
        }
        steps.reverse();
        steps
    }

    fn input_type(&self, node: usize) -> &str {
        self.nodes[node]
            .attributes
            .get("type")
            .map(String::as_str)
            .unwrap_or("text")
    }
}

impl ElementTree for Dom {
    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn tag(&self, node: usize) -> &str {
        &self.nodes[node].tag
    }

    fn attribute(&self, node: usize, name: &str) -> Option<&str> {
        self.nodes[node].attributes.get(name).map(String::as_str)
    }

    fn parent(&self, node: usize) -> Option<usize> {
        self.nodes[node].parent
    }

    fn children(&self, node: usize) -> &[usize] {
        &self.nodes[node].children
    }
}

#[derive(Debug)]
struct PageState {
    url: String,
    title: String,
    dom: Dom,
    focused: Option<usize>,
    pressed_keys: Vec<String>,
}

impl PageState {
    fn blank() -> Self {
        Self {
            url: "about:blank".to_string(),
            title: String::new(),
            dom: Dom::blank(),
            focused: None,
            pressed_keys: Vec::new(),
        }
    }

    fn load(&mut self, url: &str, page: &PageFixture) {
        self.url = url.to_string();
        self.title = page.title.clone();
        self.dom = Dom::from_page(page);
        self.focused = None;
    }
}

fn query(dom: &Dom, selector: &str) -> DriverResult<Vec<usize>> {
    SelectorList::parse(selector)
        .map(|list| list.query(dom))
        .map_err(|e| DriverError::backend(format!("invalid selector '{selector}': {e}")))
}

fn resolve(dom: &Dom, selector: &str, index: usize) -> DriverResult<usize> {
    query(dom, selector)?
        .get(index)
        .copied()
        .ok_or_else(|| DriverError::ElementNotFound {
            selector: selector.to_string(),
            index,
        })
}

fn ensure_visible(dom: &Dom, node: usize, action: &str) -> DriverResult<()> {
    if dom.is_visible(node) {
        Ok(())
    } else {
        Err(DriverError::backend(format!("{action}: element is not visible")))
    }
}

fn ensure_actionable(dom: &Dom, node: usize, action: &str) -> DriverResult<()> {
    ensure_visible(dom, node, action)?;
    if dom.is_enabled(node) {
        Ok(())
    } else {
        Err(DriverError::backend(format!("{action}: element is disabled")))
    }
}

/// Resolve a link target against the current URL. `None` for same-page anchors.
fn resolve_href(current: &str, href: &str) -> Option<String> {
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    if href.contains("://") {
        return Some(href.to_string());
    }
    let origin_end = current
        .find("://")
        .map(|scheme| {
            current[scheme + 3..]
                .find('/')
                .map_or(current.len(), |p| scheme + 3 + p)
        })
        .unwrap_or(0);
    if href.starts_with('/') {
        Some(format!("{}{}", &current[..origin_end], href))
    } else {
        let base_end = current.rfind('/').filter(|&p| p >= origin_end).map_or(
            format!("{}/", &current[..origin_end]),
            |p| current[..=p].to_string(),
        );
        Some(format!("{base_end}{href}"))
    }
}

/// Backend serving fixture pages from memory.
#[derive(Clone)]
pub struct StaticDriver {
    site: Arc<StaticSite>,
    state: Arc<RwLock<PageState>>,
}

impl StaticDriver {
    /// Create a driver over `site`, starting at `about:blank`.
    pub fn new(site: StaticSite) -> Self {
        Self {
            site: Arc::new(site),
            state: Arc::new(RwLock::new(PageState::blank())),
        }
    }

    /// Create a driver already showing `page` at `url`.
    pub fn with_page(url: impl Into<String>, page: PageFixture) -> Self {
        let url = url.into();
        let driver = Self::new(StaticSite::new().page(url.clone(), page.clone()));
        if let Ok(mut state) = driver.state.try_write() {
            state.load(&url, &page);
        }
        driver
    }

    /// Keys pressed so far, in order.
    pub async fn pressed_keys(&self) -> Vec<String> {
        self.state.read().await.pressed_keys.clone()
    }
}

#[async_trait]
impl Driver for StaticDriver {
    fn backend(&self) -> &'static str {
        "static"
    }

    async fn navigate(&self, url: &str, _options: NavigateOptions) -> DriverResult<()> {
        let (key, page) = self.site.lookup(url).ok_or_else(|| DriverError::Navigation {
            url: url.to_string(),
            reason: "no fixture page for this URL".to_string(),
        })?;
        tracing::debug!("static driver loading {}", key);
        self.state.write().await.load(key, page);
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        Ok(self.state.read().await.url.clone())
    }

    async fn title(&self) -> DriverResult<String> {
        Ok(self.state.read().await.title.clone())
    }

    fn locate(&self, selector: &str) -> Box<dyn Locator> {
        Box::new(StaticLocator {
            selector: selector.to_string(),
            site: Arc::clone(&self.site),
            state: Arc::clone(&self.state),
        })
    }

    async fn screenshot(&self, options: ScreenshotOptions) -> DriverResult<Vec<u8>> {
        write_capture(options).await
    }
}

async fn write_capture(options: ScreenshotOptions) -> DriverResult<Vec<u8>> {
    let bytes = PLACEHOLDER_PNG.to_vec();
    if let Some(path) = options.path {
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| DriverError::backend(format!("writing {}: {e}", path.display())))?;
    }
    Ok(bytes)
}

struct StaticLocator {
    selector: String,
    site: Arc<StaticSite>,
    state: Arc<RwLock<PageState>>,
}

#[async_trait]
impl Locator for StaticLocator {
    fn selector(&self) -> &str {
        &self.selector
    }

    async fn count(&self) -> DriverResult<usize> {
        let state = self.state.read().await;
        Ok(query(&state.dom, &self.selector)?.len())
    }

    fn nth(&self, index: usize) -> Box<dyn ElementHandle> {
        Box::new(StaticElement {
            selector: self.selector.clone(),
            index,
            site: Arc::clone(&self.site),
            state: Arc::clone(&self.state),
        })
    }
}

struct StaticElement {
    selector: String,
    index: usize,
    site: Arc<StaticSite>,
    state: Arc<RwLock<PageState>>,
}

impl StaticElement {
    async fn read<T, F>(&self, f: F) -> DriverResult<T>
    where
        F: FnOnce(&Dom, usize) -> DriverResult<T> + Send,
    {
        let state = self.state.read().await;
        let node = resolve(&state.dom, &self.selector, self.index)?;
        f(&state.dom, node)
    }

    async fn write<T, F>(&self, f: F) -> DriverResult<T>
    where
        F: FnOnce(&mut PageState, usize) -> DriverResult<T> + Send,
    {
        let mut state = self.state.write().await;
        let node = resolve(&state.dom, &self.selector, self.index)?;
        f(&mut state, node)
    }
}

fn set_checked(state: &mut PageState, node: usize, checked: bool) {
    let dom = &mut state.dom;
    if checked && dom.input_type(node) == "radio" {
        let group = dom.nodes[node].attributes.get("name").cloned();
        for i in 0..dom.nodes.len() {
            let same_group = dom.nodes[i].tag == "input"
                && dom.input_type(i) == "radio"
                && dom.nodes[i].attributes.get("name") == group.as_ref();
            if same_group {
                dom.nodes[i].attributes.remove("checked");
            }
        }
    }
    if checked {
        dom.nodes[node]
            .attributes
            .insert("checked".to_string(), "checked".to_string());
    } else {
        dom.nodes[node].attributes.remove("checked");
    }
}

fn is_toggle(dom: &Dom, node: usize) -> bool {
    dom.nodes[node].tag == "input" && matches!(dom.input_type(node), "checkbox" | "radio")
}

#[async_trait]
impl ElementHandle for StaticElement {
    fn selector(&self) -> &str {
        &self.selector
    }

    fn index(&self) -> usize {
        self.index
    }

    async fn tag_name(&self) -> DriverResult<String> {
        self.read(|dom, node| Ok(dom.nodes[node].tag.clone())).await
    }

    async fn text_content(&self) -> DriverResult<Option<String>> {
        self.read(|dom, node| {
            let text = dom.text_content(node);
            Ok(if text.is_empty() { None } else { Some(text) })
        })
        .await
    }

    async fn get_attribute(&self, name: &str) -> DriverResult<Option<String>> {
        let name = name.to_ascii_lowercase();
        self.read(move |dom, node| Ok(dom.nodes[node].attributes.get(&name).cloned()))
            .await
    }

    async fn is_visible(&self) -> DriverResult<bool> {
        self.read(|dom, node| Ok(dom.is_visible(node))).await
    }

    async fn is_enabled(&self) -> DriverResult<bool> {
        self.read(|dom, node| Ok(dom.is_enabled(node))).await
    }

    async fn click(&self, options: ClickOptions) -> DriverResult<()> {
        let site = Arc::clone(&self.site);
        self.write(move |state, node| {
            if !options.force {
                ensure_actionable(&state.dom, node, "click")?;
            }
            if is_toggle(&state.dom, node) {
                let checked = state.dom.nodes[node].attributes.contains_key("checked");
                let radio = state.dom.input_type(node) == "radio";
                set_checked(state, node, radio || !checked);
                return Ok(());
            }
            let href = (state.dom.nodes[node].tag == "a")
                .then(|| state.dom.nodes[node].attributes.get("href").cloned())
                .flatten();
            if let Some(target) = href.and_then(|h| resolve_href(&state.url, &h)) {
                match site.lookup(&target) {
                    Some((key, page)) => state.load(key, page),
                    None => tracing::debug!("link target {} has no fixture page", target),
                }
            }
            Ok(())
        })
        .await
    }

    async fn fill(&self, value: &str) -> DriverResult<()> {
        let value = value.to_string();
        self.write(move |state, node| {
            ensure_actionable(&state.dom, node, "fill")?;
            let dom = &mut state.dom;
            let tag = dom.nodes[node].tag.as_str();
            let fillable = (tag == "input" && !NON_TEXT_INPUT_TYPES.contains(&dom.input_type(node)))
                || tag == "textarea"
                || matches!(
                    dom.nodes[node].attributes.get("contenteditable").map(String::as_str),
                    Some("" | "true")
                );
            if !fillable {
                return Err(DriverError::backend(
                    "fill: element is not an <input>, <textarea> or [contenteditable] element",
                ));
            }
            dom.nodes[node].attributes.insert("value".to_string(), value);
            state.focused = Some(node);
            Ok(())
        })
        .await
    }

    async fn check(&self) -> DriverResult<()> {
        self.write(|state, node| {
            ensure_actionable(&state.dom, node, "check")?;
            if !is_toggle(&state.dom, node) {
                return Err(DriverError::backend(
                    "check: not a checkbox or radio button",
                ));
            }
            set_checked(state, node, true);
            Ok(())
        })
        .await
    }

    async fn uncheck(&self) -> DriverResult<()> {
        self.write(|state, node| {
            ensure_actionable(&state.dom, node, "uncheck")?;
            if !is_toggle(&state.dom, node) {
                return Err(DriverError::backend("uncheck: not a checkbox"));
            }
            if state.dom.input_type(node) == "radio" {
                return Err(DriverError::backend("uncheck: cannot uncheck radio button"));
            }
            set_checked(state, node, false);
            Ok(())
        })
        .await
    }

    async fn select_option(&self, value: &str) -> DriverResult<()> {
        let value = value.to_string();
        self.write(move |state, node| {
            ensure_actionable(&state.dom, node, "selectOption")?;
            let dom = &mut state.dom;
            if dom.nodes[node].tag != "select" {
                return Err(DriverError::backend("selectOption: element is not a <select>"));
            }
            let options: Vec<usize> = dom
                .descendants(node)
                .into_iter()
                .filter(|&n| dom.nodes[n].tag == "option")
                .collect();
            let chosen = options
                .iter()
                .copied()
                .find(|&n| {
                    dom.nodes[n].attributes.get("value") == Some(&value)
                        || dom.text_content(n).trim() == value
                })
                .ok_or_else(|| {
                    DriverError::backend(format!("selectOption: no option matching '{value}'"))
                })?;
            let chosen_value = dom.nodes[chosen]
                .attributes
                .get("value")
                .cloned()
                .unwrap_or_else(|| dom.text_content(chosen).trim().to_string());
            for &option in &options {
                dom.nodes[option].attributes.remove("selected");
            }
            dom.nodes[chosen]
                .attributes
                .insert("selected".to_string(), "selected".to_string());
            dom.nodes[node]
                .attributes
                .insert("value".to_string(), chosen_value);
            Ok(())
        })
        .await
    }

    async fn hover(&self) -> DriverResult<()> {
        self.read(|dom, node| ensure_visible(dom, node, "hover")).await
    }

    async fn focus(&self) -> DriverResult<()> {
        self.write(|state, node| {
            state.focused = Some(node);
            Ok(())
        })
        .await
    }

    async fn press(&self, key: &str) -> DriverResult<()> {
        let key = key.to_string();
        self.write(move |state, node| {
            ensure_visible(&state.dom, node, "press")?;
            state.focused = Some(node);
            state.pressed_keys.push(key);
            Ok(())
        })
        .await
    }

    async fn structural_path(&self) -> DriverResult<Vec<PathStep>> {
        self.read(|dom, node| Ok(dom.path(node))).await
    }

    async fn screenshot(&self, options: ScreenshotOptions) -> DriverResult<Vec<u8>> {
        self.read(|dom, node| ensure_visible(dom, node, "screenshot"))
            .await?;
        write_capture(options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_href() {
        let current = "http://localhost:3000/app/index.html";
        assert_eq!(
            resolve_href(current, "/about").as_deref(),
            Some("http://localhost:3000/about")
        );
        assert_eq!(
            resolve_href(current, "settings").as_deref(),
            Some("http://localhost:3000/app/settings")
        );
        assert_eq!(
            resolve_href(current, "https://example.com/").as_deref(),
            Some("https://example.com/")
        );
        assert_eq!(resolve_href(current, "#top"), None);
        assert_eq!(
            resolve_href("http://localhost", "docs").as_deref(),
            Some("http://localhost/docs")
        );
    }

    #[test]
    fn test_dom_visibility() {
        let page = PageFixture::new("t")
            .node(
                NodeFixture::new("div")
                    .hidden()
                    .child(NodeFixture::new("button").text("Inner")),
            )
            .node(NodeFixture::new("span").attr("style", "display: none"))
            .node(NodeFixture::new("input").attr("type", "hidden"))
            .node(NodeFixture::new("p").text("Shown"));
        let dom = Dom::from_page(&page);
        let visible: Vec<&str> = (0..dom.len())
            .filter(|&n| dom.is_visible(n))
            .map(|n| dom.tag(n))
            .collect();
        assert_eq!(visible, vec!["html", "body", "p"]);
    }

    #[test]
    fn test_text_content_joins_children() {
        let page = PageFixture::new("t").node(
            NodeFixture::new("button")
                .child(NodeFixture::new("span").text("Save"))
                .child(NodeFixture::new("span").text("draft")),
        );
        let dom = Dom::from_page(&page);
        assert_eq!(dom.text_content(2), "Save draft");
    }

    #[test]
    fn test_path_counts_same_tag_siblings() {
        let page = PageFixture::new("t").node(
            NodeFixture::new("div")
                .attr("id", "toolbar")
                .child(NodeFixture::new("span"))
                .child(NodeFixture::new("button").text("Save"))
                .child(NodeFixture::new("button").text("Cancel")),
        );
        let dom = Dom::from_page(&page);
        assert_eq!(
            dom.path(5),
            vec![
                PathStep::new("div", 1).with_id("toolbar"),
                PathStep::new("button", 2),
            ]
        );
        assert!(dom.path(BODY).is_empty());
    }
}

//! In-page scripts shared by the browser backends.
//!
//! Bodies refer to the target element as `el`; the wrappers bind it the way
//! each protocol passes elements in.

pub const TAG_NAME: &str = "return el.tagName.toLowerCase();";

pub const TEXT_CONTENT: &str = "return el.textContent;";

pub const VALUE: &str = "return el.value === undefined ? null : String(el.value);";

pub const IS_VISIBLE: &str = "const s = window.getComputedStyle(el); \
     const r = el.getBoundingClientRect(); \
     return s.display !== 'none' && s.visibility !== 'hidden' && (r.width > 0 || r.height > 0);";

pub const IS_ENABLED: &str = "return !el.disabled;";

pub const CLEAR_VALUE: &str = "el.focus(); el.value = ''; \
     el.dispatchEvent(new Event('input', { bubbles: true })); return true;";

pub const HOVER: &str = "['mouseover', 'mouseenter', 'mousemove'].forEach(t => \
     el.dispatchEvent(new MouseEvent(t, { bubbles: true }))); return true;";

pub const FOCUS: &str = "el.focus(); return true;";

pub const FORCE_CLICK: &str = "el.click(); return true;";

pub const STRUCTURAL_PATH: &str = "const steps = []; \
     const stop = [document.body, document.documentElement]; \
     for (let n = el; n && !stop.includes(n); n = n.parentElement) { \
     let nth = 1; \
     for (let s = n.previousElementSibling; s; s = s.previousElementSibling) { \
     if (s.tagName === n.tagName) nth++; } \
     steps.unshift({ tag: n.tagName.toLowerCase(), id: n.id || null, nthOfType: nth }); } \
     return steps;";

pub const PAGE_METRICS: &str = "const n = s => document.querySelectorAll(s).length; return { \
     forms: n('form'), links: n('a[href]'), images: n('img'), \
     headings: n('h1, h2, h3, h4, h5, h6'), tables: n('table'), lists: n('ul, ol'), \
     iframes: n('iframe'), buttons: n('button'), inputs: n('input, textarea, select') };";

/// Toggle a checkbox/radio into `checked` through a real click.
pub fn set_checked(checked: bool) -> String {
    format!("if (el.checked !== {checked}) el.click(); return el.checked === {checked};")
}

/// Select the option whose value, label or text equals `value`.
pub fn select_option(value: &str) -> String {
    let literal = serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "const v = {literal}; \
         const o = Array.from(el.options || []).find(o => o.value === v || o.label === v || o.text.trim() === v); \
         if (!o) return false; \
         el.value = o.value; \
         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
         return true;"
    )
}

/// CDP `callFunctionOn` form: the element is `this`.
#[cfg(feature = "cdp")]
pub fn as_function(body: &str) -> String {
    format!("function() {{ const el = this; {body} }}")
}

/// WebDriver `execute` form: the element is the first argument.
#[cfg(feature = "webdriver")]
pub fn as_webdriver(body: &str) -> String {
    format!("const el = arguments[0]; {body}")
}

/// Page-level expression form.
#[cfg(feature = "cdp")]
pub fn as_expression(body: &str) -> String {
    format!("(() => {{ {body} }})()")
}

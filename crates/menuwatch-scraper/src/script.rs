//! Page-context scripts.
//!
//! Every script starts with a `/*menuwatch:...*/` tag so fakes and logs can
//! tell them apart. Selectors and phrases are embedded as JSON string
//! literals, never spliced in raw.

use menuwatch_core::{ExtractorConfig, LoginConfig};
use serde_json::json;

/// Tag of the login probe script.
pub const LOGIN_PROBE_TAG: &str = "/*menuwatch:login-probe*/";
/// Tag of the scroll-step script.
pub const SCROLL_STEP_TAG: &str = "/*menuwatch:scroll-step*/";
/// Tag of the content-height script.
pub const MEASURE_TAG: &str = "/*menuwatch:measure*/";
/// Tag of the scroll-reset script.
pub const SCROLL_RESET_TAG: &str = "/*menuwatch:scroll-reset*/";
/// Tag of the row extraction script.
pub const EXTRACT_TAG: &str = "/*menuwatch:extract*/";

fn literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Resolves the scroll target: the container, else the document.
fn scroll_target(container_selector: &str) -> String {
    format!(
        "const pick = () => {{ try {{ return document.querySelector({sel}); }} catch (e) {{ return null; }} }};
  const el = pick() || document.scrollingElement || document.documentElement;",
        sel = literal(container_selector)
    )
}

/// Reports the address and login markers of the current document.
pub fn login_probe(config: &LoginConfig) -> String {
    let phrases: Vec<String> = config
        .sign_in_phrases
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();
    format!(
        r#"{LOGIN_PROBE_TAG}
(() => {{
  const phrases = {phrases};
  let hasEmailInput = false;
  try {{ hasEmailInput = !!document.querySelector({email}); }} catch (e) {{}}
  const copy = Array.from(document.querySelectorAll('h1, h2, h3, button, label, [role="button"]'))
    .map((el) => (el.innerText || el.textContent || '').trim().toLowerCase());
  const hasSignInCopy = copy.some((text) => phrases.some((p) => text === p || text.startsWith(p + ' ')));
  return {{ url: window.location.href, hasEmailInput, hasSignInCopy }};
}})()"#,
        phrases = json!(phrases),
        email = literal(&config.email_selector),
    )
}

/// Scrolls the target down by `delta_px` and returns the new offset.
pub fn scroll_step(container_selector: &str, delta_px: u32) -> String {
    format!(
        "{SCROLL_STEP_TAG}
(() => {{
  {target}
  el.scrollBy(0, {delta_px});
  return el.scrollTop;
}})()",
        target = scroll_target(container_selector)
    )
}

/// Returns the target's full content height.
pub fn measure(container_selector: &str) -> String {
    format!(
        "{MEASURE_TAG}
(() => {{
  {target}
  return el.scrollHeight;
}})()",
        target = scroll_target(container_selector)
    )
}

/// Scrolls the target back to the origin and returns the resulting offset.
pub fn scroll_reset(container_selector: &str) -> String {
    format!(
        "{SCROLL_RESET_TAG}
(() => {{
  {target}
  el.scrollTo(0, 0);
  return el.scrollTop;
}})()",
        target = scroll_target(container_selector)
    )
}

/// Walks every row in document order and returns raw row descriptors.
///
/// Header rows come back as `{ header }`; other rows carry their tag labels,
/// text fields and choice span texts. Missing elements yield `""` and a row
/// that throws yields `{}`.
pub fn extract_rows(config: &ExtractorConfig) -> String {
    format!(
        r#"{EXTRACT_TAG}
(() => {{
  const sel = {selectors};
  const text = (root, selector) => {{
    try {{
      const el = root.querySelector(selector);
      return el ? (el.innerText || el.textContent || '').trim() : '';
    }} catch (e) {{ return ''; }}
  }};
  const texts = (root, selector) => {{
    try {{
      return Array.from(root.querySelectorAll(selector))
        .map((el) => (el.innerText || el.textContent || '').trim())
        .filter((t) => t.length > 0);
    }} catch (e) {{ return []; }}
  }};
  const isHeader = (row) => {{
    try {{ return row.matches(sel.header) || !!row.querySelector(sel.header); }} catch (e) {{ return false; }}
  }};
  const rows = [];
  for (const row of Array.from(document.querySelectorAll(sel.row))) {{
    try {{
      if (isHeader(row)) {{
        const own = row.matches(sel.header) ? (row.innerText || row.textContent || '').trim() : text(row, sel.header);
        rows.push({{ header: own }});
        continue;
      }}
      const choices = texts(row, sel.disabledChoice);
      rows.push({{
        tags: texts(row, sel.tag),
        name: text(row, sel.name),
        description: text(row, sel.description),
        price: text(row, sel.price),
        group: text(row, sel.group),
        choices,
        fallbackChoices: sel.fallbackEnabled && choices.length === 0 ? texts(row, sel.fallbackChoice) : [],
      }});
    }} catch (e) {{
      rows.push({{}});
    }}
  }}
  return rows;
}})()"#,
        selectors = json!({
            "row": config.row_selector,
            "header": config.category_header_selector,
            "tag": config.tag_selector,
            "name": config.name_selector,
            "description": config.description_selector,
            "price": config.price_selector,
            "group": config.choice_group_selector,
            "disabledChoice": config.disabled_choice_selector,
            "fallbackChoice": config.fallback_choice_selector,
            "fallbackEnabled": config.fallback_enabled,
        }),
    )
}

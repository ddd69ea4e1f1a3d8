//! JavaScript probes evaluated inside the results page.
//!
//! Every dynamic value is embedded as a JSON literal so selectors and ids
//! cannot break out of the script. Each builder returns a self-invoking
//! expression suitable for `Page::evaluate`.

/// Clears every client-side store before the site's own scripts run.
pub const RESET_STORAGE: &str = r#"(() => {
  try { localStorage.clear(); } catch (e) {}
  try { sessionStorage.clear(); } catch (e) {}
  try {
    if (window.caches && caches.keys) {
      caches.keys().then(keys => keys.forEach(key => caches.delete(key)));
    }
  } catch (e) {}
  try {
    if (window.indexedDB && indexedDB.databases) {
      indexedDB.databases().then(dbs => dbs.forEach(db => {
        if (db && db.name) { indexedDB.deleteDatabase(db.name); }
      }));
    }
  } catch (e) {}
})()"#;

fn literal(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// `data-id` of every rendered list item, in DOM order.
pub fn rendered_ids(list_item: &str) -> String {
    format!(
        r#"(() => Array.from(document.querySelectorAll({sel}))
  .map(node => node.dataset.id)
  .filter(Boolean))()"#,
        sel = literal(list_item)
    )
}

/// Scroll the container forward and report `{ moved, offset, maxOffset }`.
pub fn scroll_by(container: &str, step_px: u32) -> String {
    format!(
        r#"(() => {{
  const container = document.querySelector({sel});
  if (!container) {{
    return {{ moved: false, offset: null, maxOffset: null }};
  }}
  const prevTop = container.scrollTop;
  const maxTop = container.scrollHeight - container.clientHeight;
  const nextTop = Math.min(prevTop + {step}, maxTop);
  container.scrollTop = nextTop;
  container.dispatchEvent(new Event("scroll", {{ bubbles: true }}));
  return {{ moved: nextTop > prevTop, offset: Math.round(nextTop), maxOffset: Math.round(maxTop) }};
}})()"#,
        sel = literal(container),
        step = step_px
    )
}

/// Scroll the container back to the top. Evaluates to `false` without a container.
pub fn reset_scroll(container: &str) -> String {
    format!(
        r#"(() => {{
  const container = document.querySelector({sel});
  if (!container) {{
    return false;
  }}
  container.scrollTop = 0;
  container.dispatchEvent(new Event("scroll", {{ bubbles: true }}));
  return true;
}})()"#,
        sel = literal(container)
    )
}

/// Click the wrapper inside the list item carrying `id`.
pub fn open_item(list_item: &str, wrapper: &str, id: &str) -> String {
    format!(
        r#"(() => {{
  const id = {id};
  const item = Array.from(document.querySelectorAll({item}))
    .find(node => node.dataset.id === id);
  if (!item) {{
    return false;
  }}
  const wrapper = item.querySelector({wrapper});
  if (!wrapper) {{
    return false;
  }}
  wrapper.scrollIntoView({{ block: "nearest" }});
  wrapper.click();
  return true;
}})()"#,
        id = literal(id),
        item = literal(list_item),
        wrapper = literal(wrapper)
    )
}

/// Whether `selector` matches anything. Invalid selectors evaluate to `false`.
pub fn exists(selector: &str) -> String {
    format!(
        r#"(() => {{
  try {{ return document.querySelector({sel}) !== null; }} catch (e) {{ return false; }}
}})()"#,
        sel = literal(selector)
    )
}

/// `outerHTML` of the first match, or `null`.
pub fn outer_html(selector: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector({sel});
  return el ? el.outerHTML : null;
}})()"#,
        sel = literal(selector)
    )
}

/// Click the first visible button whose text contains `label`.
pub fn click_button_with_label(label: &str) -> String {
    format!(
        r#"(() => {{
  const label = {label};
  const button = Array.from(document.querySelectorAll("button"))
    .find(b => (b.innerText || b.textContent || "").includes(label) && b.offsetParent !== null);
  if (!button) {{
    return false;
  }}
  button.click();
  return true;
}})()"#,
        label = literal(label)
    )
}

/// Whether a captcha interstitial is showing.
pub fn captcha_present(selectors: &[String], url_marker: &str) -> String {
    let selectors = serde_json::Value::from(selectors.to_vec()).to_string();
    format!(
        r#"(() => {{
  const marker = {marker};
  if (marker && location.href.includes(marker)) {{
    return true;
  }}
  return {selectors}.some(sel => {{
    try {{ return document.querySelector(sel) !== null; }} catch (e) {{ return false; }}
  }});
}})()"#,
        marker = literal(url_marker)
    )
}

//! Server-rendered index page.

use crate::catalog::Catalog;

const INDEX_TEMPLATE: &str = include_str!("index.html");

/// Renders the index page with one `<option>` per catalog label.
pub fn render_index(catalog: &Catalog) -> String {
    let options = catalog
        .labels()
        .map(|label| {
            let label = escape_html(label);
            format!("      <option value=\"{label}\">{label}</option>")
        })
        .collect::<Vec<_>>()
        .join("\n");

    INDEX_TEMPLATE.replace("{{query_options}}", &options)
}

/// Escapes text for use in HTML element content and quoted attributes.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

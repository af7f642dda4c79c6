//! Page rewriting for pages served by the dev server

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

lazy_static! {
    static ref HEAD_OPEN: Regex = Regex::new(r"(?i)<head(\s[^>]*)?>").unwrap();
    static ref HTML_OPEN: Regex = Regex::new(r"(?i)<html(\s[^>]*)?>").unwrap();
    static ref INLINE_SCRIPT: Regex = Regex::new(r"(?is)<script\b[^>]*>(.*?)</script>").unwrap();
}

/// Put `<base href>` first inside `<head>`, adding a head element when the page has none
pub fn inject_base_href(html: &str, href: &str) -> String {
    let base = format!(r#"<base href="{}">"#, href);

    if let Some(head) = HEAD_OPEN.find(html) {
        format!("{}{}{}", &html[..head.end()], base, &html[head.end()..])
    } else if let Some(root) = HTML_OPEN.find(html) {
        format!("{}<head>{}</head>{}", &html[..root.end()], base, &html[root.end()..])
    } else {
        format!("<head>{}</head>{}", base, html)
    }
}

/// CSP hash sources (`'sha256-…'`) for every non-blank inline script body
pub fn inline_script_hashes(html: &str) -> Vec<String> {
    INLINE_SCRIPT
        .captures_iter(html)
        .filter_map(|captures| captures.get(1))
        .map(|body| body.as_str())
        .filter(|body| !body.trim().is_empty())
        .map(|body| format!("'sha256-{}'", STANDARD.encode(Sha256::digest(body.as_bytes()))))
        .collect()
}

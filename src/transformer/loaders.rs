//! Loader files that bridge module-loading restrictions of extension contexts

use crate::models::EmittedFile;
use crate::utils::helpers::{is_url, root_relative};
use serde_json::Value;

/// Page wrapping a list of module scripts, for contexts that only accept a page
pub fn html_loader(name: &str, scripts: &[String]) -> EmittedFile {
    let tags: String = scripts
        .iter()
        .map(|src| format!("<script type=\"module\" src=\"{}\"></script>", src))
        .collect();

    EmittedFile::new(
        format!("{}.html", name),
        format!("<!DOCTYPE html><html><head>{}</head></html>", tags),
    )
}

/// Script that dynamically imports each input; bare paths go through
/// `chrome.runtime.getURL`, absolute paths and URLs are imported as written.
pub fn script_loader(name: &str, imports: &[String]) -> EmittedFile {
    let statements = imports
        .iter()
        .map(|import| {
            let literal = js_string(import);
            if is_url(import) || import.starts_with('/') {
                format!("await import({});", literal)
            } else {
                format!("await import(chrome.runtime.getURL({}));", literal)
            }
        })
        .collect::<String>();

    EmittedFile::new(format!("{}.js", name), format!("(async()=>{{{}}})();", statements))
}

/// Script with one static import per input, for contexts without dynamic import
pub fn static_script_loader(name: &str, imports: &[String]) -> EmittedFile {
    let statements = imports
        .iter()
        .map(|import| format!("import {};", js_string(&root_relative(import))))
        .collect::<Vec<_>>()
        .join("\n");

    EmittedFile::new(format!("{}.js", name), statements)
}

fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

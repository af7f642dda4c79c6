//! Best-effort patches to the live-reload client module.
//!
//! Each patch is applied only when its precondition matches; otherwise the code passes through
//! untouched and a warning is logged.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

lazy_static! {
    static ref STYLE_APPEND: Regex = Regex::new(r"document\.head\.appendChild\(\s*style\s*\)").unwrap();
    static ref WINDOW_ACCESS: Regex = Regex::new(r"\bwindow\.").unwrap();
}

pub const STYLE_TARGET_GLOBAL: &str = "__WEB_EXT_STYLE_TARGET__";

const WINDOW_GUARD: &str = "if (typeof window === \"undefined\") { globalThis.window = globalThis; }\n";

pub struct ClientPatch {
    pub name: &'static str,
    precondition: &'static Regex,
    transform: fn(&str) -> String,
}

impl ClientPatch {
    /// Apply the patch, or `None` when the precondition is not found
    pub fn apply(&self, code: &str) -> Option<String> {
        if self.precondition.is_match(code) {
            Some((self.transform)(code))
        } else {
            None
        }
    }
}

/// Patches in application order
pub fn client_patches() -> Vec<ClientPatch> {
    vec![
        ClientPatch {
            name: "style-target",
            precondition: &STYLE_APPEND,
            transform: |code| {
                let target = format!("(globalThis.{} || document.head).appendChild(style)", STYLE_TARGET_GLOBAL);
                STYLE_APPEND.replace_all(code, target.as_str()).into_owned()
            },
        },
        ClientPatch {
            name: "window-guard",
            precondition: &WINDOW_ACCESS,
            transform: |code| format!("{}{}", WINDOW_GUARD, code),
        },
    ]
}

pub fn patch_client(code: &str) -> String {
    client_patches()
        .iter()
        .fold(code.to_string(), |code, patch| match patch.apply(&code) {
            Some(patched) => {
                debug!(patch = patch.name, "patched live-reload client");
                patched
            }
            None => {
                warn!(patch = patch.name, "live-reload client did not match; patch skipped");
                code
            }
        })
}

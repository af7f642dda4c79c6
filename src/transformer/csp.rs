//! Content-Security-Policy parsing and development-time merging

use indexmap::IndexMap;
use std::fmt;

/// Directive name to ordered source list, in first-seen directive order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityPolicy {
    directives: IndexMap<String, Vec<String>>,
}

impl SecurityPolicy {
    /// Parse a policy string. Repeated directives are folded into the first occurrence.
    pub fn parse(policy: &str) -> Self {
        let mut parsed = Self::default();

        for directive in policy.split(';') {
            let mut tokens = directive.split_whitespace();
            let Some(name) = tokens.next() else {
                continue;
            };
            parsed
                .directives
                .entry(name.to_string())
                .or_default()
                .extend(tokens.map(str::to_string));
        }

        parsed.dedup();
        parsed
    }

    /// Put `sources` ahead of the directive's existing sources, creating it when absent
    pub fn prepend<I, S>(&mut self, directive: &str, sources: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let existing = self.directives.entry(directive.to_string()).or_default();
        let mut merged: Vec<String> = sources.into_iter().map(Into::into).collect();
        merged.append(existing);
        *existing = merged;
        self.dedup();
    }

    pub fn sources(&self, directive: &str) -> Option<&[String]> {
        self.directives.get(directive).map(Vec::as_slice)
    }

    pub fn directives(&self) -> impl Iterator<Item = &str> {
        self.directives.keys().map(String::as_str)
    }

    fn dedup(&mut self) {
        for sources in self.directives.values_mut() {
            let mut seen = std::collections::HashSet::new();
            sources.retain(|source| seen.insert(source.clone()));
        }
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .directives
            .iter()
            .map(|(name, sources)| {
                if sources.is_empty() {
                    name.clone()
                } else {
                    format!("{} {}", name, sources.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&rendered)
    }
}

/// Allow the dev server origin and collected inline script hashes on top of `base`
pub fn merge_dev_policy(base: &str, origin: &str, inline_hashes: &[String]) -> String {
    let mut policy = SecurityPolicy::parse(base);

    let script_sources = ["'self'".to_string(), origin.to_string()]
        .into_iter()
        .chain(inline_hashes.iter().cloned());
    policy.prepend("script-src", script_sources);
    policy.prepend("object-src", ["'self'"]);

    policy.to_string()
}

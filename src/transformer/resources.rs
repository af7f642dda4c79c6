//! Merging and ordering of web-accessible resource declarations

use crate::models::WebAccessibleResourceV3;
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde_json::Value;

/// Generation 2: plain file names, sorted and deduplicated
pub fn optimize_v2(resources: &mut Vec<String>) {
    resources.sort();
    resources.dedup();
}

/// Generation 3: declarations that agree on every field but `resources` are merged.
///
/// Groups keep the position of their first member. Within a group a later declaration's
/// fields replace earlier ones and file lists are unioned and sorted.
pub fn optimize_v3(declarations: Vec<WebAccessibleResourceV3>) -> Vec<WebAccessibleResourceV3> {
    let mut groups: IndexMap<MergeKey, WebAccessibleResourceV3> = IndexMap::new();

    for declaration in declarations {
        match groups.entry(MergeKey::of(&declaration)) {
            Entry::Occupied(mut occupied) => {
                let merged = occupied.get_mut();
                let mut resources = std::mem::take(&mut merged.resources);
                resources.extend(declaration.resources.iter().cloned());
                *merged = WebAccessibleResourceV3 {
                    resources,
                    ..declaration
                };
            }
            Entry::Vacant(vacant) => {
                vacant.insert(declaration);
            }
        }
    }

    groups
        .into_values()
        .map(|mut declaration| {
            declaration.resources.sort();
            declaration.resources.dedup();
            declaration
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MergeKey {
    matches: Option<Vec<String>>,
    extension_ids: Option<Vec<String>>,
    use_dynamic_url: Option<bool>,
    extra: String,
}

impl MergeKey {
    fn of(declaration: &WebAccessibleResourceV3) -> Self {
        let canonical = |list: &Option<Vec<String>>| {
            list.as_ref().map(|items| {
                let mut items = items.clone();
                items.sort();
                items.dedup();
                items
            })
        };

        Self {
            matches: canonical(&declaration.matches),
            extension_ids: canonical(&declaration.extension_ids),
            use_dynamic_url: declaration.use_dynamic_url,
            extra: Value::Object(declaration.extra.clone().into_iter().collect()).to_string(),
        }
    }
}

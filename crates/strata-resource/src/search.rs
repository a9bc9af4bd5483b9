use std::path::PathBuf;

use serde::Serialize;
use strata_types::ResourceKind;

use crate::error::ResourceResult;
use crate::frontmatter::truncate_body;
use crate::store::{ResourceFile, ResourceStore};

/// Lines of body shown in a preview and searched.
pub const PREVIEW_LINES: usize = 5;

/// A resource matching a search query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub kind: ResourceKind,
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub file_path: PathBuf,
    pub preview: String,
}

impl SearchHit {
    fn from_resource(kind: ResourceKind, resource: ResourceFile, preview: String) -> Self {
        Self {
            kind,
            id: resource.id,
            name: resource.name,
            description: Some(resource.description).filter(|d| !d.is_empty()),
            file_path: resource.file_path,
            preview,
        }
    }
}

/// Case-insensitive substring match against any of `texts`. The empty query
/// matches everything.
pub fn matches_query(query: &str, texts: &[&str]) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    texts.iter().any(|t| t.to_lowercase().contains(&needle))
}

/// Search every store for resources whose name, description or body preview
/// contains `query`. Results keep store order, then file-name order.
pub fn search(stores: &[ResourceStore], query: &str) -> ResourceResult<Vec<SearchHit>> {
    let mut hits = Vec::new();
    for store in stores {
        for resource in store.list()? {
            let preview = truncate_body(&resource.body, PREVIEW_LINES);
            let texts = [resource.name.as_str(), resource.description.as_str(), preview.as_str()];
            if matches_query(query, &texts) {
                hits.push(SearchHit::from_resource(store.kind(), resource, preview));
            }
        }
    }
    Ok(hits)
}

use std::sync::Arc;

use url::Url;

use crate::browser::surface::{BrowserError, BrowserPage, NodeRef};
use crate::extract::scoped::ScopedExtractor;
use crate::selectors::resolver::SelectorResolver;
use crate::selectors::table::Namespace;

/// Re-acquires a list item after the DOM may have been invalidated.
///
/// Overlay open/close cycles routinely re-render the virtualized result
/// list, so any node handle taken before the cycle is garbage afterwards.
/// Identity is the item's canonical resource path, never its position: a
/// re-rendered list reorders freely, and matching by index would silently
/// attach one note's detail to another note's record.
pub struct ListRelocator {
    page: Arc<dyn BrowserPage>,
    resolver: Arc<SelectorResolver>,
    extractor: Arc<ScopedExtractor>,
    base_url: String,
}

impl ListRelocator {
    pub fn new(
        page: Arc<dyn BrowserPage>,
        resolver: Arc<SelectorResolver>,
        extractor: Arc<ScopedExtractor>,
        base_url: String,
    ) -> Self {
        Self {
            page,
            resolver,
            extractor,
            base_url,
        }
    }

    /// Fresh node for the item whose canonical path equals `key`, or `None`
    /// after one scroll-and-rescan attempt. `None` is a per-item skip for
    /// the caller, not a run failure.
    pub async fn relocate(&self, key: &str) -> Result<Option<NodeRef>, BrowserError> {
        if let Some(node) = self.scan(key).await? {
            return Ok(Some(node));
        }

        tracing::debug!(target: "relocate", key, "item not in current list, scrolling and rescanning");
        let _ = self.page.scroll_by(400).await;
        self.scan(key).await
    }

    async fn scan(&self, key: &str) -> Result<Option<NodeRef>, BrowserError> {
        let items = self
            .resolver
            .nodes(NodeRef::DOCUMENT, Namespace::Search, "note_item")
            .await?;
        for item in items {
            let Some(href) = self
                .extractor
                .link_href(item, Namespace::Search, "note_link")
                .await?
            else {
                continue;
            };
            if canonical_key(&href, &self.base_url).as_deref() == Some(key) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }
}

/// Canonical stable key for an item link: the URL path with scheme, host,
/// query and fragment stripped. Query strings carry per-render tracking
/// tokens and must never participate in identity.
pub fn canonical_key(href: &str, base_url: &str) -> Option<String> {
    let absolute = match Url::parse(href) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(base_url).ok()?.join(href).ok()?
        }
        Err(_) => return None,
    };
    let path = absolute.path();
    if path.is_empty() || path == "/" {
        return None;
    }
    Some(path.to_string())
}

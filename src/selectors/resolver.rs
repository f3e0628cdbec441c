use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::browser::surface::{BrowserError, BrowserPage, NodeRef};
use crate::selectors::table::{Namespace, SelectorCandidate, SelectorTable};

/// Resolves logical field names to DOM nodes/values through the configured
/// candidate lists. Every query is bound to an explicit scope root; a match
/// that escapes the scope is discarded even when the candidate selector was
/// written loosely, so a background element can never stand in for an
/// overlay element. Misses are observability events, not errors.
pub struct SelectorResolver {
    page: Arc<dyn BrowserPage>,
    table: Arc<SelectorTable>,
    misses: Mutex<HashMap<(Namespace, String), u64>>,
}

impl SelectorResolver {
    pub fn new(page: Arc<dyn BrowserPage>, table: Arc<SelectorTable>) -> Self {
        Self {
            page,
            table,
            misses: Mutex::new(HashMap::new()),
        }
    }

    /// First candidate, in declared order, that yields a node inside `scope`.
    pub async fn node(
        &self,
        scope: NodeRef,
        ns: Namespace,
        field: &str,
    ) -> Result<Option<NodeRef>, BrowserError> {
        for candidate in self.table.candidates(ns, field) {
            if let Some(node) = self.candidate_node(scope, candidate).await? {
                return Ok(Some(node));
            }
        }
        self.note_miss(scope, ns, field);
        Ok(None)
    }

    /// Like `node`, but skips matches that are not currently visible. Used
    /// for signals where a hidden template in the DOM must not count, e.g.
    /// the login prompt.
    pub async fn visible_node(
        &self,
        scope: NodeRef,
        ns: Namespace,
        field: &str,
    ) -> Result<Option<NodeRef>, BrowserError> {
        for candidate in self.table.candidates(ns, field) {
            let nodes = self.candidate_nodes(scope, candidate).await?;
            for node in nodes {
                if self.page.is_visible(node).await? {
                    return Ok(Some(node));
                }
            }
        }
        self.note_miss(scope, ns, field);
        Ok(None)
    }

    /// All matches of the first candidate that yields any. Candidates are
    /// alternatives for the same logical list, so their results are not
    /// merged across candidates.
    pub async fn nodes(
        &self,
        scope: NodeRef,
        ns: Namespace,
        field: &str,
    ) -> Result<Vec<NodeRef>, BrowserError> {
        for candidate in self.table.candidates(ns, field) {
            let nodes = self.candidate_nodes(scope, candidate).await?;
            if !nodes.is_empty() {
                return Ok(nodes);
            }
        }
        self.note_miss(scope, ns, field);
        Ok(Vec::new())
    }

    /// First candidate that yields a non-empty value: the candidate's
    /// attribute when configured, text content otherwise. Returns `None`
    /// (and records a miss) when every candidate fails; the caller supplies
    /// its own default.
    pub async fn value(
        &self,
        scope: NodeRef,
        ns: Namespace,
        field: &str,
    ) -> Result<Option<String>, BrowserError> {
        for candidate in self.table.candidates(ns, field) {
            let Some(node) = self.candidate_node(scope, candidate).await? else {
                continue;
            };
            let raw = match candidate.attr.as_deref() {
                Some(attr) => self.page.attribute(node, attr).await?.unwrap_or_default(),
                None => self.page.text(node).await?,
            };
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
        self.note_miss(scope, ns, field);
        Ok(None)
    }

    /// Non-empty values of all matches of the first productive candidate.
    pub async fn values(
        &self,
        scope: NodeRef,
        ns: Namespace,
        field: &str,
    ) -> Result<Vec<String>, BrowserError> {
        for candidate in self.table.candidates(ns, field) {
            let nodes = self.candidate_nodes(scope, candidate).await?;
            let mut out = Vec::new();
            for node in nodes {
                let raw = match candidate.attr.as_deref() {
                    Some(attr) => self.page.attribute(node, attr).await?.unwrap_or_default(),
                    None => self.page.text(node).await?,
                };
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            if !out.is_empty() {
                return Ok(out);
            }
        }
        self.note_miss(scope, ns, field);
        Ok(Vec::new())
    }

    /// Whether a previously resolved node is still attached to the page.
    pub async fn scope_exists(&self, node: NodeRef) -> Result<bool, BrowserError> {
        self.page.contains(NodeRef::DOCUMENT, node).await
    }

    /// Miss counts per (namespace, field), for run diagnostics.
    pub fn miss_counts(&self) -> HashMap<(Namespace, String), u64> {
        self.misses.lock().clone()
    }

    async fn candidate_node(
        &self,
        scope: NodeRef,
        candidate: &SelectorCandidate,
    ) -> Result<Option<NodeRef>, BrowserError> {
        let query_root = match self.candidate_root(scope, candidate).await? {
            Some(root) => root,
            None => return Ok(None),
        };
        let Some(node) = self.page.query(query_root, &candidate.selector).await? else {
            return Ok(None);
        };
        if self.confine(scope, node, candidate).await? {
            Ok(Some(node))
        } else {
            Ok(None)
        }
    }

    async fn candidate_nodes(
        &self,
        scope: NodeRef,
        candidate: &SelectorCandidate,
    ) -> Result<Vec<NodeRef>, BrowserError> {
        let query_root = match self.candidate_root(scope, candidate).await? {
            Some(root) => root,
            None => return Ok(Vec::new()),
        };
        let mut confined = Vec::new();
        for node in self.page.query_all(query_root, &candidate.selector).await? {
            if self.confine(scope, node, candidate).await? {
                confined.push(node);
            }
        }
        Ok(confined)
    }

    async fn candidate_root(
        &self,
        scope: NodeRef,
        candidate: &SelectorCandidate,
    ) -> Result<Option<NodeRef>, BrowserError> {
        match candidate.scope.as_deref() {
            Some(prefix) if scope.is_document() => self.page.query(scope, prefix).await,
            // Inside a non-document scope the prefix narrows further; when
            // the scope root itself already is the prefixed container the
            // prefix may not re-match, so fall back to the scope root.
            Some(prefix) => Ok(self
                .page
                .query(scope, prefix)
                .await?
                .or(Some(scope))),
            None => Ok(Some(scope)),
        }
    }

    /// Hard containment: a resolved node outside the caller's scope is a
    /// cross-tree leak (background bleeding through an overlay query or the
    /// reverse) and is rejected no matter what the selector matched.
    async fn confine(
        &self,
        scope: NodeRef,
        node: NodeRef,
        candidate: &SelectorCandidate,
    ) -> Result<bool, BrowserError> {
        if scope.is_document() || self.page.contains(scope, node).await? {
            return Ok(true);
        }
        tracing::warn!(
            target: "selector",
            selector = %candidate.selector,
            ?scope,
            ?node,
            "discarded match outside scope root"
        );
        Ok(false)
    }

    fn note_miss(&self, scope: NodeRef, ns: Namespace, field: &str) {
        tracing::debug!(
            target: "selector",
            namespace = ns.as_str(),
            field,
            ?scope,
            "no selector candidate resolved"
        );
        *self
            .misses
            .lock()
            .entry((ns, field.to_string()))
            .or_insert(0) += 1;
    }
}

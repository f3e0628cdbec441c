use std::collections::HashMap;
use std::sync::Arc;

use crate::browser::surface::{BrowserError, NodeRef};
use crate::error::ScrapeError;
use crate::extract::counts::parse_count;
use crate::selectors::resolver::SelectorResolver;
use crate::selectors::table::Namespace;

/// How a field's raw value is post-processed after resolution.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Trimmed text content (or the candidate's configured attribute).
    Text,
    /// Locale-aware magnitude parse: "1.2万" → 12000.
    Count,
    /// All matches as a normalized hashtag list.
    TagList,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ns: Namespace,
    pub field: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Count(u64),
    Tags(Vec<String>),
    Missing,
}

/// Result of one scoped extraction call. A missing individual field is kept
/// as `Missing` and never fails the record.
#[derive(Debug, Default)]
pub struct ExtractedRecord {
    values: HashMap<&'static str, FieldValue>,
}

impl ExtractedRecord {
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(FieldValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn count(&self, name: &str) -> Option<u64> {
        match self.values.get(name) {
            Some(FieldValue::Count(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn tags(&self, name: &str) -> Vec<String> {
        match self.values.get(name) {
            Some(FieldValue::Tags(tags)) => tags.clone(),
            _ => Vec::new(),
        }
    }
}

/// Reads fields from a bounded DOM region. All queries go through the
/// resolver bound to the given scope root; this type never touches the
/// document root on its own, which is what keeps overlay extraction and
/// background extraction from bleeding into each other.
pub struct ScopedExtractor {
    resolver: Arc<SelectorResolver>,
}

impl ScopedExtractor {
    pub fn new(resolver: Arc<SelectorResolver>) -> Self {
        Self { resolver }
    }

    /// Extracts a field set under `scope`. A vanished scope root is fatal
    /// to the whole call; individual fields are best-effort.
    pub async fn extract(
        &self,
        scope: NodeRef,
        fields: &[FieldSpec],
    ) -> Result<ExtractedRecord, ScrapeError> {
        if !scope.is_document() && !self.resolver.scope_exists(scope).await? {
            return Err(ScrapeError::not_found("extraction scope root"));
        }
        let mut record = ExtractedRecord::default();
        for spec in fields {
            let value = match spec.kind {
                FieldKind::Text => self
                    .resolver
                    .value(scope, spec.ns, spec.field)
                    .await?
                    .map(FieldValue::Text)
                    .unwrap_or(FieldValue::Missing),
                FieldKind::Count => self
                    .resolver
                    .value(scope, spec.ns, spec.field)
                    .await?
                    .map(|raw| FieldValue::Count(parse_count(&raw)))
                    .unwrap_or(FieldValue::Missing),
                FieldKind::TagList => {
                    let raw = self.resolver.values(scope, spec.ns, spec.field).await?;
                    if raw.is_empty() {
                        FieldValue::Missing
                    } else {
                        FieldValue::Tags(normalize_tags(raw))
                    }
                }
            };
            record.values.insert(spec.name, value);
        }
        Ok(record)
    }

    pub async fn text(
        &self,
        scope: NodeRef,
        ns: Namespace,
        field: &str,
    ) -> Result<Option<String>, BrowserError> {
        self.resolver.value(scope, ns, field).await
    }

    pub async fn count(
        &self,
        scope: NodeRef,
        ns: Namespace,
        field: &str,
    ) -> Result<Option<u64>, BrowserError> {
        Ok(self
            .resolver
            .value(scope, ns, field)
            .await?
            .map(|raw| parse_count(&raw)))
    }

    pub async fn link_href(
        &self,
        scope: NodeRef,
        ns: Namespace,
        field: &str,
    ) -> Result<Option<String>, BrowserError> {
        self.resolver.value(scope, ns, field).await
    }
}

/// `#`-prefixes, trims, and de-duplicates while keeping first-seen order.
fn normalize_tags(raw: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut tags = Vec::new();
    for tag in raw {
        let trimmed = tag.trim();
        if trimmed.is_empty() || trimmed == "#" {
            continue;
        }
        let normalized = if trimmed.starts_with('#') {
            trimmed.to_string()
        } else {
            format!("#{trimmed}")
        };
        if seen.insert(normalized.clone()) {
            tags.push(normalized);
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_prefixed_and_deduplicated() {
        let tags = normalize_tags(vec![
            "咖啡".to_string(),
            "#探店".to_string(),
            "咖啡".to_string(),
            "  ".to_string(),
            "#".to_string(),
        ]);
        assert_eq!(tags, vec!["#咖啡".to_string(), "#探店".to_string()]);
    }
}

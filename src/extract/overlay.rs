use std::sync::Arc;

use crate::browser::pacing::Pacer;
use crate::browser::surface::{BrowserPage, NodeRef, FORCE_CLICK_SCRIPT};
use crate::browser::wait::{wait_for_field, wait_for_field_gone};
use crate::config::WaitConfig;
use crate::domain::SessionState;
use crate::error::ScrapeError;
use crate::extract::scoped::{ExtractedRecord, FieldKind, FieldSpec, ScopedExtractor};
use crate::selectors::resolver::SelectorResolver;
use crate::selectors::table::Namespace;
use crate::session::detector::SessionStateDetector;

/// Detail fields lifted out of an open overlay. Everything is optional:
/// individual misses degrade the record, they never fail it.
#[derive(Debug, Clone, Default)]
pub struct DetailFields {
    pub detail_url: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub like_count: Option<u64>,
    pub collect_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub tags: Vec<String>,
    pub publish_time: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug)]
pub enum DetailOutcome {
    Extracted(DetailFields),
    Timeout,
    Skipped,
}

/// Markers of a note that renders an error surface instead of content.
const DEAD_NOTE_MARKERS: [&str; 4] = ["当前笔记暂时无法浏览", "笔记不存在", "内容已被删除", "页面不存在"];

const DETAIL_FIELDS: [FieldSpec; 8] = [
    FieldSpec { name: "title", ns: Namespace::NoteDetail, field: "title", kind: FieldKind::Text },
    FieldSpec { name: "content", ns: Namespace::NoteDetail, field: "content", kind: FieldKind::Text },
    FieldSpec { name: "like_count", ns: Namespace::NoteDetail, field: "like_count", kind: FieldKind::Count },
    FieldSpec { name: "collect_count", ns: Namespace::NoteDetail, field: "collect_count", kind: FieldKind::Count },
    FieldSpec { name: "comment_count", ns: Namespace::NoteDetail, field: "comment_count", kind: FieldKind::Count },
    FieldSpec { name: "tags", ns: Namespace::NoteDetail, field: "tags", kind: FieldKind::TagList },
    FieldSpec { name: "publish_time", ns: Namespace::NoteDetail, field: "publish_time", kind: FieldKind::Text },
    FieldSpec { name: "author", ns: Namespace::NoteDetail, field: "author", kind: FieldKind::Text },
];

/// Opens an item's detail overlay, extracts inside its scope, and closes it
/// without disturbing the background list.
///
/// Two hostile behaviors of the page shape this type. First, a standard
/// click on the activation target is sometimes swallowed by the page's
/// event delegation even though the element is plainly clickable, so after
/// a short grace period the click is re-issued as a synthetic script event.
/// Second, dismissing the overlay by history navigation destroys the SPA's
/// in-memory search state irrecoverably, so closing is always an
/// escape-style dismissal with the overlay's own close control as fallback
/// and never a back-navigation.
pub struct OverlayNavigator {
    page: Arc<dyn BrowserPage>,
    resolver: Arc<SelectorResolver>,
    extractor: Arc<ScopedExtractor>,
    detector: Arc<SessionStateDetector>,
    pacer: Arc<Pacer>,
    waits: WaitConfig,
}

impl OverlayNavigator {
    pub fn new(
        page: Arc<dyn BrowserPage>,
        resolver: Arc<SelectorResolver>,
        extractor: Arc<ScopedExtractor>,
        detector: Arc<SessionStateDetector>,
        pacer: Arc<Pacer>,
        waits: WaitConfig,
    ) -> Self {
        Self {
            page,
            resolver,
            extractor,
            detector,
            pacer,
            waits,
        }
    }

    /// Opens the overlay for `item`, extracts detail fields scoped to the
    /// overlay container, and closes it. The caller's list state is intact
    /// when this returns, whatever the outcome.
    ///
    /// `item` must be freshly relocated with no overlay open; callers run
    /// `ensure_closed` before relocation, because dismissing a leftover
    /// overlay can re-render the list and stale every handle taken earlier.
    pub async fn open_detail(&self, item: NodeRef) -> Result<DetailOutcome, ScrapeError> {
        let _ = self.page.scroll_into_view(item).await;
        self.pacer.brief().await;

        let target = self
            .resolver
            .node(item, Namespace::Search, "note_link")
            .await?
            .unwrap_or(item);

        if let Err(err) = self.page.click(target).await {
            tracing::debug!(target: "overlay", error = %err, "standard click failed");
        }

        let mut container = self.wait_for_container(self.waits.activation_grace).await?;
        if container.is_none() {
            tracing::debug!(
                target: "overlay",
                "standard click produced no overlay, forcing synthetic activation"
            );
            self.page
                .evaluate(FORCE_CLICK_SCRIPT, Some(target))
                .await?;
            container = self.wait_for_container(self.waits.overlay_timeout).await?;
        }

        let Some(container) = container else {
            tracing::warn!(
                target: "overlay",
                waited_ms = self.waits.overlay_timeout.as_millis() as u64,
                "detail overlay never appeared"
            );
            self.ensure_closed().await?;
            return Ok(DetailOutcome::Timeout);
        };

        // Opening a detail can itself raise a login prompt; that is a
        // session-level event, not an item-level one.
        if self.detector.check().await? == SessionState::LoggedOut {
            return Err(ScrapeError::SessionLoggedOut);
        }

        if self.is_dead_note().await? {
            tracing::info!(target: "overlay", "note renders an error surface, skipping");
            self.close_overlay(container).await?;
            return Ok(DetailOutcome::Skipped);
        }

        self.pacer.brief().await;

        let record = self.extractor.extract(container, &DETAIL_FIELDS).await?;
        let mut fields = Self::into_fields(record);

        // The overlay rewrites the address bar to the note's own URL.
        if let Ok(url) = self.page.current_url().await {
            if url.contains("/explore/") {
                fields.detail_url = Some(url);
            }
        }

        self.close_overlay(container).await?;
        Ok(DetailOutcome::Extracted(fields))
    }

    async fn wait_for_container(
        &self,
        timeout: std::time::Duration,
    ) -> Result<Option<NodeRef>, ScrapeError> {
        Ok(wait_for_field(
            &self.resolver,
            NodeRef::DOCUMENT,
            Namespace::NoteDetail,
            "container",
            timeout,
            self.waits.poll_interval,
        )
        .await?)
    }

    async fn is_dead_note(&self) -> Result<bool, ScrapeError> {
        let body = self.page.text(NodeRef::DOCUMENT).await.unwrap_or_default();
        Ok(DEAD_NOTE_MARKERS.iter().any(|marker| body.contains(marker)))
    }

    async fn close_overlay(&self, container: NodeRef) -> Result<(), ScrapeError> {
        self.page.dispatch_key("Escape").await?;
        if self.wait_gone().await? {
            return Ok(());
        }

        tracing::debug!(
            target: "overlay",
            "escape dismissal did not take, clicking the close control"
        );
        if let Some(close) = self
            .resolver
            .node(container, Namespace::NoteDetail, "close_button")
            .await?
        {
            let _ = self.page.click(close).await;
            if self.wait_gone().await? {
                return Ok(());
            }
        }

        // Never fall back to history navigation here: going back discards
        // the in-memory search state and the whole run with it.
        tracing::warn!(target: "overlay", "overlay still present after close attempts");
        Ok(())
    }

    /// Dismisses any overlay left behind by an interrupted attempt. A
    /// leftover would swallow the next activation click.
    pub async fn ensure_closed(&self) -> Result<(), ScrapeError> {
        if self
            .resolver
            .node(NodeRef::DOCUMENT, Namespace::NoteDetail, "container")
            .await?
            .is_some()
        {
            self.page.dispatch_key("Escape").await?;
            let _ = self.wait_gone().await?;
        }
        Ok(())
    }

    async fn wait_gone(&self) -> Result<bool, ScrapeError> {
        Ok(wait_for_field_gone(
            &self.resolver,
            NodeRef::DOCUMENT,
            Namespace::NoteDetail,
            "container",
            self.waits.dismiss_timeout,
            self.waits.poll_interval,
        )
        .await?)
    }

    fn into_fields(record: ExtractedRecord) -> DetailFields {
        DetailFields {
            detail_url: None,
            title: record.text("title").map(str::to_string),
            content: record.text("content").map(str::to_string),
            like_count: record.count("like_count"),
            collect_count: record.count("collect_count"),
            comment_count: record.count("comment_count"),
            tags: record.tags("tags"),
            publish_time: record.text("publish_time").map(str::to_string),
            author: record.text("author").map(str::to_string),
        }
    }
}

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::time::sleep;

use crate::browser::pacing::Pacer;
use crate::browser::surface::{BrowserPage, NodeRef};
use crate::browser::wait::wait_for_field;
use crate::config::AppConfig;
use crate::domain::{
    DetailStatus, ListItemHandle, RunReport, ScrapedNote, SearchSort, SessionState,
};
use crate::error::ScrapeError;
use crate::extract::overlay::{DetailFields, DetailOutcome, OverlayNavigator};
use crate::extract::relocate::{canonical_key, ListRelocator};
use crate::extract::scoped::ScopedExtractor;
use crate::infrastructure::supervisor::Interrupt;
use crate::selectors::resolver::SelectorResolver;
use crate::selectors::table::{Namespace, SelectorTable};
use crate::session::detector::SessionStateDetector;
use crate::session::login::{wait_for_manual_login, LoginWaitOutcome};

enum ItemResolution {
    Done(Option<DetailFields>, DetailStatus),
    CancelRun,
}

/// Drives the end-to-end loop: search surface → list collection → per-item
/// detail via the overlay navigator and relocator → aggregation.
///
/// Items are processed strictly sequentially; all operations against the
/// page are causally ordered because interleaved overlay state would break
/// every assumption the navigator and relocator make about the DOM.
pub struct ExtractionOrchestrator {
    page: Arc<dyn BrowserPage>,
    config: Arc<AppConfig>,
    resolver: Arc<SelectorResolver>,
    extractor: Arc<ScopedExtractor>,
    detector: Arc<SessionStateDetector>,
    navigator: OverlayNavigator,
    relocator: ListRelocator,
    pacer: Arc<Pacer>,
}

impl ExtractionOrchestrator {
    pub fn new(
        page: Arc<dyn BrowserPage>,
        table: Arc<SelectorTable>,
        config: Arc<AppConfig>,
    ) -> Self {
        let resolver = Arc::new(SelectorResolver::new(page.clone(), table));
        let extractor = Arc::new(ScopedExtractor::new(resolver.clone()));
        let detector = Arc::new(SessionStateDetector::new(
            page.clone(),
            resolver.clone(),
            config.session.clone(),
            config.urls.home.clone(),
        ));
        let pacer = Arc::new(Pacer::new(config.pacing.clone()));
        let navigator = OverlayNavigator::new(
            page.clone(),
            resolver.clone(),
            extractor.clone(),
            detector.clone(),
            pacer.clone(),
            config.waits.clone(),
        );
        let relocator = ListRelocator::new(
            page.clone(),
            resolver.clone(),
            extractor.clone(),
            config.urls.base.clone(),
        );
        Self {
            page,
            config,
            resolver,
            extractor,
            detector,
            navigator,
            relocator,
            pacer,
        }
    }

    pub fn resolver(&self) -> &Arc<SelectorResolver> {
        &self.resolver
    }

    /// Runs one keyword end to end and returns the aggregated report. One
    /// `ScrapedNote` per collected item, stable keys unique within the run,
    /// `detail_status` always set. Item-level failures skip and continue;
    /// a logout suspends into the manual-login wait; cancellation marks the
    /// remaining items skipped and returns what was gathered.
    pub async fn run(
        &self,
        keyword: &str,
        count: usize,
        sort: SearchSort,
        interrupt: &mut Interrupt,
    ) -> Result<RunReport, ScrapeError> {
        let started_at = Utc::now();
        let target = count.clamp(1, self.config.scrape.max_count);
        tracing::info!(
            target: "orchestrator",
            keyword,
            count = target,
            sort = sort.label(),
            "starting extraction run"
        );

        self.page.navigate(&self.config.urls.home).await?;
        self.pacer.page_load().await;
        self.assure_session(interrupt).await?;

        let search_url = self.config.urls.search_url(keyword);
        self.page.navigate(&search_url).await?;
        self.pacer.page_load().await;
        // The search surface raises its own login prompt independently of
        // the home surface.
        self.assure_session(interrupt).await?;

        self.apply_filters(sort).await?;

        let handles = self.collect_list(target).await?;
        tracing::info!(
            target: "orchestrator",
            collected = handles.len(),
            "list collection finished"
        );

        let mut notes: Vec<ScrapedNote> = Vec::with_capacity(handles.len());
        let mut cancelled = false;
        let total = handles.len();
        for (index, handle) in handles.into_iter().enumerate() {
            if cancelled || interrupt.is_cancelled() {
                notes.push(self.merge(handle, None, DetailStatus::Skipped));
                continue;
            }

            tracing::info!(
                target: "orchestrator",
                item = index + 1,
                total,
                key = %handle.key,
                "scraping detail"
            );
            self.pacer.scrape().await;

            match self.scrape_item(&handle, interrupt).await? {
                ItemResolution::Done(fields, status) => {
                    notes.push(self.merge(handle, fields, status));
                }
                ItemResolution::CancelRun => {
                    cancelled = true;
                    notes.push(self.merge(handle, None, DetailStatus::Skipped));
                }
            }
        }

        let summary = RunReport::summarize(&notes);
        tracing::info!(
            target: "orchestrator",
            ok = summary.ok,
            timeout = summary.timeout,
            not_found = summary.not_found,
            skipped = summary.skipped,
            "run finished"
        );

        Ok(RunReport {
            keyword: keyword.to_string(),
            started_at,
            finished_at: Utc::now(),
            notes,
            summary,
        })
    }

    async fn scrape_item(
        &self,
        handle: &ListItemHandle,
        interrupt: &mut Interrupt,
    ) -> Result<ItemResolution, ScrapeError> {
        let mut attempts: u32 = 0;
        loop {
            // Clear any leftover overlay before relocating: dismissal can
            // re-render the list, which would stale the handle we are about
            // to acquire.
            self.navigator.ensure_closed().await?;

            let Some(node) = self.relocator.relocate(&handle.key).await? else {
                tracing::warn!(
                    target: "orchestrator",
                    key = %handle.key,
                    "item no longer present in the list, skipping"
                );
                return Ok(ItemResolution::Done(None, DetailStatus::NotFound));
            };

            match self.navigator.open_detail(node).await {
                Ok(DetailOutcome::Extracted(fields)) => {
                    return Ok(ItemResolution::Done(Some(fields), DetailStatus::Ok));
                }
                Ok(DetailOutcome::Skipped) => {
                    return Ok(ItemResolution::Done(None, DetailStatus::Skipped));
                }
                Ok(DetailOutcome::Timeout) => {
                    attempts += 1;
                    if attempts >= self.config.retry.detail_attempts {
                        tracing::warn!(
                            target: "orchestrator",
                            key = %handle.key,
                            attempts,
                            "detail overlay timed out, recorded for a later re-run"
                        );
                        return Ok(ItemResolution::Done(None, DetailStatus::Timeout));
                    }
                    tracing::info!(
                        target: "orchestrator",
                        key = %handle.key,
                        attempt = attempts,
                        "retrying detail after timeout"
                    );
                    sleep(self.config.retry.backoff).await;
                }
                Err(ScrapeError::SessionLoggedOut) => {
                    tracing::warn!(
                        target: "orchestrator",
                        key = %handle.key,
                        "login prompt interrupted the run, suspending"
                    );
                    match wait_for_manual_login(
                        &self.detector,
                        interrupt,
                        self.config.session.login_poll_interval,
                        self.config.session.login_nudge_every,
                    )
                    .await?
                    {
                        // The interrupted attempt is not counted against the
                        // retry budget.
                        LoginWaitOutcome::Authenticated => continue,
                        LoginWaitOutcome::Cancelled => return Ok(ItemResolution::CancelRun),
                    }
                }
                Err(ScrapeError::NotFound { what }) => {
                    tracing::warn!(
                        target: "orchestrator",
                        key = %handle.key,
                        what = %what,
                        "detail scope vanished mid-extraction, skipping item"
                    );
                    return Ok(ItemResolution::Done(None, DetailStatus::NotFound));
                }
                Err(ScrapeError::Browser(err)) => {
                    tracing::error!(
                        target: "orchestrator",
                        key = %handle.key,
                        error = %err,
                        "browser failure during detail scrape, skipping item"
                    );
                    return Ok(ItemResolution::Done(None, DetailStatus::Skipped));
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// Collects unique list handles, scrolling in bounded rounds until the
    /// target count or the round budget runs out. Identity is the canonical
    /// link path; a handle is never emitted twice.
    async fn collect_list(&self, target: usize) -> Result<Vec<ListItemHandle>, ScrapeError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut handles: Vec<ListItemHandle> = Vec::new();
        let mut rounds = 0usize;

        loop {
            let items = self
                .resolver
                .nodes(NodeRef::DOCUMENT, Namespace::Search, "note_item")
                .await?;
            for item in items {
                if handles.len() >= target {
                    break;
                }
                let Some(href) = self
                    .extractor
                    .link_href(item, Namespace::Search, "note_link")
                    .await?
                else {
                    continue;
                };
                let Some(key) = canonical_key(&href, &self.config.urls.base) else {
                    continue;
                };
                if !seen.insert(key.clone()) {
                    continue;
                }
                let title = self
                    .extractor
                    .text(item, Namespace::Search, "note_title")
                    .await?
                    .unwrap_or_default();
                let like_count = self
                    .extractor
                    .count(item, Namespace::Search, "note_like_count")
                    .await?
                    .unwrap_or(0);
                handles.push(ListItemHandle {
                    key,
                    node: item,
                    title,
                    like_count,
                });
            }

            if handles.len() >= target || rounds >= self.config.scrape.max_scroll_rounds {
                break;
            }
            rounds += 1;
            let distance = self.pacer.scroll_distance(500);
            self.page.scroll_by(distance).await?;
            self.page.scroll_by(distance).await?;
            self.pacer.scroll().await;
        }

        if handles.is_empty() {
            tracing::warn!(
                target: "orchestrator",
                "no list items found on the search surface"
            );
        }
        Ok(handles)
    }

    /// Applies sort order and publish-date window through the filter panel.
    /// Best-effort: the panel layout shifts often and a failed filter only
    /// changes result ordering, so every miss downgrades to a warning.
    async fn apply_filters(&self, sort: SearchSort) -> Result<(), ScrapeError> {
        let Some(button) = self
            .resolver
            .node(NodeRef::DOCUMENT, Namespace::Search, "filter_button")
            .await?
        else {
            tracing::warn!(target: "orchestrator", "filter control missing, keeping default order");
            return Ok(());
        };

        // The filter button ignores trusted clicks; only a synthetic event
        // opens the panel.
        self.page
            .evaluate(crate::browser::surface::FORCE_CLICK_SCRIPT, Some(button))
            .await?;
        self.pacer.brief().await;

        let Some(panel) = wait_for_field(
            &self.resolver,
            NodeRef::DOCUMENT,
            Namespace::Search,
            "filter_panel",
            self.config.waits.selector_timeout,
            self.config.waits.poll_interval,
        )
        .await?
        else {
            tracing::warn!(target: "orchestrator", "filter panel did not open, keeping default order");
            return Ok(());
        };

        let mut sort_applied = false;
        let mut date_applied = false;
        let date_label = self.config.scrape.date_window.clone();
        let options = self
            .resolver
            .nodes(panel, Namespace::Search, "filter_option")
            .await?;
        for option in options {
            let text = self.page.text(option).await?;
            let text = text.trim();
            if !sort_applied && text == sort.label() {
                self.page.click(option).await?;
                sort_applied = true;
            } else if !date_applied && text == date_label {
                self.page.click(option).await?;
                date_applied = true;
            }
        }

        if sort_applied {
            tracing::info!(target: "orchestrator", sort = sort.label(), "sort order applied");
        } else {
            tracing::warn!(target: "orchestrator", sort = sort.label(), "sort option not found");
        }
        if !date_applied {
            tracing::warn!(target: "orchestrator", window = %date_label, "date window option not found");
        }

        // The result list reloads once filters land.
        self.pacer.action().await;
        Ok(())
    }

    async fn assure_session(&self, interrupt: &mut Interrupt) -> Result<(), ScrapeError> {
        match self.detector.check().await? {
            SessionState::LoggedIn => Ok(()),
            SessionState::Unknown => {
                tracing::debug!(
                    target: "session",
                    "session state unconfirmed, re-checking after the next navigation"
                );
                Ok(())
            }
            SessionState::LoggedOut => {
                match wait_for_manual_login(
                    &self.detector,
                    interrupt,
                    self.config.session.login_poll_interval,
                    self.config.session.login_nudge_every,
                )
                .await?
                {
                    LoginWaitOutcome::Authenticated => Ok(()),
                    LoginWaitOutcome::Cancelled => Err(ScrapeError::Cancelled),
                }
            }
        }
    }

    fn merge(
        &self,
        handle: ListItemHandle,
        fields: Option<DetailFields>,
        status: DetailStatus,
    ) -> ScrapedNote {
        let fields = fields.unwrap_or_default();
        ScrapedNote {
            title: fields
                .title
                .filter(|title| !title.is_empty())
                .unwrap_or(handle.title),
            url: format!("{}{}", self.config.urls.base, handle.key),
            like_count: fields.like_count.unwrap_or(handle.like_count),
            content: fields.content,
            tags: fields.tags,
            collect_count: fields.collect_count,
            comment_count: fields.comment_count,
            publish_time: fields.publish_time,
            author: fields.author,
            detail_url: fields.detail_url,
            detail_status: status,
            scraped_at: Utc::now(),
        }
    }
}

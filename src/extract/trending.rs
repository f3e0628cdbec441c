use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::browser::pacing::Pacer;
use crate::browser::surface::{BrowserPage, NodeRef};
use crate::browser::wait::wait_for_field;
use crate::config::AppConfig;
use crate::domain::{TrendingSource, TrendingTopic};
use crate::error::ScrapeError;
use crate::extract::scoped::ScopedExtractor;
use crate::selectors::resolver::SelectorResolver;
use crate::selectors::table::Namespace;

static HASHTAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([\p{Han}A-Za-z0-9]{2,15})").expect("valid hashtag regex"));

const FEED_SCAN_ROUNDS: usize = 8;

/// Collects trending topics through layered strategies: the hot-search list
/// the search box reveals on focus, then explore-page topic cards, then —
/// as the fallback that always yields something — frequency analysis of
/// hashtags in the home feed.
pub struct TrendingScraper {
    page: Arc<dyn BrowserPage>,
    config: Arc<AppConfig>,
    resolver: Arc<SelectorResolver>,
    extractor: Arc<ScopedExtractor>,
    pacer: Arc<Pacer>,
}

impl TrendingScraper {
    pub fn new(
        page: Arc<dyn BrowserPage>,
        config: Arc<AppConfig>,
        resolver: Arc<SelectorResolver>,
        extractor: Arc<ScopedExtractor>,
        pacer: Arc<Pacer>,
    ) -> Self {
        Self {
            page,
            config,
            resolver,
            extractor,
            pacer,
        }
    }

    pub async fn collect(&self, limit: usize) -> Result<Vec<TrendingTopic>, ScrapeError> {
        let mut topics: Vec<TrendingTopic> = Vec::new();

        match self.hot_search(limit).await {
            Ok(found) => {
                tracing::info!(target: "trending", count = found.len(), "hot-search topics collected");
                topics.extend(found);
            }
            Err(err) => {
                tracing::warn!(target: "trending", error = %err, "hot-search strategy failed");
            }
        }

        if topics.len() < limit {
            match self.explore_topics(limit - topics.len()).await {
                Ok(found) => {
                    tracing::info!(target: "trending", count = found.len(), "explore topics collected");
                    topics.extend(found);
                }
                Err(err) => {
                    tracing::warn!(target: "trending", error = %err, "explore strategy failed");
                }
            }
        }

        if topics.len() < limit {
            let found = self.feed_analysis(limit - topics.len()).await?;
            tracing::info!(target: "trending", count = found.len(), "feed-analysis topics collected");
            topics.extend(found);
        }

        Ok(dedupe_by_name(topics, limit))
    }

    async fn hot_search(&self, limit: usize) -> Result<Vec<TrendingTopic>, ScrapeError> {
        self.page.navigate(&self.config.urls.home).await?;
        self.pacer.page_load().await;

        let Some(input) = wait_for_field(
            &self.resolver,
            NodeRef::DOCUMENT,
            Namespace::Search,
            "search_input",
            self.config.waits.selector_timeout,
            self.config.waits.poll_interval,
        )
        .await?
        else {
            return Ok(Vec::new());
        };

        // Focusing the search box is what reveals the hot-search list.
        self.page.click(input).await?;
        self.pacer.brief().await;

        let mut topics = Vec::new();
        let items = self
            .resolver
            .nodes(NodeRef::DOCUMENT, Namespace::Trending, "hot_item")
            .await?;
        for item in items {
            if topics.len() >= limit {
                break;
            }
            let Some(name) = self
                .extractor
                .text(item, Namespace::Trending, "hot_name")
                .await?
            else {
                continue;
            };
            if name.chars().count() < 2 {
                continue;
            }
            let rank = self
                .extractor
                .text(item, Namespace::Trending, "hot_rank")
                .await?;
            let heat = self
                .extractor
                .count(item, Namespace::Trending, "hot_heat")
                .await?
                .unwrap_or(0);
            topics.push(TrendingTopic {
                name: name.trim().to_string(),
                heat,
                rank,
                url: None,
                source: TrendingSource::HotSearch,
            });
        }
        Ok(topics)
    }

    async fn explore_topics(&self, limit: usize) -> Result<Vec<TrendingTopic>, ScrapeError> {
        self.page.navigate(&self.config.urls.explore).await?;
        self.pacer.page_load().await;

        let mut topics = Vec::new();
        let cards = self
            .resolver
            .nodes(NodeRef::DOCUMENT, Namespace::Explore, "topic_card")
            .await?;
        for card in cards {
            if topics.len() >= limit {
                break;
            }
            let Some(name) = self
                .extractor
                .text(card, Namespace::Explore, "topic_name")
                .await?
            else {
                continue;
            };
            let heat = self
                .extractor
                .count(card, Namespace::Explore, "topic_view_count")
                .await?
                .unwrap_or(0);
            let url = self
                .extractor
                .link_href(card, Namespace::Explore, "topic_link")
                .await?;
            topics.push(TrendingTopic {
                name: name.trim().trim_start_matches('#').to_string(),
                heat,
                rank: None,
                url,
                source: TrendingSource::ExplorePage,
            });
        }
        Ok(topics)
    }

    /// Counts hashtag occurrences across several scroll rounds of the home
    /// feed. Heat is estimated from frequency; there is no official number
    /// to read on this surface.
    async fn feed_analysis(&self, limit: usize) -> Result<Vec<TrendingTopic>, ScrapeError> {
        self.page.navigate(&self.config.urls.home).await?;
        self.pacer.page_load().await;

        let mut counter: HashMap<String, u64> = HashMap::new();
        for round in 0..FEED_SCAN_ROUNDS {
            let tags = self
                .resolver
                .values(NodeRef::DOCUMENT, Namespace::Explore, "feed_hashtag")
                .await?;
            for tag in tags {
                let name = tag.trim().trim_start_matches('#').to_string();
                let len = name.chars().count();
                if (2..=20).contains(&len) {
                    *counter.entry(name).or_insert(0) += 1;
                }
            }

            let texts = self
                .resolver
                .values(NodeRef::DOCUMENT, Namespace::Explore, "feed_note_text")
                .await?;
            for text in texts {
                for capture in HASHTAG.captures_iter(&text) {
                    if let Some(name) = capture.get(1) {
                        *counter.entry(name.as_str().to_string()).or_insert(0) += 1;
                    }
                }
            }

            let distance = self.pacer.scroll_distance(600);
            self.page.scroll_by(distance).await?;
            self.page.scroll_by(distance).await?;
            self.pacer.scroll().await;

            tracing::debug!(
                target: "trending",
                round = round + 1,
                rounds = FEED_SCAN_ROUNDS,
                discovered = counter.len(),
                "feed scan round finished"
            );
        }

        let mut ranked: Vec<(String, u64)> = counter.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(name, frequency)| TrendingTopic {
                name,
                // Frequency-derived estimate, comparable only within this
                // strategy.
                heat: frequency * 100,
                rank: None,
                url: None,
                source: TrendingSource::FeedAnalysis,
            })
            .collect())
    }
}

fn dedupe_by_name(topics: Vec<TrendingTopic>, limit: usize) -> Vec<TrendingTopic> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();
    for topic in topics {
        if seen.insert(topic.name.clone()) {
            unique.push(topic);
        }
        if unique.len() >= limit {
            break;
        }
    }
    unique
}

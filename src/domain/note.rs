use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::browser::surface::NodeRef;

/// One entry of the search result list, identified by its canonical resource
/// path. The `node` reference is disposable: the list may re-render at any
/// time, after which it must be re-acquired through the relocator. The key
/// never changes once assigned.
#[derive(Debug, Clone)]
pub struct ListItemHandle {
    pub key: String,
    pub node: NodeRef,
    pub title: String,
    pub like_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailStatus {
    Ok,
    Timeout,
    NotFound,
    Skipped,
}

/// Aggregate record emitted to the persistence layer, one per source item.
/// List-level fields are always present; detail-level fields are `None`
/// unless the overlay scrape succeeded. Immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedNote {
    pub title: String,
    pub url: String,
    pub like_count: u64,
    pub content: Option<String>,
    pub tags: Vec<String>,
    pub collect_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub publish_time: Option<String>,
    pub author: Option<String>,
    pub detail_url: Option<String>,
    pub detail_status: DetailStatus,
    pub scraped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ok: usize,
    pub timeout: usize,
    pub not_found: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub keyword: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub notes: Vec<ScrapedNote>,
    pub summary: RunSummary,
}

impl RunReport {
    pub fn summarize(notes: &[ScrapedNote]) -> RunSummary {
        let mut summary = RunSummary::default();
        for note in notes {
            match note.detail_status {
                DetailStatus::Ok => summary.ok += 1,
                DetailStatus::Timeout => summary.timeout += 1,
                DetailStatus::NotFound => summary.not_found += 1,
                DetailStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}

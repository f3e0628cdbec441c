use serde::{Deserialize, Serialize};

/// Login state derived from page signals. `Unknown` means no signal either
/// way; callers re-check after the next navigation instead of guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unknown,
    LoggedOut,
    LoggedIn,
}

/// Sort order applied through the search filter panel. Labels are the exact
/// visible option texts on the filter surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchSort {
    Comprehensive,
    #[default]
    MostLiked,
    Newest,
    MostComments,
    MostCollected,
}

impl SearchSort {
    pub fn label(&self) -> &'static str {
        match self {
            SearchSort::Comprehensive => "综合",
            SearchSort::MostLiked => "最多点赞",
            SearchSort::Newest => "最新",
            SearchSort::MostComments => "最多评论",
            SearchSort::MostCollected => "最多收藏",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendingSource {
    HotSearch,
    ExplorePage,
    FeedAnalysis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingTopic {
    pub name: String,
    pub heat: u64,
    pub rank: Option<String>,
    pub url: Option<String>,
    pub source: TrendingSource,
}

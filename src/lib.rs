pub mod browser;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod infrastructure;
pub mod quality;
pub mod selectors;
pub mod session;

pub use browser::{BrowserError, BrowserPage, Cookie, NodeRef};
pub use config::{load_config, AppConfig};
pub use domain::{
    DetailStatus, ListItemHandle, RunReport, RunSummary, ScrapedNote, SearchSort, SessionState,
    TrendingTopic,
};
pub use error::ScrapeError;
pub use extract::{ExtractionOrchestrator, TrendingScraper};
pub use infrastructure::{Interrupt, Supervisor};
pub use quality::{ContentQualityEngine, QualityReport, RuleSet};
pub use selectors::{SelectorResolver, SelectorTable};
pub use session::SessionStateDetector;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub urls: UrlConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub resources: ResourceConfig,
    pub pacing: PacingConfig,
    pub waits: WaitConfig,
    pub scrape: ScrapeConfig,
    pub session: SessionConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone)]
pub struct UrlConfig {
    pub base: String,
    pub home: String,
    pub explore: String,
    pub search_template: String,
}

impl UrlConfig {
    pub fn search_url(&self, keyword: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(keyword.as_bytes()).collect();
        self.search_template.replace("{keyword}", &encoded)
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub profile_dir: String,
    pub output_dir: String,
    pub logs_dir: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

/// Paths of the data files driving runtime behavior. `None` falls back to
/// the compiled-in defaults.
#[derive(Debug, Clone, Default)]
pub struct ResourceConfig {
    pub selectors_file: Option<PathBuf>,
    pub quality_rules_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
pub struct DelayWindow {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayWindow {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }
}

#[derive(Debug, Clone)]
pub struct PacingConfig {
    pub page_load: DelayWindow,
    pub action: DelayWindow,
    pub scroll: DelayWindow,
    pub scrape: DelayWindow,
    pub brief: DelayWindow,
}

#[derive(Debug, Clone)]
pub struct WaitConfig {
    pub overlay_timeout: Duration,
    pub activation_grace: Duration,
    pub dismiss_timeout: Duration,
    pub selector_timeout: Duration,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub default_count: usize,
    pub max_count: usize,
    pub max_scroll_rounds: usize,
    pub date_window: String,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub auth_cookie_names: Vec<String>,
    pub login_poll_interval: Duration,
    pub login_nudge_every: u32,
}

/// Item-level retry policy. The default of one attempt means no retry at
/// all; operators opt in deliberately because re-opening overlays costs
/// pacing time and attention from rate limiters.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub detail_attempts: u32,
    pub backoff: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            urls: UrlConfig {
                base: "https://www.xiaohongshu.com".to_string(),
                home: "https://www.xiaohongshu.com".to_string(),
                explore: "https://www.xiaohongshu.com/explore".to_string(),
                search_template:
                    "https://www.xiaohongshu.com/search_result?keyword={keyword}&type=51"
                        .to_string(),
            },
            directories: DirectoryConfig {
                profile_dir: ".browser_profile".to_string(),
                output_dir: "output".to_string(),
                logs_dir: "logs".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            resources: ResourceConfig::default(),
            pacing: PacingConfig {
                page_load: DelayWindow::new(2_000, 4_000),
                action: DelayWindow::new(1_000, 3_000),
                scroll: DelayWindow::new(1_000, 2_000),
                scrape: DelayWindow::new(2_000, 4_000),
                brief: DelayWindow::new(300, 800),
            },
            waits: WaitConfig {
                overlay_timeout: Duration::from_millis(8_000),
                activation_grace: Duration::from_millis(2_000),
                dismiss_timeout: Duration::from_millis(3_000),
                selector_timeout: Duration::from_millis(5_000),
                poll_interval: Duration::from_millis(200),
            },
            scrape: ScrapeConfig {
                default_count: 20,
                max_count: 100,
                max_scroll_rounds: 20,
                date_window: "半年内".to_string(),
            },
            session: SessionConfig {
                auth_cookie_names: vec![
                    "web_session".to_string(),
                    "galaxy_creator_session_id".to_string(),
                    "xsecappid".to_string(),
                    "a1".to_string(),
                ],
                login_poll_interval: Duration::from_secs(3),
                login_nudge_every: 5,
            },
            retry: RetryConfig {
                detail_attempts: 1,
                backoff: Duration::from_millis(2_000),
            },
        }
    }
}

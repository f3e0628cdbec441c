use std::env;
use std::path::PathBuf;
use std::time::Duration;

use super::env::{AppConfig, ConfigError, DelayWindow};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();

        if let Ok(value) = env::var("SCOUT_BASE_URL") {
            config.urls.base = value;
        }
        if let Ok(value) = env::var("SCOUT_HOME_URL") {
            config.urls.home = value;
        }
        if let Ok(value) = env::var("SCOUT_EXPLORE_URL") {
            config.urls.explore = value;
        }
        if let Ok(value) = env::var("SCOUT_SEARCH_TEMPLATE") {
            config.urls.search_template = value;
        }

        if let Ok(value) = env::var("SCOUT_PROFILE_DIR") {
            config.directories.profile_dir = value;
        }
        if let Ok(value) = env::var("SCOUT_OUTPUT_DIR") {
            config.directories.output_dir = value;
        }
        if let Ok(value) = env::var("SCOUT_LOGS_DIR") {
            config.directories.logs_dir = value;
        }
        if let Ok(value) = env::var("SCOUT_LOG_LEVEL") {
            config.logging.level = value;
        }

        config.resources.selectors_file = env::var("SCOUT_SELECTORS_FILE")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        config.resources.quality_rules_file = env::var("SCOUT_QUALITY_RULES_FILE")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        config.pacing.page_load = window("SCOUT_PAGE_LOAD_DELAY_MS", config.pacing.page_load)?;
        config.pacing.action = window("SCOUT_ACTION_DELAY_MS", config.pacing.action)?;
        config.pacing.scroll = window("SCOUT_SCROLL_DELAY_MS", config.pacing.scroll)?;
        config.pacing.scrape = window("SCOUT_SCRAPE_DELAY_MS", config.pacing.scrape)?;

        if let Some(ms) = parse_u64("SCOUT_OVERLAY_TIMEOUT_MS") {
            config.waits.overlay_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_u64("SCOUT_ACTIVATION_GRACE_MS") {
            config.waits.activation_grace = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_u64("SCOUT_DISMISS_TIMEOUT_MS") {
            config.waits.dismiss_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_u64("SCOUT_SELECTOR_TIMEOUT_MS") {
            config.waits.selector_timeout = Duration::from_millis(ms);
        }

        if let Some(count) = parse_usize("SCOUT_DEFAULT_COUNT") {
            config.scrape.default_count = count;
        }
        if let Some(count) = parse_usize("SCOUT_MAX_COUNT") {
            config.scrape.max_count = count;
        }
        if let Some(rounds) = parse_usize("SCOUT_MAX_SCROLL_ROUNDS") {
            config.scrape.max_scroll_rounds = rounds;
        }
        if let Ok(value) = env::var("SCOUT_DATE_WINDOW") {
            if !value.is_empty() {
                config.scrape.date_window = value;
            }
        }

        if let Ok(value) = env::var("SCOUT_AUTH_COOKIES") {
            let names: Vec<String> = value
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect();
            if !names.is_empty() {
                config.session.auth_cookie_names = names;
            }
        }
        if let Some(secs) = parse_u64("SCOUT_LOGIN_POLL_SECS") {
            config.session.login_poll_interval = Duration::from_secs(secs.max(1));
        }

        if let Some(attempts) = parse_u64("SCOUT_DETAIL_ATTEMPTS") {
            config.retry.detail_attempts = (attempts as u32).max(1);
        }
        if let Some(ms) = parse_u64("SCOUT_RETRY_BACKOFF_MS") {
            config.retry.backoff = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

/// Parses a "min,max" millisecond window, keeping the default when unset.
fn window(key: &'static str, default: DelayWindow) -> Result<DelayWindow, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };
    parse_window(&raw).ok_or(ConfigError::Invalid { key, value: raw })
}

pub(super) fn parse_window(raw: &str) -> Option<DelayWindow> {
    let (min, max) = raw.split_once(',')?;
    let min_ms = min.trim().parse::<u64>().ok()?;
    let max_ms = max.trim().parse::<u64>().ok()?;
    if min_ms > max_ms {
        return None;
    }
    Some(DelayWindow::new(min_ms, max_ms))
}

fn parse_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|value| value.parse::<u64>().ok())
}

fn parse_usize(key: &str) -> Option<usize> {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
}

use rand::Rng;
use tokio::time::{sleep, Duration};

use crate::config::PacingConfig;

/// Humanized inter-action delays. Pacing is a politeness control, not a
/// correctness mechanism: no invariant anywhere depends on these values.
#[derive(Debug, Clone)]
pub struct Pacer {
    config: PacingConfig,
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    pub async fn page_load(&self) {
        self.delay(self.config.page_load.min_ms, self.config.page_load.max_ms)
            .await;
    }

    pub async fn action(&self) {
        self.delay(self.config.action.min_ms, self.config.action.max_ms)
            .await;
    }

    pub async fn scroll(&self) {
        self.delay(self.config.scroll.min_ms, self.config.scroll.max_ms)
            .await;
    }

    pub async fn scrape(&self) {
        self.delay(self.config.scrape.min_ms, self.config.scrape.max_ms)
            .await;
    }

    /// Short pause between two tightly coupled gestures, e.g. focus-then-type.
    pub async fn brief(&self) {
        self.delay(self.config.brief.min_ms, self.config.brief.max_ms)
            .await;
    }

    /// Jittered scroll distance around `base`.
    pub fn scroll_distance(&self, base: i64) -> i64 {
        let spread = (base / 5).max(1);
        rand::thread_rng().gen_range(base - spread..=base + spread)
    }

    async fn delay(&self, min_ms: u64, max_ms: u64) {
        let ms = if max_ms > min_ms {
            rand::thread_rng().gen_range(min_ms..=max_ms)
        } else {
            min_ms
        };
        sleep(Duration::from_millis(ms)).await;
    }
}

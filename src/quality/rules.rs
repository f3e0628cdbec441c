use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

const BUILTIN_RULES: &str = include_str!("../../resources/quality_rules.json");

/// On-disk shape of the rubric. Versioned independently of code: thresholds,
/// phrase lists and regex classes all live in data.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSetConfig {
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: u8,
    #[serde(default = "default_warning_penalty")]
    pub warning_penalty: u8,
    #[serde(default = "default_error_penalty")]
    pub error_penalty: u8,
    #[serde(default)]
    pub forbidden_patterns: Vec<String>,
    pub fabrication: FabricationConfig,
    pub emotion: EmotionConfig,
    pub length: LengthConfig,
    pub title: TitleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FabricationConfig {
    pub time_pattern: String,
    pub price_pattern: String,
    pub place_pattern: String,
    pub hearsay_pattern: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmotionConfig {
    pub max_consecutive_exclaims: usize,
    pub max_emoji: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LengthConfig {
    pub soft_min: usize,
    pub soft_max: usize,
    pub hard_min: usize,
    pub hard_max: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TitleConfig {
    pub soft_max_chars: usize,
    pub hard_max_chars: usize,
    pub max_emoji: usize,
    #[serde(default)]
    pub banned_openers: Vec<String>,
}

fn default_pass_threshold() -> u8 {
    60
}
fn default_warning_penalty() -> u8 {
    10
}
fn default_error_penalty() -> u8 {
    30
}

#[derive(Debug, Error)]
pub enum RuleSetError {
    #[error("failed to read rule file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("rule configuration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid {class} pattern: {source}")]
    Pattern {
        class: &'static str,
        source: regex::Error,
    },
}

/// A forbidden phrase. Patterns containing `…` describe a scaffold whose
/// parts must all appear, in any position: 首先…其次…最后 flags text using
/// every segment even when they are sentences apart.
#[derive(Debug, Clone)]
pub enum ForbiddenPattern {
    Literal(String),
    Sequence(Vec<String>),
}

impl ForbiddenPattern {
    fn compile(raw: &str) -> Self {
        if raw.contains('…') {
            let parts: Vec<String> = raw
                .split('…')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect();
            if parts.len() >= 2 {
                return ForbiddenPattern::Sequence(parts);
            }
        }
        ForbiddenPattern::Literal(raw.to_string())
    }

    pub fn display(&self) -> String {
        match self {
            ForbiddenPattern::Literal(text) => text.clone(),
            ForbiddenPattern::Sequence(parts) => parts.join("…"),
        }
    }
}

/// Compiled, immutable rubric. Loaded once; evaluation never mutates it.
#[derive(Debug)]
pub struct RuleSet {
    pub pass_threshold: u8,
    pub warning_penalty: u8,
    pub error_penalty: u8,
    pub forbidden: Vec<ForbiddenPattern>,
    pub time_re: Regex,
    pub price_re: Regex,
    pub place_re: Regex,
    pub hearsay_re: Regex,
    pub max_consecutive_exclaims: usize,
    pub max_emoji: usize,
    pub length: LengthConfig,
    pub title: TitleConfig,
}

impl RuleSet {
    pub fn load(path: &Path) -> Result<Self, RuleSetError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RuleSetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Compiled-in default rubric; infallible by construction.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_RULES).expect("builtin rule set is valid")
    }

    pub fn from_json(raw: &str) -> Result<Self, RuleSetError> {
        let config: RuleSetConfig = serde_json::from_str(raw)?;
        Self::compile(config)
    }

    pub fn compile(config: RuleSetConfig) -> Result<Self, RuleSetError> {
        let compile_re = |class: &'static str, pattern: &str| {
            Regex::new(pattern).map_err(|source| RuleSetError::Pattern { class, source })
        };
        Ok(Self {
            pass_threshold: config.pass_threshold,
            warning_penalty: config.warning_penalty,
            error_penalty: config.error_penalty,
            forbidden: config
                .forbidden_patterns
                .iter()
                .map(|raw| ForbiddenPattern::compile(raw))
                .collect(),
            time_re: compile_re("time", &config.fabrication.time_pattern)?,
            price_re: compile_re("price", &config.fabrication.price_pattern)?,
            place_re: compile_re("place", &config.fabrication.place_pattern)?,
            hearsay_re: compile_re("hearsay", &config.fabrication.hearsay_pattern)?,
            max_consecutive_exclaims: config.emotion.max_consecutive_exclaims,
            max_emoji: config.emotion.max_emoji,
            length: config.length,
            title: config.title,
        })
    }
}

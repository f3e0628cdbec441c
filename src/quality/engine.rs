use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::quality::rules::{ForbiddenPattern, RuleSet};

static EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x{1F300}-\x{1F9FF}\x{2600}-\x{26FF}\x{2700}-\x{27BF}]")
        .expect("valid emoji regex")
});

const SENTENCE_TERMINATORS: [char; 5] = ['。', '！', '？', '!', '?'];
const PAUSE_MARKS: [&str; 3] = ["…", "——", "..."];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleMessage {
    pub rule: String,
    pub message: String,
    pub context: String,
}

impl RuleMessage {
    fn new(rule: &str, message: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
            context: context.into(),
        }
    }
}

/// Outcome of one rubric evaluation. A pure value: identical inputs always
/// produce an identical report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub score: u8,
    pub warnings: Vec<RuleMessage>,
    pub errors: Vec<RuleMessage>,
    pub suggestions: Vec<String>,
}

impl QualityReport {
    /// The publish gate: a threshold met on score alone is not enough,
    /// errors always block.
    pub fn passes(&self, threshold: u8) -> bool {
        self.score >= threshold && self.errors.is_empty()
    }
}

/// Deterministic, rule-driven scorer for a title/body pair. Used both to
/// flag scraped content and as the gate in front of publishing.
pub struct ContentQualityEngine {
    rules: Arc<RuleSet>,
}

impl ContentQualityEngine {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn evaluate(&self, title: &str, content: &str) -> QualityReport {
        evaluate(title, content, &self.rules)
    }
}

/// Scores `content` under `title` against the rubric. Independent checks
/// contribute messages; the score starts at 100, loses a fixed amount per
/// warning and a larger amount per error, and is clamped to [0, 100].
pub fn evaluate(title: &str, content: &str, rules: &RuleSet) -> QualityReport {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();
    let mut suggestions = Vec::new();

    let forbidden_hits = check_forbidden(title, content, rules);
    let fabrication_hits = check_fabrication(content, rules);

    warnings.extend(forbidden_hits.clone());
    warnings.extend(fabrication_hits.clone());
    warnings.extend(check_emotion_density(content, rules));

    match check_length(content, rules) {
        Some((true, message)) => errors.push(message),
        Some((false, message)) => warnings.push(message),
        None => {}
    }

    let (title_warnings, title_errors) = check_title(title, rules);
    warnings.extend(title_warnings);
    errors.extend(title_errors);

    if forbidden_hits.is_empty() {
        suggestions.push("no stock AI phrasing detected, the voice reads natural".to_string());
    }
    if fabrication_hits.is_empty() {
        suggestions.push("no unverifiable factual claims detected".to_string());
    }
    if content.chars().count() > 150 && !PAUSE_MARKS.iter().any(|mark| content.contains(mark)) {
        suggestions
            .push("consider an ellipsis or a dash here and there for pacing".to_string());
    }

    let deductions = warnings.len() as i32 * rules.warning_penalty as i32
        + errors.len() as i32 * rules.error_penalty as i32;
    let score = (100 - deductions).clamp(0, 100) as u8;

    QualityReport {
        score,
        warnings,
        errors,
        suggestions,
    }
}

fn check_forbidden(title: &str, content: &str, rules: &RuleSet) -> Vec<RuleMessage> {
    let full_text = format!("{title} {content}");
    let mut hits = Vec::new();
    for pattern in &rules.forbidden {
        match pattern {
            ForbiddenPattern::Literal(phrase) => {
                if let Some(index) = full_text.find(phrase.as_str()) {
                    hits.push(RuleMessage::new(
                        "ai_pattern",
                        format!("stock phrase \"{phrase}\" reads machine-written"),
                        context_window(&full_text, index, phrase.len()),
                    ));
                }
            }
            ForbiddenPattern::Sequence(parts) => {
                if parts.iter().all(|part| full_text.contains(part.as_str())) {
                    hits.push(RuleMessage::new(
                        "ai_pattern",
                        format!(
                            "scaffold \"{}\" reads machine-written",
                            pattern.display()
                        ),
                        pattern.display(),
                    ));
                }
            }
        }
    }
    hits
}

fn check_fabrication(content: &str, rules: &RuleSet) -> Vec<RuleMessage> {
    let mut hits = Vec::new();
    let classes: [(&str, &Regex); 4] = [
        ("time", &rules.time_re),
        ("price", &rules.price_re),
        ("place", &rules.place_re),
        ("hearsay", &rules.hearsay_re),
    ];
    for (class, regex) in classes {
        for found in regex.find_iter(content) {
            hits.push(RuleMessage::new(
                "fabrication_risk",
                format!(
                    "concrete {class} claim \"{}\" is high-risk unless user-provided, flag for review",
                    found.as_str().trim()
                ),
                context_window(content, found.start(), found.len()),
            ));
        }
    }
    hits
}

fn check_emotion_density(content: &str, rules: &RuleSet) -> Vec<RuleMessage> {
    let mut hits = Vec::new();

    let mut consecutive = 0usize;
    for sentence in split_sentences(content) {
        if sentence.exclamatory {
            consecutive += 1;
        } else {
            consecutive = 0;
        }
        if consecutive > rules.max_consecutive_exclaims {
            hits.push(RuleMessage::new(
                "emotion_density",
                format!(
                    "{consecutive} exclamatory sentences in a row, break the run with plain narration"
                ),
                sentence.text.chars().take(30).collect::<String>(),
            ));
        }
    }

    let emoji_count = EMOJI.find_iter(content).count();
    if emoji_count > rules.max_emoji {
        hits.push(RuleMessage::new(
            "emotion_density",
            format!(
                "{emoji_count} emoji in the body, more than {} starts to look staged",
                rules.max_emoji
            ),
            String::new(),
        ));
    }

    hits
}

/// `Some((is_error, message))` when the body falls outside the configured
/// bands; the hard band yields an error, the soft band a warning.
fn check_length(content: &str, rules: &RuleSet) -> Option<(bool, RuleMessage)> {
    let chars = content.chars().count();
    let bounds = &rules.length;

    if chars < bounds.hard_min {
        return Some((
            true,
            RuleMessage::new(
                "length",
                format!("body is {chars} chars, below the publishable minimum of {}", bounds.hard_min),
                String::new(),
            ),
        ));
    }
    if chars > bounds.hard_max {
        return Some((
            true,
            RuleMessage::new(
                "length",
                format!("body is {chars} chars, beyond the hard cap of {}", bounds.hard_max),
                String::new(),
            ),
        ));
    }
    if chars < bounds.soft_min {
        return Some((
            false,
            RuleMessage::new(
                "length",
                format!(
                    "body is {chars} chars, thin for this format, aim for {}-{}",
                    bounds.soft_min, bounds.soft_max
                ),
                String::new(),
            ),
        ));
    }
    if chars > bounds.soft_max {
        return Some((
            false,
            RuleMessage::new(
                "length",
                format!(
                    "body is {chars} chars, heavy for phone reading, aim for {}-{}",
                    bounds.soft_min, bounds.soft_max
                ),
                String::new(),
            ),
        ));
    }
    None
}

fn check_title(title: &str, rules: &RuleSet) -> (Vec<RuleMessage>, Vec<RuleMessage>) {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();
    let chars = title.chars().count();
    let bounds = &rules.title;

    if chars == 0 {
        errors.push(RuleMessage::new("title", "title is empty", String::new()));
        return (warnings, errors);
    }
    if chars > bounds.hard_max_chars {
        errors.push(RuleMessage::new(
            "title",
            format!("title is {chars} chars, beyond the hard cap of {}", bounds.hard_max_chars),
            String::new(),
        ));
    } else if chars > bounds.soft_max_chars {
        warnings.push(RuleMessage::new(
            "title",
            format!("title is {chars} chars, keep it within {}", bounds.soft_max_chars),
            String::new(),
        ));
    }

    for opener in &bounds.banned_openers {
        if title.starts_with(opener.as_str()) {
            warnings.push(RuleMessage::new(
                "title",
                format!("opening with \"{opener}\" is burnt-out clickbait"),
                String::new(),
            ));
        }
    }

    let emoji_count = EMOJI.find_iter(title).count();
    if emoji_count > bounds.max_emoji {
        warnings.push(RuleMessage::new(
            "title",
            format!("{emoji_count} emoji in the title, keep it to 1-2"),
            String::new(),
        ));
    }

    for pattern in &rules.forbidden {
        if let ForbiddenPattern::Literal(phrase) = pattern {
            if title.contains(phrase.as_str()) {
                warnings.push(RuleMessage::new(
                    "title",
                    format!("title reuses the forbidden phrase \"{phrase}\""),
                    String::new(),
                ));
            }
        }
    }

    (warnings, errors)
}

struct Sentence {
    text: String,
    exclamatory: bool,
}

fn split_sentences(content: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in content.chars() {
        if SENTENCE_TERMINATORS.contains(&ch) || ch == '\n' {
            push_sentence(&mut sentences, &mut current, ch);
        } else {
            current.push(ch);
        }
    }
    push_sentence(&mut sentences, &mut current, '\n');
    sentences
}

fn push_sentence(sentences: &mut Vec<Sentence>, current: &mut String, terminator: char) {
    let text = current.trim().to_string();
    current.clear();
    if text.chars().count() <= 2 {
        return;
    }
    let exclamatory = terminator == '！' || terminator == '!' || text.contains("啊啊");
    sentences.push(Sentence { text, exclamatory });
}

/// Snips a readable window around a match without splitting characters.
fn context_window(text: &str, start: usize, len: usize) -> String {
    let mut begin = start;
    for _ in 0..10 {
        if begin == 0 {
            break;
        }
        begin -= 1;
        while begin > 0 && !text.is_char_boundary(begin) {
            begin -= 1;
        }
    }
    let mut end = (start + len).min(text.len());
    for _ in 0..10 {
        if end >= text.len() {
            break;
        }
        end += 1;
        while end < text.len() && !text.is_char_boundary(end) {
            end += 1;
        }
    }
    format!("…{}…", &text[begin..end])
}

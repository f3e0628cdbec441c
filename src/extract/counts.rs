use once_cell::sync::Lazy;
use regex::Regex;

static NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\s+]+").expect("valid noise regex"));

/// Parses interaction-count text into an integer, handling the site's
/// magnitude suffixes: 万/w (ten-thousand), 千/k (thousand), 亿
/// (hundred-million). Unparseable input is 0, never an error; counts are
/// display strings and the site changes them freely.
pub fn parse_count(text: &str) -> u64 {
    let lowered = text.trim().to_lowercase();
    let cleaned = NOISE.replace_all(&lowered, "");
    if cleaned.is_empty() {
        return 0;
    }

    let (body, multiplier) = if let Some(rest) = strip_any(&cleaned, &["万", "w"]) {
        (rest, 10_000f64)
    } else if let Some(rest) = strip_any(&cleaned, &["千", "k"]) {
        (rest, 1_000f64)
    } else if let Some(rest) = strip_any(&cleaned, &["亿"]) {
        (rest, 100_000_000f64)
    } else {
        (cleaned.to_string(), 1f64)
    };

    let digits: String = body
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits
        .parse::<f64>()
        .map(|value| (value * multiplier).round().max(0.0) as u64)
        .unwrap_or(0)
}

fn strip_any(value: &str, suffixes: &[&str]) -> Option<String> {
    for suffix in suffixes {
        if let Some(rest) = value.strip_suffix(suffix) {
            return Some(rest.to_string());
        }
    }
    None
}

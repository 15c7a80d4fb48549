use std::sync::LazyLock;

use regex::Regex;

/// Emergency keyword vocabulary, in reporting order.
pub const RED_FLAG_KEYWORDS: &[&str] = &[
    "chest pain",
    "difficulty breathing",
    "severe headache",
    "unconscious",
    "bleeding",
    "stroke",
    "seizure",
    "severe abdominal pain",
    "vomiting blood",
];

struct RedFlagPattern {
    keyword: &'static str,
    regex: Regex,
}

/// Case-insensitive substring patterns; runs of whitespace between words
/// match a single space in the keyword.
static RED_FLAG_PATTERNS: LazyLock<Vec<RedFlagPattern>> = LazyLock::new(|| {
    RED_FLAG_KEYWORDS
        .iter()
        .filter_map(|&keyword| {
            let body = keyword
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+");
            Regex::new(&format!("(?i){body}"))
                .ok()
                .map(|regex| RedFlagPattern { keyword, regex })
        })
        .collect()
});

/// Keywords found in the symptom list and notes. Empty input yields an
/// empty result.
pub fn detect_red_flags(symptoms: &[String], notes: &str) -> Vec<String> {
    let text = format!("{} {}", symptoms.join(" "), notes);
    if text.trim().is_empty() {
        return Vec::new();
    }

    RED_FLAG_PATTERNS
        .iter()
        .filter(|p| p.regex.is_match(&text))
        .map(|p| p.keyword.to_string())
        .collect()
}

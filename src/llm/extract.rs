use once_cell::sync::Lazy;
use regex::Regex;

const MIN_TAG_LINE_CHARS: usize = 20;

static QUOTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]{10,})""#).expect("valid quoted prompt regex"));

/// Pulls the tag string out of free-form model output.
///
/// A double-quoted run of at least ten characters wins; otherwise the first
/// line that contains a comma and is at least twenty characters long;
/// otherwise the trimmed response.
pub fn extract_prompt(raw: &str) -> String {
    if let Some(quoted) = QUOTED_RE.captures(raw).and_then(|caps| caps.get(1)) {
        return quoted.as_str().trim().to_string();
    }

    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| line.contains(',') && line.chars().count() >= MIN_TAG_LINE_CHARS)
        .map(str::to_string)
        .unwrap_or_else(|| raw.trim().to_string())
}

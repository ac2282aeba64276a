use serde::{Deserialize, Deserializer};
use serde_json::Value;

const FALLBACK_TOP_WORDS: usize = 10;
const FALLBACK_RICHNESS: f64 = 0.5;
const FALLBACK_ERROR: &str = "C library not loaded";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WordFreq {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub freq: u64,
}

/// Word statistics produced by the text analyzer for one input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub total_chars: u64,
    #[serde(default)]
    pub richness: f64,
    #[serde(default)]
    pub top_words: Vec<WordFreq>,
    #[serde(default, deserialize_with = "deserialize_sensitive_flag")]
    pub sensitive_words: bool,
    #[serde(default)]
    pub error: Option<String>,
}

// The analyzer reports either a flag or the list of matched words.
fn deserialize_sensitive_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(flag)) => flag,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Number(number)) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Some(Value::String(text)) => !text.trim().is_empty(),
        _ => false,
    })
}

impl Analysis {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// The `limit` most frequent words, in analyzer order.
    pub fn top_keywords(&self, limit: usize) -> Vec<&str> {
        self.top_words
            .iter()
            .take(limit)
            .map(|entry| entry.word.as_str())
            .collect()
    }
}

pub trait Analyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Analysis;
}

/// Stand-in used when the native analyzer is unavailable: each of the first
/// ten characters, whitespace included, counts once.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackAnalyzer;

impl Analyzer for FallbackAnalyzer {
    fn analyze(&self, text: &str) -> Analysis {
        let top_words = text
            .chars()
            .take(FALLBACK_TOP_WORDS)
            .map(|ch| WordFreq {
                word: ch.to_string(),
                freq: 1,
            })
            .collect();

        Analysis {
            total_chars: text.chars().count() as u64,
            richness: FALLBACK_RICHNESS,
            top_words,
            sensitive_words: false,
            error: Some(FALLBACK_ERROR.to_string()),
        }
    }
}

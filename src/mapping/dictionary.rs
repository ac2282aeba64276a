use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum MappingLoadError {
    #[error("mapping file not found at {0}")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("section '{section}' in {path} is not an object")]
    InvalidSection { path: String, section: String },
}

/// Keyword → comma-joined tag string table that remembers insertion order.
///
/// Overwriting an existing key replaces its value in place, so iteration order
/// is the order in which each key was first inserted.
#[derive(Debug, Clone, Default)]
pub struct TagDictionary {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl TagDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut dictionary = Self::new();
        dictionary.extend(pairs);
        dictionary
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn extend<K, V, I>(&mut self, pairs: I)
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in pairs {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges one section of a JSON overlay file. On any failure the table is
    /// left untouched and the error is logged.
    pub fn apply_overlay(&mut self, path: &Path, section: &str) -> Result<usize, MappingLoadError> {
        match read_overlay_section(path, section) {
            Ok(pairs) => {
                let count = pairs.len();
                self.extend(pairs);
                info!(
                    "Loaded {} '{}' entries from {}",
                    count,
                    section,
                    path.display()
                );
                Ok(count)
            }
            Err(err) => {
                warn!("{}; keeping {} existing entries", err, self.len());
                Err(err)
            }
        }
    }
}

/// Reads the flat string→string object stored under `section`, in file order.
pub fn read_overlay_section(
    path: &Path,
    section: &str,
) -> Result<Vec<(String, String)>, MappingLoadError> {
    let path_label = path.display().to_string();
    if !path.exists() {
        return Err(MappingLoadError::NotFound(path_label));
    }

    let raw = fs::read_to_string(path).map_err(|source| MappingLoadError::Io {
        path: path_label.clone(),
        source,
    })?;
    let document: Value = serde_json::from_str(&raw).map_err(|source| MappingLoadError::Parse {
        path: path_label.clone(),
        source,
    })?;

    let Some(section_value) = document.get(section) else {
        debug!("{} has no '{}' section", path_label, section);
        return Ok(Vec::new());
    };
    let Some(object) = section_value.as_object() else {
        return Err(MappingLoadError::InvalidSection {
            path: path_label,
            section: section.to_string(),
        });
    };

    let mut pairs = Vec::with_capacity(object.len());
    for (key, value) in object {
        match value.as_str() {
            Some(text) => pairs.push((key.clone(), text.to_string())),
            None => debug!("Skipping non-string value for '{}' in {}", key, path_label),
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).expect("create file");
        file.write_all(content.as_bytes()).expect("write file");
        path
    }

    #[test]
    fn overwrite_keeps_first_insertion_position() {
        let mut dictionary = TagDictionary::from_pairs([("a", "1"), ("b", "2")]);
        dictionary.insert("a", "3");
        dictionary.insert("c", "4");

        let entries: Vec<_> = dictionary.iter().collect();
        assert_eq!(entries, vec![("a", "3"), ("b", "2"), ("c", "4")]);
    }

    #[test]
    fn overlay_replaces_values_and_preserves_file_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(
            &dir,
            "main.json",
            r#"{"mappings": {"家": "home, indoor", "猫": "cat", "狗": "dog", "n": 3}}"#,
        );
        let mut dictionary = TagDictionary::from_pairs([("家", "living room")]);

        let loaded = dictionary.apply_overlay(&path, "mappings").expect("overlay loads");

        assert_eq!(loaded, 3);
        assert_eq!(dictionary.get("家"), Some("home, indoor"));
        let keys: Vec<_> = dictionary.keys().collect();
        assert_eq!(keys, vec!["家", "猫", "狗"]);
    }

    #[test]
    fn missing_file_keeps_existing_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut dictionary = TagDictionary::from_pairs([("家", "living room")]);

        let result = dictionary.apply_overlay(&dir.path().join("absent.json"), "mappings");

        assert!(matches!(result, Err(MappingLoadError::NotFound(_))));
        assert_eq!(dictionary.len(), 1);
    }

    #[test]
    fn malformed_json_keeps_existing_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(&dir, "broken.json", r#"{"mappings": {"家": "#);
        let mut dictionary = TagDictionary::from_pairs([("家", "living room")]);

        let result = dictionary.apply_overlay(&path, "mappings");

        assert!(matches!(result, Err(MappingLoadError::Parse { .. })));
        assert_eq!(dictionary.get("家"), Some("living room"));
    }

    #[test]
    fn missing_section_loads_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(&dir, "styles_only.json", r#"{"styles": {"x": "y"}}"#);
        let mut dictionary = TagDictionary::new();

        assert_eq!(dictionary.apply_overlay(&path, "mappings").unwrap(), 0);
        assert!(dictionary.is_empty());
    }

    #[test]
    fn non_object_section_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(&dir, "list.json", r#"{"mappings": ["a", "b"]}"#);

        let result = read_overlay_section(&path, "mappings");

        assert!(matches!(result, Err(MappingLoadError::InvalidSection { .. })));
    }
}

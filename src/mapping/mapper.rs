use std::collections::HashSet;
use std::path::PathBuf;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::config::MappingPaths;
use crate::mapping::defaults::{default_styles, default_tag_mappings, ANIME_STYLE, DEFAULT_STYLE};
use crate::mapping::dictionary::TagDictionary;

pub const MAPPINGS_SECTION: &str = "mappings";
pub const STYLES_SECTION: &str = "styles";

/// Optional tag sets merged into the keyword table on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overlay {
    Anime,
}

impl Overlay {
    /// The overlay a style depends on, if any.
    pub fn for_style(style_name: &str) -> Option<Overlay> {
        if style_name == ANIME_STYLE {
            Some(Overlay::Anime)
        } else {
            None
        }
    }
}

/// Maps extracted keywords and style names to English visual tags.
pub struct VisualMapper {
    mappings: RwLock<TagDictionary>,
    styles: TagDictionary,
    anime_mappings_path: PathBuf,
    loaded_overlays: Mutex<HashSet<Overlay>>,
}

impl VisualMapper {
    /// Builds the mapper from the built-in tables overlaid with the main
    /// mapping file and, when configured, the styles file. Missing or broken
    /// files are logged and skipped.
    pub fn new(paths: &MappingPaths) -> Self {
        let mut mappings = default_tag_mappings();
        let _ = mappings.apply_overlay(&paths.mappings, MAPPINGS_SECTION);

        let mut styles = default_styles();
        if let Some(styles_path) = &paths.styles {
            let _ = styles.apply_overlay(styles_path, STYLES_SECTION);
        }

        Self::from_parts(mappings, styles, paths.anime_mappings.clone())
    }

    pub fn from_parts(
        mappings: TagDictionary,
        styles: TagDictionary,
        anime_mappings_path: PathBuf,
    ) -> Self {
        info!(
            "Visual mapper ready with {} keyword mappings and {} styles",
            mappings.len(),
            styles.len()
        );
        VisualMapper {
            mappings: RwLock::new(mappings),
            styles,
            anime_mappings_path,
            loaded_overlays: Mutex::new(HashSet::new()),
        }
    }

    /// Merges an overlay into the keyword table at most once. Concurrent
    /// callers block on the same lock until the first load finishes; a failed
    /// load is recorded too and not retried.
    pub fn ensure_loaded(&self, overlay: Overlay) {
        let mut loaded = self.loaded_overlays.lock();
        if loaded.contains(&overlay) {
            return;
        }

        let path = match overlay {
            Overlay::Anime => &self.anime_mappings_path,
        };
        let _ = self.mappings.write().apply_overlay(path, MAPPINGS_SECTION);
        loaded.insert(overlay);
    }

    pub fn is_loaded(&self, overlay: Overlay) -> bool {
        self.loaded_overlays.lock().contains(&overlay)
    }

    /// Resolves keywords to a de-duplicated tag list.
    ///
    /// Each keyword is looked up exactly first, then by the first table key
    /// (in insertion order) contained in the keyword. Unmatched keywords and
    /// keywords resolving to an empty tag string are dropped.
    pub fn map_keywords<S: AsRef<str>>(&self, keywords: &[S]) -> Vec<String> {
        let mappings = self.mappings.read();
        let mut visual_tags = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for keyword in keywords {
            let keyword = keyword.as_ref();
            if keyword.is_empty() {
                continue;
            }

            // An empty exact value counts as a miss; the first contained key
            // ends the search even when its value is empty.
            let matched = mappings
                .get(keyword)
                .filter(|value| !value.is_empty())
                .or_else(|| {
                    mappings
                        .iter()
                        .find(|(key, _)| keyword.contains(key))
                        .map(|(key, value)| {
                            debug!("Keyword '{}' matched mapping '{}' by substring", keyword, key);
                            value
                        })
                });

            let Some(tag_string) = matched.filter(|value| !value.is_empty()) else {
                continue;
            };

            for tag in tag_string.split(',').map(str::trim) {
                if seen.insert(tag.to_string()) {
                    visual_tags.push(tag.to_string());
                }
            }
        }

        visual_tags
    }

    /// Returns the tags for `style_name`, falling back to the default style and
    /// then to an empty string. Loads the style's overlay first when it has one.
    pub fn style_tags(&self, style_name: &str) -> String {
        if let Some(overlay) = Overlay::for_style(style_name) {
            self.ensure_loaded(overlay);
        }

        self.styles
            .get(style_name)
            .or_else(|| self.styles.get(DEFAULT_STYLE))
            .unwrap_or("")
            .to_string()
    }

    pub fn style_names(&self) -> Vec<String> {
        self.styles.keys().map(str::to_string).collect()
    }

    pub fn mapping_count(&self) -> usize {
        self.mappings.read().len()
    }
}

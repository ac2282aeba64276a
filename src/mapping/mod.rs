pub mod defaults;
pub mod dictionary;
pub mod layout;
pub mod mapper;

pub use defaults::{ANIME_STYLE, DEFAULT_STYLE};
pub use dictionary::{MappingLoadError, TagDictionary};
pub use layout::panel_tags;
pub use mapper::{Overlay, VisualMapper};

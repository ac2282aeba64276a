pub mod analysis;
pub mod config;
pub mod generator;
pub mod llm;
pub mod mapping;
pub mod utils;

pub use analysis::{Analysis, Analyzer, FallbackAnalyzer, WordFreq};
pub use config::{Config, LlmOverride, LlmSettings, MappingPaths};
pub use generator::{GenerationMode, GenerationRequest, PromptGenerator};
pub use mapping::{TagDictionary, VisualMapper};

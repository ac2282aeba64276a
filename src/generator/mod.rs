//! Prompt assembly: turns narrative text plus analyzer statistics into an
//! image-generation tag string using lookup, an LLM, or both.

pub mod prompts;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::analysis::Analysis;
use crate::config::{LlmOverride, LlmSettings};
use crate::llm::{call_chat_completion, extract_prompt, LlmError};
use crate::mapping::{panel_tags, VisualMapper, DEFAULT_STYLE};
use crate::utils::timing::GenerationTimer;

use prompts::{
    build_hybrid_user_prompt, build_llm_user_prompt, HYBRID_SYSTEM_PROMPT, LLM_SYSTEM_PROMPT,
};

const MAPPED_KEYWORD_LIMIT: usize = 15;
const HYBRID_ENTITY_LIMIT: usize = 10;
const EMPTY_CONTENT_TAGS: &str = "daily life, storytelling";
const QUALITY_TAGS: &str = "highres, best quality, 8k";
const SAFE_TAG: &str = "safe for work";
const MULTI_PANEL_ASPECT: &str = " --ar 2:3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    #[default]
    Algorithm,
    Llm,
    Hybrid,
}

impl GenerationMode {
    /// Unrecognised labels, including `auto`, select the algorithm.
    pub fn from_label(label: &str) -> Self {
        match label {
            "llm" => GenerationMode::Llm,
            "hybrid" => GenerationMode::Hybrid,
            _ => GenerationMode::Algorithm,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Algorithm => "algorithm",
            GenerationMode::Llm => "llm",
            GenerationMode::Hybrid => "hybrid",
        }
    }

    pub fn labels() -> &'static [&'static str] {
        &["auto", "algorithm", "llm", "hybrid"]
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub text: String,
    pub analysis: Analysis,
    pub mode: GenerationMode,
    pub panels: u32,
    pub style: String,
    pub sensitive_filter: bool,
    pub llm_override: LlmOverride,
    pub language: Option<String>,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        GenerationRequest {
            text: String::new(),
            analysis: Analysis::default(),
            mode: GenerationMode::Algorithm,
            panels: 2,
            style: DEFAULT_STYLE.to_string(),
            sensitive_filter: true,
            llm_override: LlmOverride::default(),
            language: None,
        }
    }
}

pub struct PromptGenerator {
    mapper: Arc<VisualMapper>,
    llm_defaults: LlmSettings,
}

impl PromptGenerator {
    pub fn new(mapper: Arc<VisualMapper>, llm_defaults: LlmSettings) -> Self {
        PromptGenerator {
            mapper,
            llm_defaults,
        }
    }

    pub fn mapper(&self) -> &VisualMapper {
        &self.mapper
    }

    /// Produces a prompt for `request`. Always returns usable text: LLM
    /// failures are reported inline ahead of the algorithmic prompt.
    pub async fn generate(&self, request: &GenerationRequest) -> String {
        let mut timer = GenerationTimer::start(
            request.mode.as_str(),
            &request.style,
            request.panels,
            &request.text,
        );
        let settings = self.llm_defaults.merged(&request.llm_override);

        let body = match request.mode {
            GenerationMode::Algorithm => self.generate_by_algorithm(
                &request.analysis,
                &request.style,
                request.panels,
                request.sensitive_filter,
            ),
            GenerationMode::Llm => match self.request_llm_prompt(request, &settings).await {
                Ok(prompt) => prompt,
                Err(err) => {
                    timer.mark_status("fallback", Some(err.to_string()));
                    self.llm_fallback(request, &err)
                }
            },
            GenerationMode::Hybrid => match self.request_hybrid_prompt(request, &settings).await {
                Ok(prompt) => prompt,
                Err(err) => {
                    timer.mark_status("fallback", Some(err.to_string()));
                    self.hybrid_fallback(request, &err)
                }
            },
        };
        timer.complete();

        match request.language.as_deref().filter(|language| !language.is_empty()) {
            Some(language) => format!("Target language: {language}\n{body}"),
            None => body,
        }
    }

    /// Offline lookup-based prompt: style, layout, mapped content, quality and
    /// the optional safety tag, joined by `", "`.
    pub fn generate_by_algorithm(
        &self,
        analysis: &Analysis,
        style: &str,
        panels: u32,
        sensitive_filter: bool,
    ) -> String {
        let mut parts: Vec<String> = Vec::new();
        parts.push(self.mapper.style_tags(style));
        parts.push(panel_tags(panels).to_string());

        let keywords = analysis.top_keywords(MAPPED_KEYWORD_LIMIT);
        let visual_tags = self.mapper.map_keywords(keywords.as_slice());
        debug!(
            "Mapped {} keyword(s) to {} visual tag(s)",
            keywords.len(),
            visual_tags.len()
        );
        if visual_tags.is_empty() {
            parts.push(EMPTY_CONTENT_TAGS.to_string());
        } else {
            parts.extend(visual_tags);
        }

        parts.push(QUALITY_TAGS.to_string());
        if sensitive_filter && analysis.sensitive_words {
            parts.push(SAFE_TAG.to_string());
        }

        let mut prompt = parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if panels > 1 {
            prompt.push_str(MULTI_PANEL_ASPECT);
        }
        prompt
    }

    /// LLM-only prompt, falling back to the algorithm on any call failure.
    pub async fn generate_by_llm(
        &self,
        request: &GenerationRequest,
        settings: &LlmSettings,
    ) -> String {
        match self.request_llm_prompt(request, settings).await {
            Ok(prompt) => prompt,
            Err(err) => self.llm_fallback(request, &err),
        }
    }

    /// Keyword-constrained LLM prompt, falling back to the algorithm on any
    /// call failure.
    pub async fn generate_hybrid(
        &self,
        request: &GenerationRequest,
        settings: &LlmSettings,
    ) -> String {
        match self.request_hybrid_prompt(request, settings).await {
            Ok(prompt) => prompt,
            Err(err) => self.hybrid_fallback(request, &err),
        }
    }

    async fn request_llm_prompt(
        &self,
        request: &GenerationRequest,
        settings: &LlmSettings,
    ) -> Result<String, LlmError> {
        let style_tags = self.mapper.style_tags(&request.style);
        let user_prompt = build_llm_user_prompt(
            &request.text,
            &request.style,
            &style_tags,
            request.panels,
            panel_tags(request.panels),
        );
        let raw = call_chat_completion(settings, LLM_SYSTEM_PROMPT, &user_prompt, "llm").await?;
        Ok(extract_prompt(&raw))
    }

    async fn request_hybrid_prompt(
        &self,
        request: &GenerationRequest,
        settings: &LlmSettings,
    ) -> Result<String, LlmError> {
        let key_entities = request.analysis.top_keywords(HYBRID_ENTITY_LIMIT);
        let style_tags = self.mapper.style_tags(&request.style);
        let user_prompt = build_hybrid_user_prompt(
            &request.text,
            &key_entities,
            &style_tags,
            panel_tags(request.panels),
        );
        let raw =
            call_chat_completion(settings, HYBRID_SYSTEM_PROMPT, &user_prompt, "hybrid").await?;
        Ok(extract_prompt(&raw))
    }

    fn algorithm_for(&self, request: &GenerationRequest) -> String {
        self.generate_by_algorithm(
            &request.analysis,
            &request.style,
            request.panels,
            request.sensitive_filter,
        )
    }

    fn llm_fallback(&self, request: &GenerationRequest, err: &LlmError) -> String {
        warn!("LLM generation failed, switching to algorithm: {}", err);
        format!(
            "LLM Error: {} (Switched to Algorithm)\n{}",
            err,
            self.algorithm_for(request)
        )
    }

    fn hybrid_fallback(&self, request: &GenerationRequest, err: &LlmError) -> String {
        warn!("Hybrid generation failed, falling back to algorithm: {}", err);
        format!(
            "Hybrid Error: {} (Fallback)\n{}",
            err,
            self.algorithm_for(request)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::WordFreq;
    use crate::mapping::defaults::{default_styles, default_tag_mappings};
    use std::path::PathBuf;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(base_url: &str) -> PromptGenerator {
        let mapper = VisualMapper::from_parts(
            default_tag_mappings(),
            default_styles(),
            PathBuf::from("/nonexistent/mappings_acgn.json"),
        );
        PromptGenerator::new(
            Arc::new(mapper),
            LlmSettings {
                base_url: base_url.to_string(),
                api_key: "test-key".to_string(),
                model: "test-model".to_string(),
                timeout_seconds: 5,
                temperature: 0.7,
            },
        )
    }

    fn analysis(words: &[&str], sensitive: bool) -> Analysis {
        Analysis {
            total_chars: 20,
            richness: 0.6,
            top_words: words
                .iter()
                .map(|word| WordFreq {
                    word: word.to_string(),
                    freq: 2,
                })
                .collect(),
            sensitive_words: sensitive,
            error: None,
        }
    }

    fn request(mode: GenerationMode) -> GenerationRequest {
        GenerationRequest {
            text: "男方是巨婴，不做家务，离婚还要补偿".to_string(),
            analysis: analysis(&["家务", "孩子"], false),
            mode,
            ..GenerationRequest::default()
        }
    }

    fn chat_response(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
    }

    const EXPECTED_ALGORITHM: &str = "masterpiece, best quality, flat color, anime style, simple background, bright, \
2koma, 2 panels, split view, top and bottom, \
cleaning, apron, vacuum cleaner, washing dishes, child, baby, playing, toys, cute, \
highres, best quality, 8k --ar 2:3";

    #[test]
    fn mode_labels_select_strategies() {
        assert_eq!(GenerationMode::from_label("llm"), GenerationMode::Llm);
        assert_eq!(GenerationMode::from_label("hybrid"), GenerationMode::Hybrid);
        assert_eq!(GenerationMode::from_label("auto"), GenerationMode::Algorithm);
        assert_eq!(GenerationMode::from_label("LLM"), GenerationMode::Algorithm);
    }

    #[test]
    fn algorithm_output_is_deterministic() {
        let generator = generator("http://127.0.0.1:1");
        let prompt =
            generator.generate_by_algorithm(&analysis(&["家务", "孩子"], false), DEFAULT_STYLE, 2, true);
        assert_eq!(prompt, EXPECTED_ALGORITHM);
    }

    #[test]
    fn algorithm_uses_storytelling_tags_when_nothing_maps() {
        let generator = generator("http://127.0.0.1:1");
        let prompt = generator.generate_by_algorithm(&analysis(&["陌生词"], false), "黑白线稿", 1, true);
        assert_eq!(
            prompt,
            "monochrome, lineart, manga style, ink, sketch, screentones, \
solo, single view, movie still, daily life, storytelling, highres, best quality, 8k"
        );
    }

    #[test]
    fn algorithm_adds_safe_tag_only_when_filter_and_flag_are_set() {
        let generator = generator("http://127.0.0.1:1");
        let flagged = analysis(&["钱"], true);

        let filtered = generator.generate_by_algorithm(&flagged, DEFAULT_STYLE, 1, true);
        let unfiltered = generator.generate_by_algorithm(&flagged, DEFAULT_STYLE, 1, false);

        assert!(filtered.ends_with("highres, best quality, 8k, safe for work"));
        assert!(unfiltered.ends_with("highres, best quality, 8k"));
    }

    #[test]
    fn algorithm_maps_only_top_fifteen_words() {
        let generator = generator("http://127.0.0.1:1");
        let mut words = vec!["无"; 15];
        words.push("钱");
        let prompt = generator.generate_by_algorithm(&analysis(&words, false), DEFAULT_STYLE, 1, true);
        assert!(prompt.contains("daily life, storytelling"));
        assert!(!prompt.contains("cash"));
    }

    #[tokio::test]
    async fn algorithm_mode_never_touches_network() {
        let generator = generator("http://127.0.0.1:1");
        let prompt = generator.generate(&request(GenerationMode::Algorithm)).await;
        assert_eq!(prompt, EXPECTED_ALGORITHM);
    }

    #[tokio::test]
    async fn llm_failure_falls_back_to_algorithm() {
        let generator = generator("http://127.0.0.1:1");
        let prompt = generator.generate(&request(GenerationMode::Llm)).await;

        let (diagnostic, rest) = prompt.split_once('\n').expect("diagnostic line");
        assert!(diagnostic.starts_with("LLM Error: Connection failed"));
        assert!(diagnostic.ends_with("(Switched to Algorithm)"));
        assert_eq!(rest, EXPECTED_ALGORITHM);
    }

    #[tokio::test]
    async fn hybrid_failure_uses_hybrid_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        let generator = generator(&server.uri());

        let prompt = generator.generate(&request(GenerationMode::Hybrid)).await;

        assert_eq!(
            prompt,
            format!("Hybrid Error: HTTP 500: boom (Fallback)\n{EXPECTED_ALGORITHM}")
        );
    }

    #[tokio::test]
    async fn llm_mode_extracts_tags_from_model_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("Output Tags:"))
            .respond_with(chat_response(
                "Sure! Here is your prompt:\n\"flat color, man sitting on sofa, messy room, best quality\"",
            ))
            .expect(1)
            .mount(&server)
            .await;
        let generator = generator(&server.uri());

        let prompt = generator.generate(&request(GenerationMode::Llm)).await;

        assert_eq!(prompt, "flat color, man sitting on sofa, messy room, best quality");
    }

    #[tokio::test]
    async fn hybrid_mode_sends_key_entities() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("Key Entities Detected: [家务, 孩子]"))
            .respond_with(chat_response(
                "apron, child playing, warm evening light, cozy living room, best quality",
            ))
            .expect(1)
            .mount(&server)
            .await;
        let generator = generator(&server.uri());

        let prompt = generator.generate(&request(GenerationMode::Hybrid)).await;

        assert_eq!(
            prompt,
            "apron, child playing, warm evening light, cozy living room, best quality"
        );
    }

    #[tokio::test]
    async fn request_override_redirects_llm_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("\"model\":\"override-model\""))
            .respond_with(chat_response("night city, neon rain, lonely figure, cinematic"))
            .expect(1)
            .mount(&server)
            .await;
        let generator = generator("http://127.0.0.1:1");
        let mut req = request(GenerationMode::Llm);
        req.llm_override = LlmOverride {
            base_url: Some(server.uri()),
            api_key: Some(String::new()),
            model: Some("override-model".to_string()),
        };

        let prompt = generator.generate(&req).await;

        assert_eq!(prompt, "night city, neon rain, lonely figure, cinematic");
    }

    #[tokio::test]
    async fn language_hint_prefixes_output() {
        let generator = generator("http://127.0.0.1:1");
        let mut req = request(GenerationMode::Algorithm);
        req.language = Some("English".to_string());

        let prompt = generator.generate(&req).await;

        assert_eq!(prompt, format!("Target language: English\n{EXPECTED_ALGORITHM}"));
    }

    #[tokio::test]
    async fn language_hint_is_used_verbatim() {
        let generator = generator("http://127.0.0.1:1");
        let mut req = request(GenerationMode::Algorithm);
        req.text = "12345".to_string();
        req.language = Some("auto".to_string());

        let prompt = generator.generate(&req).await;

        assert_eq!(prompt, format!("Target language: auto\n{EXPECTED_ALGORITHM}"));
    }

    #[tokio::test]
    async fn empty_language_hint_adds_no_prefix() {
        let generator = generator("http://127.0.0.1:1");
        let mut req = request(GenerationMode::Algorithm);
        req.language = Some(String::new());

        assert_eq!(generator.generate(&req).await, EXPECTED_ALGORITHM);
    }

    #[tokio::test]
    async fn malformed_llm_body_falls_back_to_algorithm() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;
        let generator = generator(&server.uri());

        let prompt = generator.generate(&request(GenerationMode::Llm)).await;

        let (diagnostic, rest) = prompt.split_once('\n').expect("diagnostic line");
        assert!(diagnostic.starts_with("LLM Error: Invalid API response format"));
        assert!(diagnostic.ends_with("(Switched to Algorithm)"));
        assert_eq!(rest, EXPECTED_ALGORITHM);
    }

    #[tokio::test]
    async fn strategy_methods_fall_back_directly() {
        let generator = generator("http://127.0.0.1:1");
        let req = request(GenerationMode::Llm);
        let settings = generator.llm_defaults.clone();

        let llm = generator.generate_by_llm(&req, &settings).await;
        let hybrid = generator.generate_hybrid(&req, &settings).await;

        assert!(llm.starts_with("LLM Error:"));
        assert!(llm.ends_with(EXPECTED_ALGORITHM));
        assert!(hybrid.starts_with("Hybrid Error:"));
        assert!(hybrid.ends_with(EXPECTED_ALGORITHM));
    }
}

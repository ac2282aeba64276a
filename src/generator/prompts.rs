pub const LLM_SYSTEM_PROMPT: &str = "You are an expert AI Art Prompt Generator. \
Your task is to convert the user's narrative text into a specific format for Stable Diffusion/Anime models.\n\
Rules:\n\
1. Output ONLY the English tags, separated by commas.\n\
2. No explanations, no markdown, no intro/outro.\n\
3. Structure: Style, Camera/Layout, Subject, Action, Environment, Quality.\n\
4. Include visual details (lighting, colors, expression).\n";

pub const HYBRID_SYSTEM_PROMPT: &str =
    "You are a helper optimizing AI art prompts. Keep the key entities provided.";

pub fn build_llm_user_prompt(
    text: &str,
    style_name: &str,
    style_tags: &str,
    panels: u32,
    panel_tags: &str,
) -> String {
    format!(
        "Input Text: \"{text}\"\n\n\
         Requirements:\n\
         - Art Style: {style_name} (Tags: {style_tags})\n\
         - Layout: {panels} Panels Comic (Tags: {panel_tags})\n\
         - Task: Extract characters, emotions, objects, and scenes from text and convert to tags.\n\
         \nOutput Tags:"
    )
}

pub fn build_hybrid_user_prompt(
    text: &str,
    key_entities: &[&str],
    style_tags: &str,
    panel_tags: &str,
) -> String {
    format!(
        "Source Text: \"{text}\"\n\
         Key Entities Detected: [{}]\n\
         Target Style: {style_tags}\n\
         Layout: {panel_tags}\n\n\
         Task: Create a high-quality, comma-separated prompt string. \
         Ensure all Key Entities are represented visually. Add lighting and atmosphere details.",
        key_entities.join(", ")
    )
}

pub mod client;
pub mod extract;

pub use client::{call_chat_completion, LlmError};
pub use extract::extract_prompt;

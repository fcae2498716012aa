pub mod provider;
pub mod openai;
pub mod prompts;
pub mod parser;

pub use provider::{CompletionRequest, LLMProvider};
pub use openai::OpenAIProvider;

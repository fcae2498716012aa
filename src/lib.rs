pub mod config;
pub mod error;
pub mod models;
pub mod extract;
pub mod llm;
pub mod taxonomy;
pub mod analysis;
pub mod export;
pub mod server;

pub use config::{Config, PipelineConfig, TraceMode};
pub use error::{Error, Result};
pub use llm::{LLMProvider, OpenAIProvider};
pub use analysis::AnalysisPipeline;
pub use models::{AnalysisEvent, AnalysisRequest, AnalysisResult};

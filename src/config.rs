use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Value shipped in the sample `.env`; treated the same as an unset key.
pub const PLACEHOLDER_API_KEY: &str = "your_openai_api_key_here";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub llm_timeout_secs: u64,
    pub bind_addr: String,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub section_delay_ms: u64,
    pub stream_channel_capacity: usize,
    pub trace_mode: TraceMode,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let openai_api_key = env::var("OPENAI_API_KEY").ok();

        let openai_model = env::var("OPENAI_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let openai_base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let llm_timeout_secs = env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(120);

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:5001".to_string());

        let static_dir = env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("static"));

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(16 * 1024 * 1024);

        let section_delay_ms = env::var("SECTION_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(500);

        let stream_channel_capacity = env::var("STREAM_CHANNEL_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(16);

        let trace_mode = match env::var("TRACE_MODE") {
            Ok(v) => v.parse()?,
            Err(_) => TraceMode::PerSection,
        };

        Ok(Self {
            openai_api_key,
            openai_model,
            openai_base_url,
            llm_timeout_secs,
            bind_addr,
            static_dir,
            max_upload_bytes,
            section_delay_ms,
            stream_channel_capacity,
            trace_mode,
        })
    }

    /// True when a usable credential is present.
    pub fn api_key_configured(&self) -> bool {
        is_usable_api_key(self.openai_api_key.as_deref())
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: DEFAULT_MODEL.to_string(),
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            llm_timeout_secs: 120,
            bind_addr: "127.0.0.1:5001".to_string(),
            static_dir: PathBuf::from("static"),
            max_upload_bytes: 16 * 1024 * 1024,
            section_delay_ms: 500,
            stream_channel_capacity: 16,
            trace_mode: TraceMode::PerSection,
        }
    }
}

pub fn is_usable_api_key(key: Option<&str>) -> bool {
    match key.map(str::trim) {
        Some(k) => !k.is_empty() && k != PLACEHOLDER_API_KEY,
        None => false,
    }
}

/// How thinking traces are gathered in synchronous mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceMode {
    /// One call per inspection section.
    PerSection,
    /// A single call that covers every section at once.
    SingleShot,
}

impl FromStr for TraceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "per_section" | "per-section" | "sections" => Ok(TraceMode::PerSection),
            "single_shot" | "single-shot" | "single" => Ok(TraceMode::SingleShot),
            other => Err(Error::Config(format!("Unknown TRACE_MODE: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub section_context_chars: usize,
    pub aggregate_context_chars: usize,
    pub section_delay: Duration,
    pub trace_mode: TraceMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            section_context_chars: 3000,
            aggregate_context_chars: 4000,
            section_delay: Duration::from_millis(500),
            trace_mode: TraceMode::PerSection,
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            section_delay: Duration::from_millis(config.section_delay_ms),
            trace_mode: config.trace_mode,
            ..Self::default()
        }
    }
}

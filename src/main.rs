use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use inspectrisk::export::{export_filename, summarize_by_severity, to_csv};
use inspectrisk::llm::{CompletionRequest, LLMProvider};
use inspectrisk::models::AnalysisResult;
use inspectrisk::taxonomy::SECTIONS;
use inspectrisk::{
    AnalysisEvent, AnalysisPipeline, AnalysisRequest, Config, OpenAIProvider, PipelineConfig,
    TraceMode,
};

#[derive(Parser, Debug)]
#[command(name = "inspectrisk")]
#[command(version = "0.1.0")]
#[command(about = "Analyze property inspection reports for risk factors")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to bind (overrides BIND_ADDR)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Analyze a local PDF or text file
    Analyze {
        /// Report to analyze
        file: PathBuf,

        /// Output format (text, json, csv)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Gather all section traces in a single call
        #[arg(long)]
        single_shot: bool,
    },

    /// Make one small call to verify the API key works
    Check,

    /// Convert a saved JSON result to CSV
    Export {
        /// JSON file as returned by /upload
        input: PathBuf,

        /// Output file (defaults to risk_analysis_<timestamp>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("inspectrisk=info".parse()?)
                .add_directive("reqwest=warn".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;

    match args.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if !config.api_key_configured() {
                tracing::warn!("OPENAI_API_KEY is not set; analyses will report a configuration error");
            }
            let pipeline = build_pipeline(&config)?;
            inspectrisk::server::serve(&config, pipeline).await?;
        }
        Command::Analyze {
            file,
            format,
            output,
            single_shot,
        } => {
            if single_shot {
                config.trace_mode = TraceMode::SingleShot;
            }
            let result = analyze_file(&config, &file).await?;
            let rendered = match format.as_str() {
                "json" => serde_json::to_string_pretty(&result)?,
                "csv" => to_csv(&result, chrono::Local::now().naive_local()),
                _ => format_text(&result),
            };
            write_output(&rendered, output.as_deref())?;
        }
        Command::Check => check_api(&config).await?,
        Command::Export { input, output } => {
            let json = std::fs::read_to_string(&input)?;
            let result: AnalysisResult = serde_json::from_str(&json)?;
            let now = chrono::Local::now().naive_local();
            let path = output.unwrap_or_else(|| PathBuf::from(export_filename(now)));
            std::fs::write(&path, to_csv(&result, now))?;
            tracing::info!("CSV written to: {}", path.display());
        }
    }

    Ok(())
}

fn build_pipeline(config: &Config) -> anyhow::Result<AnalysisPipeline> {
    let llm = OpenAIProvider::from_config(config)?;
    Ok(AnalysisPipeline::new(llm, PipelineConfig::from(config)))
}

async fn analyze_file(config: &Config, path: &Path) -> anyhow::Result<AnalysisResult> {
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let request = AnalysisRequest::new(bytes, &filename);
    let pipeline = build_pipeline(config)?;

    if config.trace_mode == TraceMode::SingleShot {
        return Ok(pipeline.analyze(request).await?);
    }

    // Stream so the progress bar can follow each section.
    let pb = ProgressBar::new(SECTIONS.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} sections {msg}")?
            .progress_chars("#>-"),
    );

    let mut rx = Arc::new(pipeline).stream(request, config.stream_channel_capacity);
    let mut outcome = None;

    while let Some(event) = rx.recv().await {
        match event {
            AnalysisEvent::Status { message } | AnalysisEvent::ThinkingStart { message } => {
                pb.set_message(message);
            }
            AnalysisEvent::ThinkingSection { message, .. } => pb.set_message(message),
            AnalysisEvent::ThinkingResult { .. } => pb.inc(1),
            AnalysisEvent::Complete { data } => {
                pb.finish_with_message("analysis complete");
                outcome = Some(Ok(*data));
            }
            AnalysisEvent::Error { message } => {
                pb.abandon_with_message("analysis failed");
                outcome = Some(Err(anyhow::anyhow!(message)));
            }
        }
    }

    outcome.unwrap_or_else(|| Err(anyhow::anyhow!("analysis ended without a result")))
}

async fn check_api(config: &Config) -> anyhow::Result<()> {
    let llm = OpenAIProvider::from_config(config)?;
    if !llm.is_configured() {
        anyhow::bail!("OPENAI_API_KEY is not set");
    }

    tracing::info!("Testing {} API connection with model {}", llm.name(), llm.model());
    let request = CompletionRequest::new(
        "You are a connectivity check.",
        r#"Say 'Hello, API is working!' in JSON format: {"message": "Hello, API is working!"}"#,
        50,
    );

    match llm.complete(request).await {
        Ok(text) => {
            println!("API call successful: {}", text);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn write_output(output: &str, path: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = path {
        std::fs::write(path, output)?;
        tracing::info!("Output written to: {}", path.display());
    } else {
        println!("{}", output);
    }
    Ok(())
}

fn format_text(result: &AnalysisResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n=== Risk Analysis: {} ===\n\n", result.filename));

    if let Some(ref error) = result.error {
        output.push_str(&format!("Error: {}\n", error));
    }

    output.push_str(&format!("Overall Risk: {}\n", result.overall_risk_score));
    output.push_str(&format!("Characters analyzed: {}\n", result.text_length));
    output.push_str(&format!("Risk factors: {}\n", result.risk_factors.len()));

    if !result.summary.is_empty() {
        output.push_str(&format!("\nSummary:\n  {}\n", result.summary));
    }

    let buckets = summarize_by_severity(&result.risk_factors);
    for (label, factors) in [
        ("Critical", &buckets.critical),
        ("High", &buckets.high),
        ("Medium", &buckets.medium),
        ("Low", &buckets.low),
    ] {
        if factors.is_empty() {
            continue;
        }
        output.push_str(&format!("\n{} ({}):\n", label, factors.len()));
        for factor in factors.iter() {
            output.push_str(&format!("  - [{}] {}\n", factor.category, factor.description));
            if !factor.location.is_empty() {
                output.push_str(&format!("      Location: {}\n", factor.location));
            }
            if !factor.recommendation.is_empty() {
                output.push_str(&format!("      Recommendation: {}\n", factor.recommendation));
            }
            if !factor.cost_impact.is_empty() {
                output.push_str(&format!("      Cost impact: {}\n", factor.cost_impact));
            }
        }
    }

    if !result.thinking_traces.is_empty() {
        output.push_str("\nSection Reasoning:\n");
        for trace in &result.thinking_traces {
            output.push_str(&format!("  {} ({})\n", trace.section, trace.severity_assessment));
            for issue in &trace.issues_found {
                output.push_str(&format!("    * {}\n", issue));
            }
        }
    }

    if let Some(time) = result.upload_time {
        output.push_str(&format!(
            "\nAnalyzed on: {}\n",
            time.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    output
}

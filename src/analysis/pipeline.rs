use std::sync::Arc;

use tokio::sync::mpsc;

use crate::analysis::state::{PipelineStage, StageTracker};
use crate::config::{PipelineConfig, TraceMode};
use crate::error::{Error, Result};
use crate::extract::extract;
use crate::llm::parser::{normalize_aggregate, normalize_section, normalize_traces};
use crate::llm::prompts::{
    build_aggregate_prompt, build_section_prompt, build_single_shot_prompt,
    AGGREGATE_MAX_TOKENS, AGGREGATE_SYSTEM_PROMPT, SECTION_MAX_TOKENS, SECTION_SYSTEM_PROMPT,
    SINGLE_SHOT_MAX_TOKENS, SINGLE_SHOT_SYSTEM_PROMPT,
};
use crate::llm::{CompletionRequest, LLMProvider};
use crate::models::{
    AggregateAssessment, AnalysisEvent, AnalysisRequest, AnalysisResult, ContentKind, SectionTrace,
};
use crate::taxonomy::{scan_keywords, SECTIONS};

/// Why a streaming run stopped before `Complete`.
enum Halt {
    Disconnected,
    Failed(Error),
}

impl From<Error> for Halt {
    fn from(e: Error) -> Self {
        Halt::Failed(e)
    }
}

pub struct AnalysisPipeline {
    llm: Arc<dyn LLMProvider>,
    config: PipelineConfig,
}

impl AnalysisPipeline {
    pub fn new(llm: impl LLMProvider + 'static, config: PipelineConfig) -> Self {
        Self {
            llm: Arc::new(llm),
            config,
        }
    }

    /// Runs the whole analysis and returns the merged result.
    ///
    /// Upstream and parse failures are folded into the result; only input
    /// errors (a text upload that is not UTF-8) are returned as `Err`.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult> {
        let filename = request.filename.clone();
        tracing::info!("Starting analysis of {}", filename);

        let sections = match self.config.trace_mode {
            TraceMode::PerSection => SECTIONS.len(),
            TraceMode::SingleShot => 1,
        };
        let mut tracker = StageTracker::new(sections);

        tracker.advance(PipelineStage::Extracting)?;
        let text = match extract(request).await {
            Ok(text) => text,
            Err(e) => {
                tracker.fail();
                return Err(e);
            }
        };
        let text_length = text.chars().count();
        log_keyword_scan(&text);

        if !self.llm.is_configured() {
            tracing::warn!("{} is not configured, skipping analysis", self.llm.name());
            tracker.advance(PipelineStage::Complete)?;
            return Ok(AnalysisResult::not_configured().with_metadata(&filename, text_length));
        }

        let traces = match self.config.trace_mode {
            TraceMode::PerSection => {
                let mut traces = Vec::with_capacity(SECTIONS.len());
                for (i, section) in SECTIONS.iter().enumerate() {
                    tracker.advance(PipelineStage::ThinkingSection(i))?;
                    tracing::info!("Analyzing section {}/{}: {}", i + 1, SECTIONS.len(), section);
                    traces.push(self.analyze_section(&text, section).await);
                }
                traces
            }
            TraceMode::SingleShot => {
                tracker.advance(PipelineStage::ThinkingSection(0))?;
                tracing::info!("Analyzing all sections in one call");
                self.analyze_all_sections(&text).await
            }
        };

        tracker.advance(PipelineStage::Aggregating)?;
        let assessment = self.assess(&text).await;
        tracker.advance(PipelineStage::Complete)?;

        let result = AnalysisResult::new(assessment, traces).with_metadata(&filename, text_length);
        tracing::info!(
            "Analysis of {} complete: {} risk factors, overall {}",
            filename,
            result.risk_factors.len(),
            result.overall_risk_score
        );
        Ok(result)
    }

    /// Spawns a streaming run and returns the receiving end of its event channel.
    pub fn stream(self: Arc<Self>, request: AnalysisRequest, capacity: usize) -> mpsc::Receiver<AnalysisEvent> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(async move {
            let stages = self.run_streaming(request, tx).await;
            tracing::debug!("Streaming run finished at {:?}", stages.last());
        });
        rx
    }

    /// Runs the analysis, pushing an event after every step.
    ///
    /// Exactly one terminal event (`complete` or `error`) is sent unless the
    /// consumer disconnects first, in which case the run stops at the next
    /// section boundary. Returns the stages the run went through.
    pub async fn run_streaming(
        &self,
        request: AnalysisRequest,
        tx: mpsc::Sender<AnalysisEvent>,
    ) -> Vec<PipelineStage> {
        let mut tracker = StageTracker::new(SECTIONS.len());

        match self.stream_steps(request, &tx, &mut tracker).await {
            Ok(()) => {}
            Err(Halt::Disconnected) => {
                tracing::info!("Consumer disconnected at {}, stopping run", tracker.current());
            }
            Err(Halt::Failed(e)) => {
                tracing::error!("Streaming analysis failed at {}: {}", tracker.current(), e);
                tracker.fail();
                let _ = tx.send(AnalysisEvent::error(e.to_string())).await;
            }
        }

        tracker.into_history()
    }

    async fn stream_steps(
        &self,
        request: AnalysisRequest,
        tx: &mpsc::Sender<AnalysisEvent>,
        tracker: &mut StageTracker,
    ) -> std::result::Result<(), Halt> {
        let filename = request.filename.clone();

        emit(tx, AnalysisEvent::status("Starting analysis...")).await?;

        tracker.advance(PipelineStage::Extracting)?;
        let reading = match request.content_kind {
            ContentKind::Pdf => "Extracting text from PDF...",
            ContentKind::Text => "Reading text file...",
        };
        emit(tx, AnalysisEvent::status(reading)).await?;

        let text = extract(request).await?;
        let text_length = text.chars().count();
        log_keyword_scan(&text);

        emit(
            tx,
            AnalysisEvent::status(format!("Document processed. Length: {} characters", text_length)),
        )
        .await?;

        if !self.llm.is_configured() {
            tracing::warn!("{} is not configured, skipping analysis", self.llm.name());
            let result = AnalysisResult::not_configured().with_metadata(&filename, text_length);
            emit(tx, AnalysisEvent::Complete { data: Box::new(result) }).await?;
            tracker.advance(PipelineStage::Complete)?;
            return Ok(());
        }

        emit(
            tx,
            AnalysisEvent::ThinkingStart {
                message: "Beginning AI analysis...".to_string(),
            },
        )
        .await?;

        let mut traces: Vec<SectionTrace> = Vec::with_capacity(SECTIONS.len());
        for (i, section) in SECTIONS.iter().enumerate() {
            if tx.is_closed() {
                return Err(Halt::Disconnected);
            }

            tracker.advance(PipelineStage::ThinkingSection(i))?;
            emit(
                tx,
                AnalysisEvent::ThinkingSection {
                    section: section.to_string(),
                    message: format!("Analyzing {}...", section),
                },
            )
            .await?;

            tracing::info!("Analyzing section {}/{}: {}", i + 1, SECTIONS.len(), section);
            let trace = self.analyze_section(&text, section).await;
            traces.push(trace.clone());

            emit(
                tx,
                AnalysisEvent::ThinkingResult {
                    section: section.to_string(),
                    trace,
                },
            )
            .await?;

            if !self.config.section_delay.is_zero() {
                tokio::time::sleep(self.config.section_delay).await;
            }
        }

        tracker.advance(PipelineStage::Aggregating)?;
        emit(tx, AnalysisEvent::status("Generating final risk assessment...")).await?;

        let assessment = self.assess(&text).await;
        let result = AnalysisResult::new(assessment, traces).with_metadata(&filename, text_length);

        emit(tx, AnalysisEvent::Complete { data: Box::new(result) }).await?;
        tracker.advance(PipelineStage::Complete)?;
        Ok(())
    }

    async fn analyze_section(&self, text: &str, section: &str) -> SectionTrace {
        let request = CompletionRequest::new(
            SECTION_SYSTEM_PROMPT,
            build_section_prompt(text, section, self.config.section_context_chars),
            SECTION_MAX_TOKENS,
        );

        match self.llm.complete(request).await {
            Ok(raw) => normalize_section(&raw, section),
            Err(e) => {
                tracing::warn!("Section {} failed: {}", section, e);
                SectionTrace::api_failure(section, &e)
            }
        }
    }

    async fn analyze_all_sections(&self, text: &str) -> Vec<SectionTrace> {
        let request = CompletionRequest::new(
            SINGLE_SHOT_SYSTEM_PROMPT,
            build_single_shot_prompt(text, self.config.aggregate_context_chars),
            SINGLE_SHOT_MAX_TOKENS,
        );

        match self.llm.complete(request).await {
            Ok(raw) => normalize_traces(&raw),
            Err(e) => {
                tracing::warn!("Thinking traces failed: {}", e);
                vec![SectionTrace::api_failure("Analysis", &e)]
            }
        }
    }

    async fn assess(&self, text: &str) -> AggregateAssessment {
        let request = CompletionRequest::new(
            AGGREGATE_SYSTEM_PROMPT,
            build_aggregate_prompt(text, self.config.aggregate_context_chars),
            AGGREGATE_MAX_TOKENS,
        );

        match self.llm.complete(request).await {
            Ok(raw) => normalize_aggregate(&raw),
            Err(e) => {
                tracing::warn!("Aggregate assessment failed: {}", e);
                AggregateAssessment::upstream_failure(&e)
            }
        }
    }
}

async fn emit(tx: &mpsc::Sender<AnalysisEvent>, event: AnalysisEvent) -> std::result::Result<(), Halt> {
    tx.send(event).await.map_err(|_| Halt::Disconnected)
}

fn log_keyword_scan(text: &str) {
    let hits = scan_keywords(text);
    if !hits.is_empty() {
        tracing::debug!("Keyword hits by category: {:?}", hits);
    }
}

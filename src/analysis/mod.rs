pub mod pipeline;
pub mod state;

pub use pipeline::AnalysisPipeline;
pub use state::{PipelineStage, StageTracker};

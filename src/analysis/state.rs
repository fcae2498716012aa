use crate::error::{Error, Result};

/// Where a pipeline run currently is.
///
/// `Idle → Extracting → ThinkingSection(0..n) → Aggregating → Complete`,
/// with `Extracting → Complete` for the unconfigured short-circuit and any
/// non-terminal stage able to move to `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Extracting,
    ThinkingSection(usize),
    Aggregating,
    Complete,
    Error,
}

impl PipelineStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Complete | PipelineStage::Error)
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Idle => write!(f, "Idle"),
            PipelineStage::Extracting => write!(f, "Extracting"),
            PipelineStage::ThinkingSection(i) => write!(f, "ThinkingSection[{}]", i),
            PipelineStage::Aggregating => write!(f, "Aggregating"),
            PipelineStage::Complete => write!(f, "Complete"),
            PipelineStage::Error => write!(f, "Error"),
        }
    }
}

/// Validates and records the stage sequence of one run.
#[derive(Debug, Clone)]
pub struct StageTracker {
    sections: usize,
    history: Vec<PipelineStage>,
}

impl StageTracker {
    /// `sections` is the number of thinking steps before aggregation.
    pub fn new(sections: usize) -> Self {
        Self {
            sections,
            history: vec![PipelineStage::Idle],
        }
    }

    pub fn current(&self) -> PipelineStage {
        self.history
            .last()
            .copied()
            .unwrap_or(PipelineStage::Idle)
    }

    pub fn can_transition_to(&self, next: PipelineStage) -> bool {
        let current = self.current();
        if current.is_terminal() {
            return false;
        }

        match (current, next) {
            (_, PipelineStage::Error) => true,
            (PipelineStage::Idle, PipelineStage::Extracting) => true,
            (PipelineStage::Extracting, PipelineStage::ThinkingSection(0)) => self.sections > 0,
            (PipelineStage::Extracting, PipelineStage::Aggregating) => self.sections == 0,
            (PipelineStage::Extracting, PipelineStage::Complete) => true,
            (PipelineStage::ThinkingSection(i), PipelineStage::ThinkingSection(j)) => {
                j == i + 1 && j < self.sections
            }
            (PipelineStage::ThinkingSection(i), PipelineStage::Aggregating) => i + 1 == self.sections,
            (PipelineStage::Aggregating, PipelineStage::Complete) => true,
            _ => false,
        }
    }

    pub fn advance(&mut self, next: PipelineStage) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: self.current(),
                to: next,
            });
        }
        tracing::debug!("Pipeline stage: {} -> {}", self.current(), next);
        self.history.push(next);
        Ok(())
    }

    /// Moves to `Error` unless already terminal.
    pub fn fail(&mut self) {
        if !self.current().is_terminal() {
            self.history.push(PipelineStage::Error);
        }
    }

    pub fn history(&self) -> &[PipelineStage] {
        &self.history
    }

    pub fn into_history(self) -> Vec<PipelineStage> {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipelineStage::{Aggregating, Complete, Extracting, Idle, ThinkingSection};

    #[test]
    fn test_full_sequence() {
        let mut tracker = StageTracker::new(3);
        tracker.advance(Extracting).unwrap();
        tracker.advance(ThinkingSection(0)).unwrap();
        tracker.advance(ThinkingSection(1)).unwrap();
        tracker.advance(ThinkingSection(2)).unwrap();
        tracker.advance(Aggregating).unwrap();
        tracker.advance(Complete).unwrap();

        assert_eq!(
            tracker.history(),
            &[Idle, Extracting, ThinkingSection(0), ThinkingSection(1), ThinkingSection(2), Aggregating, Complete]
        );
    }

    #[test]
    fn test_cannot_skip_sections() {
        let mut tracker = StageTracker::new(8);
        tracker.advance(Extracting).unwrap();
        tracker.advance(ThinkingSection(0)).unwrap();
        assert!(tracker.advance(ThinkingSection(2)).is_err());
        assert!(tracker.advance(Aggregating).is_err());
        assert_eq!(tracker.current(), ThinkingSection(0));
    }

    #[test]
    fn test_short_circuit_and_error() {
        let mut tracker = StageTracker::new(8);
        assert!(tracker.advance(Complete).is_err());
        tracker.advance(Extracting).unwrap();
        tracker.advance(Complete).unwrap();
        assert!(tracker.advance(PipelineStage::Error).is_err());

        let mut tracker = StageTracker::new(8);
        tracker.advance(Extracting).unwrap();
        tracker.fail();
        tracker.fail();
        assert_eq!(tracker.history(), &[Idle, Extracting, PipelineStage::Error]);
    }

    #[test]
    fn test_invalid_transition_error_message() {
        let mut tracker = StageTracker::new(8);
        let err = tracker.advance(Aggregating).unwrap_err();
        assert_eq!(err.to_string(), "Invalid pipeline transition from Idle to Aggregating");
    }
}

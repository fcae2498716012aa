use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::lenient;
use crate::error::Error;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, Default)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    #[default]
    Unknown,
}

impl RiskLevel {
    /// Case-insensitive; anything unrecognised is `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" => RiskLevel::Low,
            "medium" => RiskLevel::Medium,
            "high" => RiskLevel::High,
            "critical" => RiskLevel::Critical,
            _ => RiskLevel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
            RiskLevel::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => RiskLevel::parse(&s),
            _ => RiskLevel::Unknown,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RiskFactor {
    #[serde(default, deserialize_with = "lenient::string")]
    pub category: String,
    #[serde(default)]
    pub severity: RiskLevel,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub recommendation: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub cost_impact: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub location: String,
}

/// Per-section reasoning produced before the aggregate assessment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SectionTrace {
    #[serde(default, deserialize_with = "lenient::string")]
    pub section: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub issues_found: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub reasoning: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub evidence: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub severity_assessment: String,
}

impl SectionTrace {
    /// Stand-in for a section whose response was not valid JSON.
    pub fn parse_failure(section: &str) -> Self {
        Self {
            section: section.to_string(),
            issues_found: vec!["Analysis error".to_string()],
            reasoning: "Unable to parse AI response".to_string(),
            evidence: "JSON parsing error".to_string(),
            severity_assessment: "Unknown".to_string(),
        }
    }

    /// Stand-in for a section whose completion call failed.
    pub fn api_failure(section: &str, error: &Error) -> Self {
        Self {
            section: section.to_string(),
            issues_found: vec!["API error".to_string()],
            reasoning: format!("Error: {}", error),
            evidence: "API call failed".to_string(),
            severity_assessment: "Unknown".to_string(),
        }
    }
}

/// Output of the final aggregate call, before run metadata is attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AggregateAssessment {
    #[serde(default, deserialize_with = "lenient::list")]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    pub overall_risk_score: RiskLevel,
    #[serde(default, deserialize_with = "lenient::string")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub error: Option<String>,
}

impl AggregateAssessment {
    pub fn parse_failure(message: &str) -> Self {
        Self {
            risk_factors: vec![RiskFactor {
                category: "Analysis Error".to_string(),
                severity: RiskLevel::Medium,
                description: "Unable to parse AI response. Please check your API key and try again."
                    .to_string(),
                recommendation: "Verify OpenAI API key and ensure sufficient credits".to_string(),
                cost_impact: "Unknown".to_string(),
                location: "N/A".to_string(),
            }],
            overall_risk_score: RiskLevel::Unknown,
            summary: "Analysis failed due to API response format issues".to_string(),
            error: Some(format!("Invalid JSON response from API: {}", message)),
        }
    }

    /// Error-shaped assessment for a failed aggregate completion call.
    pub fn upstream_failure(error: &Error) -> Self {
        let (error, summary) = match error {
            Error::Authentication(_) => (
                "OpenAI API authentication failed. Please check your API key.".to_string(),
                "Authentication failed".to_string(),
            ),
            Error::RateLimited(_) => (
                "OpenAI API rate limit exceeded. Please try again later.".to_string(),
                "Rate limit exceeded".to_string(),
            ),
            Error::EmptyResponse => (
                "Empty response from OpenAI API".to_string(),
                "API returned empty response".to_string(),
            ),
            Error::LLMApi(msg) => (
                format!("OpenAI API error: {}", msg),
                format!("API error: {}", msg),
            ),
            other => (
                format!("OpenAI API error: {}", other),
                format!("API error: {}", other),
            ),
        };

        Self {
            risk_factors: Vec::new(),
            overall_risk_score: RiskLevel::Unknown,
            summary,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient::list")]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    pub overall_risk_score: RiskLevel,
    #[serde(default, deserialize_with = "lenient::string")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient::list")]
    pub thinking_traces: Vec<SectionTrace>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_string"
    )]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub filename: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::timestamp"
    )]
    pub upload_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub text_length: usize,
}

impl AnalysisResult {
    pub fn new(assessment: AggregateAssessment, thinking_traces: Vec<SectionTrace>) -> Self {
        Self {
            risk_factors: assessment.risk_factors,
            overall_risk_score: assessment.overall_risk_score,
            summary: assessment.summary,
            thinking_traces,
            error: assessment.error,
            ..Self::default()
        }
    }

    /// Returned without any upstream call when no usable credential is set.
    pub fn not_configured() -> Self {
        Self {
            summary: "API key not configured".to_string(),
            error: Some(
                "OpenAI API key not configured. Please set OPENAI_API_KEY in your .env file."
                    .to_string(),
            ),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, filename: &str, text_length: usize) -> Self {
        self.filename = filename.to_string();
        self.upload_time = Some(Utc::now());
        self.text_length = text_length;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_fields_verbatim() {
        let raw = r#"{"risk_factors":[{"category":"Roofing Issues","severity":"High","description":"d","recommendation":"r","cost_impact":"c","location":"l"}],"overall_risk_score":"High","summary":"s"}"#;
        let assessment: AggregateAssessment = serde_json::from_str(raw).unwrap();
        let result = AnalysisResult::new(assessment, Vec::new());

        assert_eq!(result.overall_risk_score, RiskLevel::High);
        assert_eq!(result.summary, "s");
        assert_eq!(
            result.risk_factors,
            vec![RiskFactor {
                category: "Roofing Issues".to_string(),
                severity: RiskLevel::High,
                description: "d".to_string(),
                recommendation: "r".to_string(),
                cost_impact: "c".to_string(),
                location: "l".to_string(),
            }]
        );
        assert!(result.error.is_none());
    }

    #[test]
    fn test_non_string_fields_are_coerced() {
        let raw = r#"{"category": 7, "severity": null, "description": ["x"], "location": "Attic"}"#;
        let factor: RiskFactor = serde_json::from_str(raw).unwrap();
        assert_eq!(factor.category, "");
        assert_eq!(factor.severity, RiskLevel::Unknown);
        assert_eq!(factor.description, "");
        assert_eq!(factor.recommendation, "");
        assert_eq!(factor.location, "Attic");
    }

    #[test]
    fn test_issues_found_accepts_bare_string() {
        let raw = r#"{"section": "HVAC Systems", "issues_found": "Old furnace"}"#;
        let trace: SectionTrace = serde_json::from_str(raw).unwrap();
        assert_eq!(trace.issues_found, vec!["Old furnace".to_string()]);
        assert_eq!(trace.severity_assessment, "");
    }

    #[test]
    fn test_risk_level_parse_is_case_insensitive() {
        assert_eq!(RiskLevel::parse("critical"), RiskLevel::Critical);
        assert_eq!(RiskLevel::parse(" MEDIUM "), RiskLevel::Medium);
        assert_eq!(RiskLevel::parse("Medium-High"), RiskLevel::Unknown);
    }

    #[test]
    fn test_not_configured_shape() {
        let result = AnalysisResult::not_configured();
        assert_eq!(result.overall_risk_score, RiskLevel::Unknown);
        assert!(result.risk_factors.is_empty());
        assert!(result.thinking_traces.is_empty());
        assert!(!result.error.as_deref().unwrap_or("").is_empty());
    }

    #[test]
    fn test_upstream_failure_messages() {
        let auth = AggregateAssessment::upstream_failure(&Error::Authentication("bad key".into()));
        assert_eq!(auth.summary, "Authentication failed");
        assert_eq!(auth.overall_risk_score, RiskLevel::Unknown);

        let limited = AggregateAssessment::upstream_failure(&Error::RateLimited("quota".into()));
        assert_eq!(
            limited.error.as_deref(),
            Some("OpenAI API rate limit exceeded. Please try again later.")
        );

        let api = AggregateAssessment::upstream_failure(&Error::LLMApi("boom".into()));
        assert_eq!(api.summary, "API error: boom");
    }

    #[test]
    fn test_result_round_trips_through_export_shape() {
        let result = AnalysisResult {
            summary: "ok".to_string(),
            ..AnalysisResult::default()
        }
        .with_metadata("report.pdf", 42);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["overall_risk_score"], "Unknown");
        assert_eq!(json["text_length"], 42);
        assert!(json.get("error").is_none());

        let back: AnalysisResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.filename, "report.pdf");
        assert!(back.upload_time.is_some());
    }
}

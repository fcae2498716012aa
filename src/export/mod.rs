pub mod csv;

use chrono::NaiveDateTime;

use crate::models::{AnalysisResult, RiskFactor, RiskLevel};
use self::csv::CsvWriter;

pub const RISK_FACTOR_COLUMNS: [&str; 6] = [
    "Category",
    "Severity",
    "Description",
    "Recommendation",
    "Cost Impact",
    "Location",
];

pub const TRACE_COLUMNS: [&str; 5] = [
    "Section",
    "Issues Found",
    "Reasoning",
    "Evidence",
    "Severity Assessment",
];

/// Renders a finished analysis as a CSV report.
pub fn to_csv(result: &AnalysisResult, generated_at: NaiveDateTime) -> String {
    let mut w = CsvWriter::new();

    let filename = if result.filename.is_empty() {
        "Unknown"
    } else {
        result.filename.as_str()
    };

    w.row(["Risk Analysis Report"]);
    w.row(["Generated:".to_string(), generated_at.format("%Y-%m-%d %H:%M:%S").to_string()]);
    w.row(["Filename:", filename]);
    w.row(["Overall Risk Score:", result.overall_risk_score.as_str()]);
    w.row(["Total Risk Factors:".to_string(), result.risk_factors.len().to_string()]);
    w.blank();

    if !result.summary.is_empty() {
        w.row(["Summary"]);
        w.row([result.summary.as_str()]);
        w.blank();
    }

    if !result.risk_factors.is_empty() {
        w.row(["Risk Factors"]);
        w.row(RISK_FACTOR_COLUMNS);
        for risk in &result.risk_factors {
            w.row([
                risk.category.as_str(),
                risk.severity.as_str(),
                risk.description.as_str(),
                risk.recommendation.as_str(),
                risk.cost_impact.as_str(),
                risk.location.as_str(),
            ]);
        }
    }

    if !result.thinking_traces.is_empty() {
        w.blank();
        w.row(["AI Analysis Process"]);
        w.row(TRACE_COLUMNS);
        for trace in &result.thinking_traces {
            let issues = trace.issues_found.join("; ");
            w.row([
                trace.section.as_str(),
                issues.as_str(),
                trace.reasoning.as_str(),
                trace.evidence.as_str(),
                trace.severity_assessment.as_str(),
            ]);
        }
    }

    w.finish()
}

/// `risk_analysis_<yyyyMMdd_HHmmss>.csv`
pub fn export_filename(now: NaiveDateTime) -> String {
    format!("risk_analysis_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

#[derive(Debug, Default, PartialEq)]
pub struct SeverityBuckets<'a> {
    pub critical: Vec<&'a RiskFactor>,
    pub high: Vec<&'a RiskFactor>,
    pub medium: Vec<&'a RiskFactor>,
    pub low: Vec<&'a RiskFactor>,
}

/// Groups risk factors by severity; factors with an unknown severity are left out.
pub fn summarize_by_severity(factors: &[RiskFactor]) -> SeverityBuckets<'_> {
    let mut buckets = SeverityBuckets::default();
    for factor in factors {
        match factor.severity {
            RiskLevel::Critical => buckets.critical.push(factor),
            RiskLevel::High => buckets.high.push(factor),
            RiskLevel::Medium => buckets.medium.push(factor),
            RiskLevel::Low => buckets.low.push(factor),
            RiskLevel::Unknown => {}
        }
    }
    buckets
}

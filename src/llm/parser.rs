use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{AggregateAssessment, SectionTrace};

/// Removes one leading "```json" (or "```") marker and one trailing "```".
///
/// Exact prefix/suffix match only; fences in the middle of the text are left
/// alone.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

pub fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(strip_fences(raw))
        .map_err(|e| Error::ParseError(e.to_string()))
}

/// Section trace from a raw response, or the fixed parse-failure trace.
pub fn normalize_section(raw: &str, section: &str) -> SectionTrace {
    let parsed = parse_json(raw).and_then(|value| {
        if !value.is_object() {
            return Err(Error::ParseError("expected a JSON object".to_string()));
        }
        serde_json::from_value::<SectionTrace>(value).map_err(Error::from)
    });

    match parsed {
        Ok(mut trace) => {
            if trace.section.trim().is_empty() {
                trace.section = section.to_string();
            }
            trace
        }
        Err(e) => {
            tracing::warn!("Unparseable response for {}: {}", section, e);
            tracing::debug!("Raw response: {}", raw);
            SectionTrace::parse_failure(section)
        }
    }
}

/// Aggregate assessment from a raw response, or the error-shaped fallback.
pub fn normalize_aggregate(raw: &str) -> AggregateAssessment {
    let parsed = parse_json(raw).and_then(|value| {
        if !value.is_object() {
            return Err(Error::ParseError("expected a JSON object".to_string()));
        }
        serde_json::from_value::<AggregateAssessment>(value).map_err(Error::from)
    });

    match parsed {
        Ok(assessment) => assessment,
        Err(e) => {
            let message = match &e {
                Error::ParseError(msg) => msg.clone(),
                other => other.to_string(),
            };
            tracing::warn!("Unparseable aggregate response: {}", message);
            tracing::debug!("Raw response: {}", raw);
            AggregateAssessment::parse_failure(&message)
        }
    }
}

/// Traces from a single all-sections response.
pub fn normalize_traces(raw: &str) -> Vec<SectionTrace> {
    match parse_json(raw) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        Ok(value @ Value::Object(_)) => serde_json::from_value(value).map(|t| vec![t]).unwrap_or_default(),
        Ok(_) | Err(_) => {
            tracing::warn!("Unparseable thinking traces");
            vec![SectionTrace {
                section: "Analysis".to_string(),
                reasoning: "Unable to parse thinking traces".to_string(),
                evidence: "JSON parsing error".to_string(),
                ..SectionTrace::default()
            }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;

    #[test]
    fn test_strip_json_fence() {
        let input = "```json\n{\"summary\": \"ok\"}\n```";
        assert_eq!(strip_fences(input), r#"{"summary": "ok"}"#);
    }

    #[test]
    fn test_strip_plain_fence() {
        let input = "  ```\n{\"a\": 1}```  ";
        assert_eq!(strip_fences(input), r#"{"a": 1}"#);
    }

    #[test]
    fn test_strip_fences_idempotent() {
        let inputs = [
            "```json\n{\"a\": [1, 2]}\n```",
            "```\n{\"a\": 1}\n```",
            "{\"a\": 1}",
            "```json {\"x\": \"y\"}",
        ];
        for input in inputs {
            let once = strip_fences(input);
            assert_eq!(strip_fences(once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_fenced_and_plain_parse_identically() {
        let plain = r#"{"section": "Safety Concerns", "issues_found": ["No smoke detectors"]}"#;
        let fenced = format!("```json\n{}\n```", plain);
        assert_eq!(parse_json(plain).unwrap(), parse_json(&fenced).unwrap());
    }

    #[test]
    fn test_malformed_section_falls_back() {
        let trace = normalize_section("I think the wiring is fine.", "Electrical Systems");
        assert_eq!(trace, SectionTrace::parse_failure("Electrical Systems"));
        assert_eq!(trace.issues_found, vec!["Analysis error".to_string()]);
        assert_eq!(trace.severity_assessment, "Unknown");
    }

    #[test]
    fn test_array_section_falls_back() {
        let trace = normalize_section("[1, 2, 3]", "Accessibility");
        assert_eq!(trace.reasoning, "Unable to parse AI response");
    }

    #[test]
    fn test_section_without_name_takes_requested() {
        let trace = normalize_section(r#"{"issues_found": [], "reasoning": "none"}"#, "HVAC Systems");
        assert_eq!(trace.section, "HVAC Systems");
        assert_eq!(trace.reasoning, "none");
    }

    #[test]
    fn test_malformed_aggregate_falls_back() {
        let assessment = normalize_aggregate("```json\n{\"risk_factors\": [\n```");
        assert_eq!(assessment.overall_risk_score, RiskLevel::Unknown);
        assert_eq!(assessment.summary, "Analysis failed due to API response format issues");
        assert_eq!(assessment.risk_factors.len(), 1);
        assert_eq!(assessment.risk_factors[0].category, "Analysis Error");
        assert!(assessment
            .error
            .as_deref()
            .unwrap()
            .starts_with("Invalid JSON response from API: "));
    }

    #[test]
    fn test_aggregate_parses_fenced() {
        let raw = "```json\n{\"risk_factors\": [], \"overall_risk_score\": \"Low\", \"summary\": \"Fine\"}\n```";
        let assessment = normalize_aggregate(raw);
        assert_eq!(assessment.overall_risk_score, RiskLevel::Low);
        assert!(assessment.risk_factors.is_empty());
        assert!(assessment.error.is_none());
    }

    #[test]
    fn test_single_shot_traces() {
        let raw = r#"[{"section": "Structural", "issues_found": ["cracks"]}, {"section": "Electrical"}]"#;
        let traces = normalize_traces(raw);
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[1].section, "Electrical");

        let fallback = normalize_traces("not json");
        assert_eq!(fallback.len(), 1);
        assert_eq!(fallback[0].reasoning, "Unable to parse thinking traces");
    }
}

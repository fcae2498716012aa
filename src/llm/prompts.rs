pub const SECTION_SYSTEM_PROMPT: &str =
    "You are a professional property inspector. Analyze each section methodically.";

pub const AGGREGATE_SYSTEM_PROMPT: &str = "You are a professional property inspector and risk analyst. \
Provide accurate, detailed analysis of property inspection reports.";

pub const SINGLE_SHOT_SYSTEM_PROMPT: &str = "You are a professional property inspector. \
Think through each section methodically and explain your reasoning clearly.";

pub const SECTION_MAX_TOKENS: u32 = 500;
pub const AGGREGATE_MAX_TOKENS: u32 = 1500;
pub const SINGLE_SHOT_MAX_TOKENS: u32 = 1000;

pub const SECTION_CONTEXT_CHARS: usize = 3000;
pub const AGGREGATE_CONTEXT_CHARS: usize = 4000;

/// First `limit` characters of `text`. Counted in chars so a multi-byte
/// boundary is never split.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn build_section_prompt(text: &str, section: &str, context_chars: usize) -> String {
    format!(
        r#"Analyze the {section} section of this property inspection report:

Report text:
{report}

Focus specifically on {section}. Think through:
1. What issues did you identify in this section?
2. Why are they concerning?
3. What evidence supports your assessment?
4. How severe do you think each issue is and why?

Return your analysis as JSON:
{{
    "section": "{section}",
    "issues_found": ["issue1", "issue2"],
    "reasoning": "detailed reasoning",
    "evidence": "specific evidence from text",
    "severity_assessment": "severity level and explanation"
}}
"#,
        section = section,
        report = truncate_chars(text, context_chars),
    )
}

pub fn build_aggregate_prompt(text: &str, context_chars: usize) -> String {
    format!(
        r#"Based on your analysis of the property inspection report, provide a comprehensive risk assessment.

Report text:
{report}

Return the analysis as a JSON object with this structure:
{{
    "risk_factors": [
        {{
            "category": "string",
            "severity": "Low/Medium/High/Critical",
            "description": "string",
            "recommendation": "string",
            "cost_impact": "string",
            "location": "string"
        }}
    ],
    "overall_risk_score": "Low/Medium/High/Critical",
    "summary": "string"
}}
"#,
        report = truncate_chars(text, context_chars),
    )
}

/// All sections in one call; the model returns an array of traces.
pub fn build_single_shot_prompt(text: &str, context_chars: usize) -> String {
    format!(
        r#"Analyze the following property inspection report step by step. Think through each section carefully:

Report text:
{report}

For each major section (Structural, Electrical, Plumbing, etc.), provide your reasoning:
1. What issues did you identify?
2. Why are they concerning?
3. What evidence supports your assessment?
4. How severe do you think each issue is and why?

Return your thinking process as a JSON array of reasoning steps:
[
    {{
        "section": "string",
        "issues_found": ["string"],
        "reasoning": "string",
        "evidence": "string",
        "severity_assessment": "string"
    }}
]
"#,
        report = truncate_chars(text, context_chars),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_prompt_ignores_text_past_limit() {
        let base: String = "a".repeat(4000);
        let first = format!("{}X", base);
        let second = format!("{}Y", base);
        assert_eq!(first.chars().count(), 4001);

        let p1 = build_aggregate_prompt(&first, AGGREGATE_CONTEXT_CHARS);
        let p2 = build_aggregate_prompt(&second, AGGREGATE_CONTEXT_CHARS);
        assert_eq!(p1, p2);
        assert!(p1.contains(&base));
        assert!(!p1.contains('X'));
    }

    #[test]
    fn test_section_prompt_limit_and_name() {
        let text = format!("{}TAIL", "b".repeat(3000));
        let prompt = build_section_prompt(&text, "Plumbing Systems", SECTION_CONTEXT_CHARS);
        assert!(!prompt.contains("TAIL"));
        assert!(prompt.contains("Focus specifically on Plumbing Systems"));
        assert!(prompt.contains(r#""section": "Plumbing Systems""#));
        assert!(prompt.contains("severity_assessment"));
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }
}

//! Fixed inspection vocabulary: the sections analyzed one by one, and the
//! risk-category keyword table.

/// Sections analyzed before the aggregate assessment, in processing order.
pub const SECTIONS: [&str; 8] = [
    "Structural Assessment",
    "Electrical Systems",
    "Plumbing Systems",
    "HVAC Systems",
    "Safety Concerns",
    "Environmental Issues",
    "Accessibility",
    "Property Condition",
];

pub struct RiskCategory {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

pub const RISK_CATEGORIES: &[RiskCategory] = &[
    RiskCategory {
        name: "Structural Issues",
        keywords: &["foundation", "crack", "settlement", "structural", "beam", "column", "load bearing"],
    },
    RiskCategory {
        name: "Electrical Hazards",
        keywords: &["electrical", "wiring", "outlet", "circuit", "breaker", "voltage", "amperage"],
    },
    RiskCategory {
        name: "Plumbing Problems",
        keywords: &["plumbing", "pipe", "leak", "water damage", "drain", "sewer", "mold"],
    },
    RiskCategory {
        name: "Roofing Issues",
        keywords: &["roof", "shingle", "gutter", "drainage", "water intrusion", "ceiling stain"],
    },
    RiskCategory {
        name: "HVAC Concerns",
        keywords: &["hvac", "heating", "cooling", "ventilation", "duct", "furnace", "ac"],
    },
    RiskCategory {
        name: "Safety Violations",
        keywords: &["safety", "code violation", "fire hazard", "smoke detector", "carbon monoxide"],
    },
    RiskCategory {
        name: "Environmental Hazards",
        keywords: &["asbestos", "lead", "radon", "mold", "water damage", "environmental"],
    },
    RiskCategory {
        name: "Accessibility Issues",
        keywords: &["accessibility", "ada", "ramp", "handrail", "door width", "bathroom"],
    },
    RiskCategory {
        name: "Property Condition",
        keywords: &["deferred maintenance", "wear", "deterioration", "age", "condition"],
    },
];

/// Keyword hits per category, in table order, skipping categories with none.
///
/// Matching is on whole words (or whole phrases) so that short keywords such
/// as "ac" or "ada" do not fire inside longer words. Used for diagnostics
/// only; results do not depend on it.
pub fn scan_keywords(text: &str) -> Vec<(&'static str, usize)> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();

    RISK_CATEGORIES
        .iter()
        .filter_map(|category| {
            let hits: usize = category
                .keywords
                .iter()
                .map(|keyword| count_phrase(&words, keyword))
                .sum();
            (hits > 0).then_some((category.name, hits))
        })
        .collect()
}

fn count_phrase(words: &[String], phrase: &str) -> usize {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    if needle.is_empty() || needle.len() > words.len() {
        return 0;
    }
    words
        .windows(needle.len())
        .filter(|window| window.iter().zip(&needle).all(|(w, n)| w == n))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_fixed_order() {
        assert_eq!(SECTIONS.len(), 8);
        assert_eq!(SECTIONS[0], "Structural Assessment");
        assert_eq!(SECTIONS[3], "HVAC Systems");
        assert_eq!(SECTIONS[7], "Property Condition");
    }

    #[test]
    fn test_scan_keywords_whole_words() {
        let text = "Foundation shows a CRACK near the beam. Water damage and mold in the basement. \
                    The academy roof is fine.";
        let hits = scan_keywords(text);

        assert_eq!(hits[0], ("Structural Issues", 3));
        assert!(hits.contains(&("Plumbing Problems", 2)));
        assert!(hits.contains(&("Environmental Hazards", 2)));
        assert!(hits.contains(&("Roofing Issues", 1)));
        // "academy" must not count as "ac" or "ada"
        assert!(!hits.iter().any(|(name, _)| *name == "HVAC Concerns"));
        assert!(!hits.iter().any(|(name, _)| *name == "Accessibility Issues"));
    }

    #[test]
    fn test_scan_keywords_empty_text() {
        assert!(scan_keywords("").is_empty());
    }
}

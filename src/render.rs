//! Turns an analysis into the fixed sequence of display sections.
//!
//! Both the TUI and pipe mode draw from the same `Section` list so the two
//! surfaces never disagree about wording or order.

use crate::protocol::{AnalysisResponse, FieldValue};

/// Placeholder for text fields the API did not return.
pub const NOT_AVAILABLE: &str = "N/A";
/// Shown instead of the numbered list when there are no tips.
pub const NO_TIPS: &str = "No improvement tips available.";
/// Banner shown above a successful render.
pub const SUCCESS_BANNER: &str = "Analysis Successful!";
/// Raw panel contents before the first successful request.
pub const NO_RAW_RESPONSE: &str = "No response to display.";

/// A titled block of output lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: &'static str,
    pub lines: Vec<String>,
}

impl Section {
    fn new(title: &'static str, lines: Vec<String>) -> Self {
        Self { title, lines }
    }
}

/// Render an analysis into its five sections, always in the same order.
pub fn render(analysis: &AnalysisResponse) -> Vec<Section> {
    let counts = &analysis.keigo_count;

    let tips = if analysis.improvement_tips.is_empty() {
        vec![NO_TIPS.to_string()]
    } else {
        analysis
            .improvement_tips
            .iter()
            .enumerate()
            .map(|(idx, tip)| format!("{}. {}", idx + 1, tip))
            .collect()
    };

    vec![
        Section::new(
            "Contextual Validity of Keigo",
            vec![
                format!("Valid: {}", or_na(&analysis.contextual_validity_of_keigo)),
                format!("Analysis: {}", or_na(&analysis.contextual_analysis_of_keigo)),
            ],
        ),
        Section::new(
            "Keigo Counts",
            vec![
                format!("Teineigo (Polite): {}", or_zero(&counts.teineigo)),
                format!("Sonkeigo (Respectful): {}", or_zero(&counts.sonkeigo)),
                format!("Kenjougo (Humble): {}", or_zero(&counts.kenjougo)),
            ],
        ),
        Section::new(
            "Keigo Analysis",
            vec![or_na(&analysis.keigo_analysis)],
        ),
        Section::new(
            "Proficiency Level",
            vec![format!("Level: {}", or_na(&analysis.proficiency_level))],
        ),
        Section::new("Improvement Tips", tips),
    ]
}

/// Plain-text form of the sections, used by pipe mode.
pub fn render_text(sections: &[Section]) -> String {
    sections
        .iter()
        .map(|section| {
            let mut block = format!("## {}\n", section.title);
            for line in &section.lines {
                block.push_str(line);
                block.push('\n');
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contents of the raw response panel: pretty JSON when the body parses,
/// the body verbatim otherwise.
pub fn render_raw(raw: Option<&str>) -> String {
    match raw {
        None => NO_RAW_RESPONSE.to_string(),
        Some(body) => serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| serde_json::to_string_pretty(&value).ok())
            .unwrap_or_else(|| body.to_string()),
    }
}

fn or_na(value: &Option<FieldValue>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn or_zero(value: &Option<FieldValue>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "0".to_string())
}

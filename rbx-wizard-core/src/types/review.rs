//! Review report normalization

use serde_json::Value;

pub use rbx_wizard_api::ReviewReport;

const NO_ISSUES: &str = "✅ No issues found!";
const UNEXPECTED_RESPONSE: &str = "Unexpected response from server.";

/// Legacy report sections, in display order: (field, icon, title).
const LEGACY_SECTIONS: [(&str, &str, &str); 4] = [
    ("inconsistencies", "⚠️", "Inconsistencies"),
    ("validator_issues", "🐛", "Validator Issues"),
    ("checker_issues", "🔍", "Checker Issues"),
    ("interactor_issues", "🔄", "Interactor Issues"),
];

/// The report as markdown.
#[must_use]
pub fn report_to_markdown(report: ReviewReport) -> String {
    match report {
        ReviewReport::Markdown(markdown) => markdown,
        ReviewReport::Legacy(value) => legacy_to_markdown(&value),
    }
}

/// Render an issue-list report as one markdown section per non-empty list.
#[must_use]
pub fn legacy_to_markdown(value: &Value) -> String {
    let Some(object) = value.as_object() else {
        return UNEXPECTED_RESPONSE.to_string();
    };

    let mut lines: Vec<String> = Vec::new();
    for (field, icon, title) in LEGACY_SECTIONS {
        let Some(items) = object.get(field).and_then(Value::as_array) else {
            continue;
        };
        if items.is_empty() {
            continue;
        }
        lines.push(format!("## {icon} {title}"));
        lines.push(String::new());
        for item in items {
            match item {
                Value::String(text) => lines.push(format!("- {text}")),
                other => lines.push(format!("- {other}")),
            }
        }
        lines.push(String::new());
    }

    if lines.is_empty() {
        return NO_ISSUES.to_string();
    }
    lines.join("\n")
}

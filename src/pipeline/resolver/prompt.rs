use std::sync::LazyLock;

use regex::Regex;

use crate::models::{title_case, InteractionFinding, Medication, PatientContext};

pub const INTERACTION_SYSTEM_PROMPT: &str = r#"
You are a medication safety assistant. You review a list of medications for
possible drug-drug interactions and summarise them for a patient.

RULES:
1. Mention every medication pair with a known interaction and its risk level.
2. Use plain language. Do not diagnose.
3. Take the patient context into account when it is provided.
4. Always end by advising the patient to consult their healthcare provider.
"#;

/// Fixed narrative for lists with fewer than two medications.
pub const INSUFFICIENT_MEDICATIONS: &str =
    "At least two medications are required for an interaction analysis.";

const CONSULT_PROVIDER: &str =
    "Always consult with your healthcare provider before making medication changes.";

const BASIC_ANALYSIS_DISCLAIMER: &str =
    "This is a basic analysis. Always consult with your healthcare provider.";

/// Build the generative prompt for a medication list and optional context.
pub fn build_interaction_prompt(
    medications: &[Medication],
    context: Option<&PatientContext>,
) -> String {
    let names = medications
        .iter()
        .map(Medication::label)
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = format!("Analyze drug interactions for: {names}.\n");

    if let Some(ctx) = context.filter(|c| !c.is_empty()) {
        prompt.push_str("\n<patient_context>\n");
        if let Some(age) = ctx.age {
            prompt.push_str(&format!("Age: {age}\n"));
        }
        push_field(&mut prompt, "Allergies", &ctx.allergies);
        push_field(&mut prompt, "Chronic conditions", &ctx.chronic_conditions);
        push_field(&mut prompt, "Current medications", &ctx.current_medications);
        prompt.push_str("</patient_context>\n");
    }

    prompt.push_str("\nProvide warnings and recommendations:");
    prompt
}

fn push_field(prompt: &mut String, label: &str, value: &Option<String>) {
    if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        prompt.push_str(&format!("{label}: {value}\n"));
    }
}

/// Deterministic narrative built from knowledge-base findings.
pub fn knowledge_narrative(medications: &[Medication], findings: &[InteractionFinding]) -> String {
    if findings.is_empty() {
        let names = medications
            .iter()
            .map(|m| title_case(&m.name))
            .collect::<Vec<_>>()
            .join(", ");
        return format!("No known interactions found for: {names}\n\n{BASIC_ANALYSIS_DISCLAIMER}");
    }

    let warnings = findings
        .iter()
        .map(|f| {
            format!(
                "{} + {}: {}",
                title_case(&f.med1),
                title_case(&f.med2),
                f.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("Drug Interaction Analysis:\n\n{warnings}\n\n{CONSULT_PROVIDER}")
}

/// Strip model artifacts (`<unusedN>` tokens, surrounding whitespace).
pub fn clean_generated(raw: &str) -> String {
    static UNUSED_TOKEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<unused\d+>").expect("valid regex"));
    UNUSED_TOKEN_RE.replace_all(raw, "").trim().to_string()
}

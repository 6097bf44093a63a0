//! Prompt templates and response schemas.
//!
//! Templates are fixed; only the proposal text, the candidate list and the
//! requested counts are interpolated. The schemas are sent as Gemini
//! `responseSchema` values so the provider constrains the output shape.

use serde_json::{json, Value};

use crate::{KeywordRequest, RankingRequest};

/// Themes offered to the model as examples of searchable terms.
pub const SUGGESTED_THEMES: &[&str] = &[
    "data privacy",
    "model deployment",
    "training data",
    "supply chain",
    "model governance",
    "access control",
    "data poisoning",
    "model bias",
    "compliance",
    "third party",
];

const CLARIFICATION: &str = "\
IMPORTANT: Your previous reply could not be parsed. Reply with a single JSON \
object that matches the required format exactly. Do not wrap it in markdown \
and do not add any other text.";

/// Prompt for keyword extraction.
pub fn keyword_prompt(request: &KeywordRequest) -> String {
    let max = request.max_keywords.max(1);
    let min = max.min(3);
    let themes = SUGGESTED_THEMES
        .iter()
        .map(|t| format!("- {t}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "You are an AI/ML security risk assessor. Analyze the proposal below and \
extract the key risk themes relevant to an AI/ML security assessment.

PROPOSAL:
{text}

INSTRUCTIONS:
1. Identify the main AI/ML use case described.
2. Extract {min} to {max} risk themes relevant to this kind of system.
3. Focus on security, privacy, governance and operational risks.
4. Use short, specific, searchable terms (one to three words each).

THEMES TO CONSIDER:
{themes}

Return a JSON object of the form {{\"keywords\": [\"theme\", ...], \"confidence\": 0.0-1.0}}.",
        text = request.text,
    );
    if request.reprompt {
        prompt.push_str("\n\n");
        prompt.push_str(CLARIFICATION);
    }
    prompt
}

/// Prompt for ranking candidate risks.
pub fn ranking_prompt(request: &RankingRequest) -> String {
    let candidates = request
        .candidates
        .iter()
        .map(|c| format!("- {}: {}", c.risk_id, c.title))
        .collect::<Vec<_>>()
        .join("\n");
    let n = request.top_n;

    let mut prompt = format!(
        "You are an AI/ML security risk assessor. Select the {n} candidate risks \
most relevant to the proposal below and rank them.

PROPOSAL:
{text}

CANDIDATE RISKS:
{candidates}

INSTRUCTIONS:
1. Consider the use case, data sources, deployment approach and security measures.
2. Judge the likelihood and impact of each candidate risk for this proposal.
3. Select at most {n} risks, ranked from 1 (most relevant).
4. Use risk IDs exactly as listed above. Do not invent IDs.
5. Give a rationale of at least two sentences for each selected risk.

Return a JSON object of the form \
{{\"risks\": [{{\"risk_id\": \"...\", \"rank\": 1, \"rationale\": \"...\"}}]}}.",
        text = request.text,
    );
    if request.reprompt {
        prompt.push_str("\n\n");
        prompt.push_str(CLARIFICATION);
    }
    prompt
}

/// `responseSchema` for keyword extraction.
pub fn keyword_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "keywords": {"type": "ARRAY", "items": {"type": "STRING"}},
            "confidence": {"type": "NUMBER"}
        },
        "required": ["keywords"]
    })
}

/// `responseSchema` for ranking.
pub fn ranking_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "risks": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "risk_id": {"type": "STRING"},
                        "rank": {"type": "INTEGER"},
                        "rationale": {"type": "STRING"}
                    },
                    "required": ["risk_id", "rank", "rationale"]
                }
            }
        },
        "required": ["risks"]
    })
}

//! # Output Validation
//!
//! The trust boundary between model output and the assessment result. A
//! ranking payload is untrusted; [`validate_ranking`] turns it into ranked
//! risks that are guaranteed to:
//!
//! - name only members of the assessment's [`CandidateSet`],
//! - contain no identifier twice,
//! - number at most `top_n`, with ranks `1..=k` and no gaps.
//!
//! This module performs no I/O and never logs entry contents.

use std::collections::HashSet;

use riskgate_core::{CandidateSet, RankedRisk, RiskId};
use riskgate_llm::{RankingPayload, RawRankedRisk};

/// Longest rationale kept, in characters.
pub const MAX_RATIONALE_CHARS: usize = 2_000;

/// Why a ranked entry was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionKind {
    MalformedIdentifier,
    NotInCandidates,
    Duplicate,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedIdentifier => "malformed_identifier",
            Self::NotInCandidates => "not_in_candidates",
            Self::Duplicate => "duplicate",
        }
    }
}

/// One dropped entry, identified by its position in the model response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub position: usize,
    pub kind: RejectionKind,
}

/// Outcome of validating one ranking payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Accepted entries, ranks compacted to `1..=k`.
    pub ranked: Vec<RankedRisk>,
    pub rejections: Vec<Rejection>,
    /// Valid entries beyond `top_n`. Not counted as rejections.
    pub surplus: usize,
    /// Number of entries in the payload.
    pub total: usize,
    /// Set when the ranking should be treated as degraded.
    pub degraded: Option<String>,
}

impl ValidationReport {
    pub fn rejected(&self) -> usize {
        self.rejections.len()
    }

    pub fn count(&self, kind: RejectionKind) -> usize {
        self.rejections.iter().filter(|r| r.kind == kind).count()
    }
}

/// Validate a ranking against the candidate set.
///
/// Entries are processed in model-rank order; entries with no usable rank
/// (missing or zero) sort after ranked ones, and ties keep response order.
pub fn validate_ranking(
    payload: &RankingPayload,
    candidates: &CandidateSet,
    top_n: usize,
    max_rejected_fraction: f64,
) -> ValidationReport {
    let total = payload.risks.len();

    let mut order: Vec<(usize, &RawRankedRisk)> = payload.risks.iter().enumerate().collect();
    order.sort_by_key(|(position, entry)| {
        let rank = entry.rank.filter(|r| *r > 0).unwrap_or(u32::MAX);
        (rank, *position)
    });

    let mut seen: HashSet<RiskId> = HashSet::new();
    let mut accepted: Vec<(RiskId, String)> = Vec::new();
    let mut rejections = Vec::new();
    let mut surplus = 0;

    for (position, entry) in order {
        let id = match RiskId::new(entry.risk_id.trim()) {
            Ok(id) => id,
            Err(_) => {
                rejections.push(Rejection {
                    position,
                    kind: RejectionKind::MalformedIdentifier,
                });
                continue;
            }
        };
        if !candidates.contains(&id) {
            rejections.push(Rejection {
                position,
                kind: RejectionKind::NotInCandidates,
            });
            continue;
        }
        if !seen.insert(id.clone()) {
            rejections.push(Rejection {
                position,
                kind: RejectionKind::Duplicate,
            });
            continue;
        }
        if accepted.len() >= top_n {
            surplus += 1;
            continue;
        }
        let rationale = sanitize_rationale(entry.rationale.as_deref().unwrap_or_default());
        accepted.push((id, rationale));
    }

    let ranked: Vec<RankedRisk> = accepted
        .into_iter()
        .enumerate()
        .map(|(i, (risk_id, rationale))| RankedRisk {
            risk_id,
            rank: (i + 1) as u32,
            rationale,
        })
        .collect();

    let rejected = rejections.len();
    let degraded = if total > 0 && ranked.is_empty() {
        Some(format!(
            "all {total} ranked entries were rejected by validation"
        ))
    } else if total > 0 && (rejected as f64 / total as f64) > max_rejected_fraction {
        Some(format!(
            "{rejected} of {total} ranked entries were rejected by validation"
        ))
    } else {
        None
    };

    ValidationReport {
        ranked,
        rejections,
        surplus,
        total,
        degraded,
    }
}

/// Trim, replace control whitespace with spaces, drop other control
/// characters, and cap at [`MAX_RATIONALE_CHARS`].
pub fn sanitize_rationale(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter_map(|c| match c {
            '\n' | '\r' | '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();
    cleaned
        .trim()
        .chars()
        .take(MAX_RATIONALE_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

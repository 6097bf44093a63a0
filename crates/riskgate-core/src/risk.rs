//! # Registry Records and Candidate Sets
//!
//! [`RiskRecord`] and [`Control`] are owned by the external registry and
//! treated as read-only. A [`CandidateSet`] is the bounded pool gathered for
//! one assessment; every [`RankedRisk`] in a result must name a member of it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::identity::{ControlId, RiskId};

/// A risk as published by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub id: RiskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Search terms the registry associates with this risk.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

/// A mitigating control as published by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub id: ControlId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Risks this control mitigates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risk_ids: Vec<RiskId>,
}

/// A ranked risk selection: identifier, 1-based rank, and the model's
/// stated rationale (sanitized).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedRisk {
    pub risk_id: RiskId,
    pub rank: u32,
    pub rationale: String,
}

/// Bounded, deduplicated, ordered set of candidate risks for one assessment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    records: Vec<RiskRecord>,
    index: HashMap<RiskId, usize>,
}

impl CandidateSet {
    /// Build a candidate set from records already in priority order.
    ///
    /// Later duplicates of an identifier are dropped and the result is
    /// truncated to `max` entries.
    pub fn new(records: impl IntoIterator<Item = RiskRecord>, max: usize) -> Self {
        let mut set = Self::default();
        for record in records {
            if set.records.len() >= max {
                break;
            }
            if set.index.contains_key(&record.id) {
                continue;
            }
            set.index.insert(record.id.clone(), set.records.len());
            set.records.push(record);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &RiskId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &RiskId) -> Option<&RiskRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RiskRecord> {
        self.records.iter()
    }

    /// Identifiers in candidate order.
    pub fn ids(&self) -> impl Iterator<Item = &RiskId> {
        self.records.iter().map(|r| &r.id)
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a RiskRecord;
    type IntoIter = std::slice::Iter<'a, RiskRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> RiskRecord {
        RiskRecord {
            id: RiskId::new(id).unwrap(),
            title: format!("title {id}"),
            description: String::new(),
            keywords: vec![],
        }
    }

    #[test]
    fn candidate_set_dedupes_keeping_first() {
        let mut dup = record("R.AIR.001");
        dup.title = "second copy".into();
        let set = CandidateSet::new(vec![record("R.AIR.001"), record("R.AIR.002"), dup], 10);
        assert_eq!(set.len(), 2);
        let first = set.get(&RiskId::new("R.AIR.001").unwrap()).unwrap();
        assert_eq!(first.title, "title R.AIR.001");
    }

    #[test]
    fn candidate_set_truncates_at_max() {
        let set = CandidateSet::new(
            (1..=5).map(|i| record(&format!("R.AIR.00{i}"))),
            3,
        );
        let ids: Vec<&str> = set.ids().map(RiskId::as_str).collect();
        assert_eq!(ids, vec!["R.AIR.001", "R.AIR.002", "R.AIR.003"]);
        assert!(!set.contains(&RiskId::new("R.AIR.004").unwrap()));
    }

    #[test]
    fn candidate_set_duplicates_do_not_consume_capacity() {
        let set = CandidateSet::new(
            vec![record("R.AIR.001"), record("R.AIR.001"), record("R.AIR.002")],
            2,
        );
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn risk_record_rejects_bad_identifier_on_deserialize() {
        let bad = serde_json::json!({"id": "risk-1", "title": "x"});
        assert!(serde_json::from_value::<RiskRecord>(bad).is_err());
        let good = serde_json::json!({"id": "R.AIR.001", "title": "x"});
        let rec: RiskRecord = serde_json::from_value(good).unwrap();
        assert!(rec.keywords.is_empty());
    }
}

//! In-memory storage backend using DashMap.
//!
//! Risks and controls are keyed by identifier. Each row keeps its catalog
//! position so search results come back in catalog order regardless of
//! map iteration order.

use std::sync::Arc;

use dashmap::DashMap;

use riskgate_core::{Control, ControlId, RiskId, RiskRecord};
use riskgate_registry::http::{Relationship, SearchHit, RISK_CONTROL};
use riskgate_registry::memory::risk_matches;
use riskgate_registry::Catalog;

struct Inner {
    risks: DashMap<RiskId, (usize, RiskRecord)>,
    controls: DashMap<ControlId, (usize, Control)>,
    /// risk → controls, in catalog order of the controls.
    links: DashMap<RiskId, Vec<ControlId>>,
}

/// Shared registry state.
///
/// Cheaply cloneable via `Arc`; all clones share the same data.
#[derive(Clone)]
pub struct StubStore {
    inner: Arc<Inner>,
}

impl StubStore {
    pub fn from_catalog(catalog: Catalog) -> Self {
        let inner = Inner {
            risks: DashMap::new(),
            controls: DashMap::new(),
            links: DashMap::new(),
        };
        for (pos, risk) in catalog.risks.into_iter().enumerate() {
            inner.risks.insert(risk.id.clone(), (pos, risk));
        }
        for (pos, control) in catalog.controls.into_iter().enumerate() {
            for risk_id in &control.risk_ids {
                inner
                    .links
                    .entry(risk_id.clone())
                    .or_default()
                    .push(control.id.clone());
            }
            inner.controls.insert(control.id.clone(), (pos, control));
        }
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn builtin() -> Self {
        Self::from_catalog(Catalog::builtin())
    }

    pub fn risk_count(&self) -> usize {
        self.inner.risks.len()
    }

    pub fn control_count(&self) -> usize {
        self.inner.controls.len()
    }

    pub fn risk(&self, id: &RiskId) -> Option<RiskRecord> {
        self.inner.risks.get(id).map(|entry| entry.value().1.clone())
    }

    /// Search rows for `q`: matching risks first, then matching controls,
    /// each in catalog order.
    pub fn search(&self, q: &str) -> Vec<SearchHit> {
        let needle = q.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut risks: Vec<(usize, RiskRecord)> = self
            .inner
            .risks
            .iter()
            .filter(|entry| risk_matches(&entry.value().1, &needle))
            .map(|entry| entry.value().clone())
            .collect();
        risks.sort_by_key(|(pos, _)| *pos);

        let mut controls: Vec<(usize, Control)> = self
            .inner
            .controls
            .iter()
            .filter(|entry| {
                let control = &entry.value().1;
                control.title.to_lowercase().contains(&needle)
                    || control
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .map(|entry| entry.value().clone())
            .collect();
        controls.sort_by_key(|(pos, _)| *pos);

        risks
            .into_iter()
            .map(|(_, r)| SearchHit {
                kind: "risk".to_string(),
                id: r.id.to_string(),
                title: r.title,
                description: r.description,
                keywords: r.keywords,
            })
            .chain(controls.into_iter().map(|(_, c)| SearchHit {
                kind: "control".to_string(),
                id: c.id.to_string(),
                title: c.title,
                description: c.description.unwrap_or_default(),
                keywords: Vec::new(),
            }))
            .collect()
    }

    /// `risk_control` rows for each requested risk, in request order.
    /// Unknown identifiers yield no rows.
    pub fn relationships(&self, risk_ids: &[RiskId]) -> Vec<Relationship> {
        let mut rows = Vec::new();
        for risk_id in risk_ids {
            let Some(linked) = self.inner.links.get(risk_id) else {
                continue;
            };
            for control_id in linked.value() {
                let Some(control) = self.inner.controls.get(control_id) else {
                    continue;
                };
                let control = &control.value().1;
                rows.push(Relationship {
                    source_id: risk_id.to_string(),
                    target_id: control.id.to_string(),
                    relationship_type: RISK_CONTROL.to_string(),
                    target_title: Some(control.title.clone()),
                    target_description: control.description.clone(),
                });
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(s: &str) -> RiskId {
        RiskId::new(s).unwrap()
    }

    #[test]
    fn search_returns_risks_in_catalog_order() {
        let store = StubStore::builtin();
        let ids: Vec<_> = store
            .search("Chatbot")
            .into_iter()
            .filter(|h| h.kind == "risk")
            .map(|h| h.id)
            .collect();
        assert_eq!(ids, vec!["R.AIR.006", "R.AIR.007"]);
    }

    #[test]
    fn blank_query_matches_nothing() {
        assert!(StubStore::builtin().search("   ").is_empty());
    }

    #[test]
    fn relationships_follow_control_links() {
        let store = StubStore::builtin();
        let rows = store.relationships(&[rid("R.AIR.001")]);
        let targets: Vec<_> = rows.iter().map(|r| r.target_id.as_str()).collect();
        assert_eq!(targets, vec!["C.AIIM.1", "C.AIIM.3", "C.DATA.1"]);
        assert!(rows.iter().all(|r| r.relationship_type == RISK_CONTROL));
        assert!(rows.iter().all(|r| r.source_id == "R.AIR.001"));
    }

    #[test]
    fn unknown_risk_has_no_relationships() {
        let store = StubStore::builtin();
        assert!(store.relationships(&[rid("R.AIR.999")]).is_empty());
        assert!(store.risk(&rid("R.AIR.999")).is_none());
    }

    #[test]
    fn counts_match_catalog() {
        let catalog = Catalog::builtin();
        let store = StubStore::from_catalog(catalog.clone());
        assert_eq!(store.risk_count(), catalog.risks.len());
        assert_eq!(store.control_count(), catalog.controls.len());
    }
}

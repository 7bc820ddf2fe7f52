use std::collections::HashMap;

use crate::types::{ContentId, ContentRecord};

/// Index of cross-references between content records.
///
/// Built once per aggregation pass: one linear scan records an edge from every
/// candidate carrying a `reference_content_id` to its target. Lookups are then
/// constant-time, replacing the per-record array scans of a naive approach.
///
/// Dangling edges (targets no candidate resolves to) are kept but are inert:
/// suppression queries are made by resolved release id, so an edge to a
/// non-existent id never matches anything.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    referrers: HashMap<ContentId, Vec<ContentId>>,
}

impl ReferenceGraph {
    pub fn build(candidates: &[ContentRecord]) -> Self {
        let mut referrers: HashMap<ContentId, Vec<ContentId>> = HashMap::new();
        for candidate in candidates {
            if let Some(target) = candidate.reference_content_id() {
                referrers
                    .entry(target.to_string())
                    .or_default()
                    .push(candidate.id().to_string());
            }
        }
        Self { referrers }
    }

    /// Whether any candidate references `target`.
    pub fn is_referenced(&self, target: &str) -> bool {
        self.referrers.contains_key(target)
    }

    /// Ids of the records referencing `target`, in input order.
    pub fn referrers(&self, target: &str) -> &[ContentId] {
        self.referrers.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.referrers.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PostRecord, ReleaseRecord};
    use chrono::{TimeZone, Utc};

    fn dt(ts: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(ts, 0).single().unwrap()
    }

    #[test]
    fn indexes_referrers_by_target() {
        let candidates = vec![
            ContentRecord::Release(ReleaseRecord::new("c1", "hub-a", "r1", dt(100))),
            ContentRecord::Post(PostRecord::new("c2", "hub-a", "p1", dt(200)).referencing("r1")),
            ContentRecord::Post(PostRecord::new("c3", "hub-a", "p2", dt(300)).referencing("r1")),
        ];
        let graph = ReferenceGraph::build(&candidates);

        assert!(graph.is_referenced("r1"));
        assert_eq!(graph.referrers("r1"), ["c2".to_string(), "c3".to_string()]);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn unreferenced_targets_are_absent() {
        let candidates = vec![ContentRecord::Release(ReleaseRecord::new(
            "c1",
            "hub-a",
            "r1",
            dt(100),
        ))];
        let graph = ReferenceGraph::build(&candidates);

        assert!(!graph.is_referenced("r1"));
        assert!(graph.referrers("r1").is_empty());
    }

    #[test]
    fn dangling_edges_are_inert() {
        let candidates = vec![
            ContentRecord::Release(ReleaseRecord::new("c1", "hub-a", "r1", dt(100))),
            ContentRecord::Post(
                PostRecord::new("c2", "hub-a", "p1", dt(200)).referencing("r-missing"),
            ),
        ];
        let graph = ReferenceGraph::build(&candidates);

        // The edge exists but suppresses nothing that actually resolves.
        assert!(!graph.is_referenced("r1"));
        assert!(graph.is_referenced("r-missing"));
    }
}

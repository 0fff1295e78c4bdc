//! Container state reconciliation
//!
//! Diffs each observed container listing against the containers tracked
//! from the previous poll, identifying containers by id only.

use crate::models::{ContainerRecord, Transition};
use tracing::debug;

/// Containers believed to be running as of the last reconciliation
///
/// Holds at most one record per id, in the order they were first seen.
#[derive(Debug, Default, Clone)]
pub struct TrackedSet {
    records: Vec<ContainerRecord>,
}

impl TrackedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Linear scan; hosts run tens to low hundreds of containers
    pub fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&ContainerRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContainerRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Owns the tracked set and turns observations into transitions
#[derive(Debug, Default)]
pub struct Reconciler {
    tracked: TrackedSet,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracked(&self) -> &TrackedSet {
        &self.tracked
    }

    /// Bring the tracked set in line with `observed`
    ///
    /// Returns a `Started` transition for every id that is new and a
    /// `Stopped` transition for every tracked id that is no longer observed,
    /// starts first. Other attributes never affect identity.
    pub fn reconcile(&mut self, observed: &[ContainerRecord]) -> Vec<Transition> {
        let mut transitions = Vec::new();

        for record in observed {
            if !self.tracked.contains(&record.id) {
                self.tracked.records.push(record.clone());
                transitions.push(Transition::started(record.clone()));
            }
        }

        let (still_running, gone): (Vec<_>, Vec<_>) = std::mem::take(&mut self.tracked.records)
            .into_iter()
            .partition(|tracked| observed.iter().any(|o| o.id == tracked.id));
        self.tracked.records = still_running;
        transitions.extend(gone.into_iter().map(Transition::stopped));

        debug!(
            observed = observed.len(),
            tracked = self.tracked.len(),
            transitions = transitions.len(),
            "Reconciled container set"
        );

        transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransitionKind;

    fn record(id: &str, names: &str) -> ContainerRecord {
        ContainerRecord {
            id: id.to_string(),
            command: "sleep infinity".to_string(),
            image: "alpine:3.19".to_string(),
            names: names.to_string(),
            status: "Up".to_string(),
            created_at: "2024-01-01 10:00:00 +0000 UTC".to_string(),
            started_at: None,
        }
    }

    fn ids(set: &TrackedSet) -> Vec<&str> {
        let mut ids: Vec<&str> = set.ids().collect();
        ids.sort_unstable();
        ids
    }

    fn summary(transitions: &[Transition]) -> Vec<(TransitionKind, &str)> {
        transitions
            .iter()
            .map(|t| (t.kind, t.record.id.as_str()))
            .collect()
    }

    #[test]
    fn test_start_stop_scenario() {
        let mut reconciler = Reconciler::new();

        let transitions = reconciler.reconcile(&[record("c1", "web"), record("c2", "db")]);
        assert_eq!(
            summary(&transitions),
            vec![(TransitionKind::Started, "c1"), (TransitionKind::Started, "c2")]
        );
        assert_eq!(ids(reconciler.tracked()), vec!["c1", "c2"]);

        let transitions = reconciler.reconcile(&[record("c2", "db")]);
        assert_eq!(summary(&transitions), vec![(TransitionKind::Stopped, "c1")]);
        assert_eq!(transitions[0].record.names, "web");
        assert_eq!(ids(reconciler.tracked()), vec!["c2"]);

        let transitions = reconciler.reconcile(&[record("c2", "db"), record("c3", "cache")]);
        assert_eq!(summary(&transitions), vec![(TransitionKind::Started, "c3")]);
        assert_eq!(ids(reconciler.tracked()), vec!["c2", "c3"]);
    }

    #[test]
    fn test_same_observation_twice_is_quiet() {
        let mut reconciler = Reconciler::new();
        let observed = vec![record("a", "one"), record("b", "two")];

        assert_eq!(reconciler.reconcile(&observed).len(), 2);
        assert!(reconciler.reconcile(&observed).is_empty());
    }

    #[test]
    fn test_order_within_observation_is_irrelevant() {
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(&[record("a", "one"), record("b", "two"), record("c", "three")]);

        let transitions =
            reconciler.reconcile(&[record("c", "three"), record("a", "one"), record("b", "two")]);
        assert!(transitions.is_empty());
        assert_eq!(ids(reconciler.tracked()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_removing_adjacent_records() {
        // every tracked record disappears at once; none may be skipped
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(&[record("a", "1"), record("b", "2"), record("c", "3")]);

        let transitions = reconciler.reconcile(&[]);
        assert_eq!(
            summary(&transitions),
            vec![
                (TransitionKind::Stopped, "a"),
                (TransitionKind::Stopped, "b"),
                (TransitionKind::Stopped, "c"),
            ]
        );
        assert!(reconciler.tracked().is_empty());
    }

    #[test]
    fn test_stopped_container_is_not_also_started() {
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(&[record("a", "one"), record("b", "two")]);

        let transitions = reconciler.reconcile(&[record("b", "two")]);
        let for_a: Vec<_> = transitions.iter().filter(|t| t.record.id == "a").collect();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].kind, TransitionKind::Stopped);
    }

    #[test]
    fn test_new_id_with_identical_attributes_is_started() {
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(&[record("old", "web")]);

        // restarted container: same name and image, new id
        let transitions = reconciler.reconcile(&[record("new", "web")]);
        assert_eq!(
            summary(&transitions),
            vec![(TransitionKind::Started, "new"), (TransitionKind::Stopped, "old")]
        );
    }

    #[test]
    fn test_attribute_changes_do_not_cause_transitions() {
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(&[record("a", "one")]);

        let mut changed = record("a", "one");
        changed.status = "Up 5 minutes (healthy)".to_string();
        assert!(reconciler.reconcile(&[changed]).is_empty());
        assert_eq!(reconciler.tracked().get("a").unwrap().status, "Up");
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let mut reconciler = Reconciler::new();

        let transitions = reconciler.reconcile(&[record("a", "first"), record("a", "second")]);
        assert_eq!(transitions.len(), 1);
        assert_eq!(reconciler.tracked().len(), 1);
        assert_eq!(reconciler.tracked().get("a").unwrap().names, "first");
    }

    #[test]
    fn test_tracked_matches_every_observation() {
        let observations: Vec<Vec<&str>> = vec![
            vec!["a", "b"],
            vec!["b", "c", "d"],
            vec![],
            vec!["d", "a"],
            vec!["a", "d", "e", "f"],
            vec!["f"],
        ];

        let mut reconciler = Reconciler::new();
        for ids_now in observations {
            let observed: Vec<_> = ids_now.iter().map(|id| record(id, id)).collect();
            reconciler.reconcile(&observed);

            let mut expected = ids_now.clone();
            expected.sort_unstable();
            assert_eq!(ids(reconciler.tracked()), expected);
        }
    }
}

// ── Recommendation change detection ──
//
// The store remembers which recommendations were active after the last
// successful fetch. Diffing a fresh fetch against it yields the next store
// and the ids that became active since, each reported exactly once.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use poolsync_api::Recommendation;

/// Active recommendations of one device: id → `"{title}: {message}"`.
///
/// Keeps first-seen order for display. Equality ignores order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationStore(IndexMap<String, String>);

impl RecommendationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    /// Insert or overwrite. An existing id keeps its position.
    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.0.insert(id.into(), text.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RecommendationStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (id, text) in iter {
            store.insert(id, text);
        }
        store
    }
}

/// A recommendation that was not active after the previous fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRecommendation {
    pub id: String,
    pub text: String,
}

/// Result of [`diff`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecommendationDiff {
    /// Store to persist for the next cycle.
    pub store: RecommendationStore,
    /// Newly active recommendations, in fetch order.
    pub newly_active: Vec<NewRecommendation>,
}

/// Compare the latest fetch against the previously stored active set.
///
/// Only `waiting` recommendations count. A duplicate id keeps its first
/// position and takes the last text. Recommendations that are no longer
/// active are dropped without an event. `None` behaves like an empty fetch.
pub fn diff(current: Option<&[Recommendation]>, previous: &RecommendationStore) -> RecommendationDiff {
    let store: RecommendationStore = current
        .unwrap_or_default()
        .iter()
        .filter(|r| r.is_active())
        .map(|r| (r.id.clone(), r.display_text()))
        .collect();

    let newly_active = store
        .iter()
        .filter(|(id, _)| !previous.contains(id))
        .map(|(id, text)| NewRecommendation {
            id: id.to_owned(),
            text: text.to_owned(),
        })
        .collect();

    RecommendationDiff {
        store,
        newly_active,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use poolsync_api::RecommendationStatus;

    use super::*;

    fn rec(id: &str, title: &str, status: RecommendationStatus) -> Recommendation {
        Recommendation {
            id: id.to_owned(),
            title: title.to_owned(),
            message: "m".to_owned(),
            status,
            created_at: None,
            deadline: None,
        }
    }

    fn waiting(id: &str, title: &str) -> Recommendation {
        rec(id, title, RecommendationStatus::Waiting)
    }

    fn ids(diff: &RecommendationDiff) -> Vec<&str> {
        diff.newly_active.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn reports_only_new_ids_and_drops_vanished() {
        let previous: RecommendationStore = [("A", "x"), ("B", "y")].into_iter().collect();
        let current = [waiting("B", "b"), waiting("C", "c")];

        let diff = diff(Some(&current), &previous);

        assert_eq!(ids(&diff), vec!["C"]);
        assert_eq!(diff.newly_active[0].text, "c: m");
        let expected: RecommendationStore = [("B", "b: m"), ("C", "c: m")].into_iter().collect();
        assert_eq!(diff.store, expected);
        assert!(!diff.store.contains("A"));
    }

    #[test]
    fn empty_or_missing_input_clears_store() {
        let previous: RecommendationStore = [("A", "x")].into_iter().collect();

        for current in [None, Some(&[][..])] {
            let diff = diff(current, &previous);
            assert!(diff.store.is_empty());
            assert!(diff.newly_active.is_empty());
        }
    }

    #[test]
    fn inactive_recommendations_are_ignored() {
        let current = [
            rec("1", "done", RecommendationStatus::Other),
            waiting("2", "todo"),
        ];

        let diff = diff(Some(&current), &RecommendationStore::new());

        assert_eq!(ids(&diff), vec!["2"]);
        assert_eq!(diff.store.len(), 1);
    }

    #[test]
    fn feeding_the_store_back_is_silent() {
        let current = [waiting("1", "a"), waiting("2", "b")];
        let first = diff(Some(&current), &RecommendationStore::new());
        assert_eq!(ids(&first), vec!["1", "2"]);

        let second = diff(Some(&current), &first.store);
        assert!(second.newly_active.is_empty());
        assert_eq!(second.store, first.store);
    }

    #[test]
    fn duplicate_ids_keep_first_position_and_last_text() {
        let current = [waiting("1", "first"), waiting("2", "other"), waiting("1", "last")];

        let diff = diff(Some(&current), &RecommendationStore::new());

        assert_eq!(ids(&diff), vec!["1", "2"]);
        assert_eq!(diff.store.get("1"), Some("last: m"));
        assert_eq!(diff.newly_active[0].text, "last: m");
    }

    #[test]
    fn store_equality_ignores_order() {
        let a: RecommendationStore = [("1", "a"), ("2", "b")].into_iter().collect();
        let b: RecommendationStore = [("2", "b"), ("1", "a")].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn store_serializes_as_plain_object() {
        let store: RecommendationStore = [("7", "Shock: add chlorine")].into_iter().collect();
        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(json, r#"{"7":"Shock: add chlorine"}"#);
        let back: RecommendationStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store);
    }
}

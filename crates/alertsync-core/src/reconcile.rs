//! Change computation for a single condition kind.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::id::ConditionId;
use crate::model::{Change, Condition};

/// Computes the changes that turn `current` into `desired`.
///
/// Desired conditions are visited in document order:
///
/// 1. An `id` that does not exist in `current` is stale and is dropped.
/// 2. A condition without an `id` adopts the id of the earliest unconsumed
///    current condition with the same name, if any.
/// 3. The policy association field is stripped from the payload.
/// 4. With an id the result is an `Update`, otherwise a `Create`.
///
/// Every current condition whose id was never used yields a `Delete`,
/// appended in current order after all creates and updates.
///
/// The output depends on input order: among several current conditions
/// sharing a name, the first fetched is matched first.
pub fn reconcile(current: &[Condition], desired: &[Condition]) -> Vec<Change> {
    if current.is_empty() && desired.is_empty() {
        return Vec::new();
    }

    let mut by_id: HashMap<&ConditionId, &Condition> = HashMap::with_capacity(current.len());
    let mut by_name: HashMap<&str, VecDeque<&ConditionId>> = HashMap::new();
    for condition in current {
        match &condition.id {
            Some(id) => {
                by_id.insert(id, condition);
                by_name.entry(condition.name.as_str()).or_default().push_back(id);
            }
            None => tracing::warn!(
                name = %condition.name,
                "ignoring current condition without an id"
            ),
        }
    }

    let mut consumed: HashSet<ConditionId> = HashSet::new();
    let mut changes = Vec::with_capacity(desired.len() + current.len());

    for wanted in desired {
        let mut wanted = wanted.clone();

        if let Some(id) = &wanted.id
            && !by_id.contains_key(id)
        {
            tracing::debug!(%id, name = %wanted.name, "dropping stale condition id");
            wanted.id = None;
        }

        if wanted.id.is_none()
            && let Some(bucket) = by_name.get_mut(wanted.name.as_str())
        {
            while let Some(id) = bucket.pop_front() {
                if !consumed.contains(id) {
                    tracing::debug!(%id, name = %wanted.name, "matched condition by name");
                    wanted.id = Some(id.clone());
                    break;
                }
            }
        }

        wanted.strip_policy_association();

        let matched = wanted.id.as_ref().and_then(|id| by_id.get(id).copied());
        match matched {
            Some(existing) => {
                if let Some(id) = &wanted.id {
                    consumed.insert(id.clone());
                }
                changes.push(Change::Update {
                    current: existing.clone(),
                    desired: wanted,
                });
            }
            None => changes.push(Change::Create { desired: wanted }),
        }
    }

    for condition in current {
        if let Some(id) = &condition.id
            && !consumed.contains(id)
        {
            changes.push(Change::Delete {
                current: condition.clone(),
            });
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChangeAction;
    use serde_json::json;

    fn cond(id: u64, name: &str) -> Condition {
        Condition::new(name).with_id(id)
    }

    fn id(n: u64) -> ConditionId {
        ConditionId::Number(n)
    }

    fn actions(changes: &[Change]) -> Vec<ChangeAction> {
        changes.iter().map(Change::action).collect()
    }

    #[test]
    fn test_empty_inputs_yield_nothing() {
        assert!(reconcile(&[], &[]).is_empty());
    }

    #[test]
    fn test_identical_sets_only_update() {
        let current = vec![
            cond(1, "a").with_attribute("threshold", json!(5)),
            cond(2, "b"),
            cond(3, "c"),
        ];
        let changes = reconcile(&current, &current);

        assert_eq!(actions(&changes), vec![ChangeAction::Update; 3]);
        for (change, original) in changes.iter().zip(&current) {
            assert_eq!(change.current(), Some(original));
            assert_eq!(change.desired(), Some(original));
        }
    }

    #[test]
    fn test_everything_removed_deletes_in_current_order() {
        let current = vec![cond(3, "c"), cond(1, "a"), cond(2, "b")];
        let changes = reconcile(&current, &[]);

        assert_eq!(actions(&changes), vec![ChangeAction::Delete; 3]);
        let ids: Vec<_> = changes.iter().filter_map(Change::target_id).cloned().collect();
        assert_eq!(ids, vec![id(3), id(1), id(2)]);
    }

    #[test]
    fn test_all_new_creates_in_document_order() {
        let desired = vec![Condition::new("x"), Condition::new("y")];
        let changes = reconcile(&[], &desired);

        assert_eq!(actions(&changes), vec![ChangeAction::Create; 2]);
        assert_eq!(changes[0].name(), "x");
        assert_eq!(changes[1].name(), "y");
    }

    #[test]
    fn test_stale_id_behaves_like_missing_id() {
        let current = vec![cond(1, "a")];

        let with_stale = reconcile(&current, &[cond(99, "a")]);
        let without = reconcile(&current, &[Condition::new("a")]);
        assert_eq!(with_stale, without);
        assert_eq!(actions(&with_stale), vec![ChangeAction::Update]);
        assert_eq!(with_stale[0].desired().unwrap().id, Some(1u64.into()));

        let unmatched = reconcile(&current, &[cond(99, "z")]);
        assert_eq!(
            actions(&unmatched),
            vec![ChangeAction::Create, ChangeAction::Delete]
        );
        assert_eq!(unmatched[0].desired().unwrap().id, None);
    }

    #[test]
    fn test_valid_id_wins_over_name() {
        let current = vec![cond(1, "old-name"), cond(2, "new-name")];
        let desired = vec![cond(1, "new-name")];
        let changes = reconcile(&current, &desired);

        assert_eq!(
            actions(&changes),
            vec![ChangeAction::Update, ChangeAction::Delete]
        );
        assert_eq!(changes[0].target_id(), Some(&1u64.into()));
        assert_eq!(changes[1].target_id(), Some(&2u64.into()));
    }

    #[test]
    fn test_duplicate_names_consumed_one_to_one() {
        let current = vec![cond(1, "A"), cond(2, "A")];
        let desired = vec![Condition::new("A"), Condition::new("A"), Condition::new("A")];
        let changes = reconcile(&current, &desired);

        assert_eq!(
            actions(&changes),
            vec![
                ChangeAction::Update,
                ChangeAction::Update,
                ChangeAction::Create
            ]
        );
        assert_eq!(changes[0].desired().unwrap().id, Some(1u64.into()));
        assert_eq!(changes[1].desired().unwrap().id, Some(2u64.into()));
        assert_eq!(changes[2].desired().unwrap().id, None);
    }

    #[test]
    fn test_name_match_skips_ids_claimed_explicitly() {
        let current = vec![cond(1, "A"), cond(2, "A")];
        let desired = vec![cond(1, "A"), Condition::new("A")];
        let changes = reconcile(&current, &desired);

        assert_eq!(
            actions(&changes),
            vec![ChangeAction::Update, ChangeAction::Update]
        );
        assert_eq!(changes[1].desired().unwrap().id, Some(2u64.into()));
    }

    #[test]
    fn test_unmatched_currents_deleted_exactly_once() {
        let current = vec![cond(1, "a"), cond(2, "b"), cond(3, "b"), cond(4, "c")];
        let desired = vec![Condition::new("b"), cond(4, "renamed")];
        let changes = reconcile(&current, &desired);

        let deleted: Vec<_> = changes
            .iter()
            .filter(|c| c.action() == ChangeAction::Delete)
            .filter_map(Change::target_id)
            .cloned()
            .collect();
        assert_eq!(deleted, vec![id(1), id(3)]);
        assert_eq!(changes.len(), 4);
    }

    #[test]
    fn test_policy_association_is_stripped() {
        let current = vec![cond(1, "disk").with_attribute("policy_id", json!(7))];
        let desired = vec![
            Condition::new("disk").with_attribute("policy_id", json!(7)),
            Condition::new("mem").with_attribute("policy_id", json!(7)),
        ];
        let changes = reconcile(&current, &desired);

        for change in &changes {
            assert!(!change.desired().unwrap().attributes.contains_key("policy_id"));
        }
        assert!(changes[0].current().unwrap().attributes.contains_key("policy_id"));
    }

    #[test]
    fn test_update_then_create_scenario() {
        let current = vec![cond(9, "cpu-high")];
        let desired = vec![
            Condition::new("cpu-high").with_attribute("threshold", json!(90)),
            Condition::new("mem-high").with_attribute("threshold", json!(80)),
        ];
        let changes = reconcile(&current, &desired);

        assert_eq!(
            changes,
            vec![
                Change::Update {
                    current: cond(9, "cpu-high"),
                    desired: cond(9, "cpu-high").with_attribute("threshold", json!(90)),
                },
                Change::Create {
                    desired: Condition::new("mem-high").with_attribute("threshold", json!(80)),
                },
            ]
        );
    }

    #[test]
    fn test_output_is_deterministic() {
        let current = vec![cond(1, "a"), cond(2, "a"), cond(3, "b")];
        let desired = vec![Condition::new("a"), Condition::new("c"), cond(3, "b")];
        assert_eq!(reconcile(&current, &desired), reconcile(&current, &desired));
    }
}

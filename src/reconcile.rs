use crate::record::{ObjectId, SceneObject};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// What one reconciliation pass did, for logging and assertions.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReconcileReport {
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
    /// Structural changes: destroyed and recreated within the pass.
    pub rebuilt: usize,
    /// Records waiting on a shared resource (font) before they can build.
    pub deferred: usize,
    pub failures: Vec<(ObjectId, String)>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.added == 0
            && self.removed == 0
            && self.rebuilt == 0
            && self.deferred == 0
            && self.failures.is_empty()
    }
}

type OpList = SmallVec<[ObjectId; 8]>;

/// Ordered operations for one pass. Consumers must apply removals (and the
/// removal half of rebuilds) before any addition.
#[derive(Debug, Default)]
pub struct PassPlan {
    pub remove: OpList,
    pub rebuild: OpList,
    pub update: OpList,
    pub add: OpList,
}

/// Diffs the previous pass's drawables (id -> structural key) against the
/// current record list. Records sharing an id after the first are skipped.
pub fn plan_pass(existing: &HashMap<ObjectId, u64>, records: &[SceneObject]) -> PassPlan {
    let mut plan = PassPlan::default();
    let mut seen: HashSet<ObjectId> = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id) {
            log::warn!("duplicate record id {}, keeping the first occurrence", record.id);
            continue;
        }
        match existing.get(&record.id) {
            None => plan.add.push(record.id),
            Some(key) if *key != record.structural_key() => plan.rebuild.push(record.id),
            Some(_) => plan.update.push(record.id),
        }
    }
    for id in existing.keys() {
        if !seen.contains(id) {
            plan.remove.push(*id);
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ObjectKind;

    #[test]
    fn partitions_removals_updates_and_additions() {
        let kept = SceneObject::new(ObjectKind::Box);
        let gone = SceneObject::new(ObjectKind::Sphere);
        let fresh = SceneObject::new(ObjectKind::Plane);
        let mut existing = HashMap::new();
        existing.insert(kept.id, kept.structural_key());
        existing.insert(gone.id, gone.structural_key());

        let records = vec![kept.clone(), fresh.clone()];
        let plan = plan_pass(&existing, &records);
        assert_eq!(plan.remove.as_slice(), &[gone.id]);
        assert_eq!(plan.update.as_slice(), &[kept.id]);
        assert_eq!(plan.add.as_slice(), &[fresh.id]);
        assert!(plan.rebuild.is_empty());
    }

    #[test]
    fn structural_change_becomes_a_rebuild() {
        let mut record = SceneObject::new(ObjectKind::Text { content: "one".to_string() });
        let mut existing = HashMap::new();
        existing.insert(record.id, record.structural_key());
        record.kind = ObjectKind::Text { content: "two".to_string() };
        let plan = plan_pass(&existing, std::slice::from_ref(&record));
        assert_eq!(plan.rebuild.as_slice(), &[record.id]);
        assert!(plan.remove.is_empty() && plan.add.is_empty() && plan.update.is_empty());
    }

    #[test]
    fn duplicate_ids_keep_the_first_record() {
        let record = SceneObject::new(ObjectKind::Box);
        let mut duplicate = record.clone();
        duplicate.kind = ObjectKind::Sphere;
        let plan = plan_pass(&HashMap::new(), &[record.clone(), duplicate]);
        assert_eq!(plan.add.as_slice(), &[record.id]);
    }
}

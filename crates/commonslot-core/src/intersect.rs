//! Intersection of per-identity slot lists.
//!
//! Counts how many identities report each `(date, time)` key and keeps the
//! keys every identity reported. The count-based approach is independent of
//! the order identities are supplied in, and the output is always sorted.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use crate::slot::Slot;

/// Returns the slots present in every list, sorted by date then time.
///
/// Each list is deduplicated before counting, so a provider reporting the
/// same slot twice still counts once. With no lists the result is empty;
/// with one list it is that list's deduplicated, sorted slots.
pub fn intersect(per_identity: &[Vec<Slot>]) -> Vec<Slot> {
    let required = per_identity.len();
    if required == 0 {
        return Vec::new();
    }

    let mut counts: HashMap<(NaiveDate, NaiveTime), (usize, Slot)> = HashMap::new();

    for slots in per_identity {
        let mut seen = HashSet::with_capacity(slots.len());
        for slot in slots {
            if !seen.insert(slot.key()) {
                continue;
            }
            counts
                .entry(slot.key())
                .and_modify(|(count, _)| *count += 1)
                .or_insert((1, *slot));
        }
    }

    let mut common: Vec<Slot> = counts
        .into_values()
        .filter(|(count, _)| *count == required)
        .map(|(_, slot)| slot)
        .collect();
    common.sort();

    debug!(identities = required, common = common.len(), "intersected slot lists");
    common
}

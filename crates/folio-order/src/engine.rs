//! Pure renumbering plans. No IO.
//!
//! Every function takes the snapshot as read from the store (ascending by
//! order, ties by id) and returns what the collection should look like
//! afterwards plus the writes needed to get there.

use std::collections::{BTreeMap, BTreeSet};

use folio_schemas::{ArtworkId, OrderMove};

use crate::{ContiguityReport, OrderSlot, OrderWrite, RenumberPlan, ValidationError};

fn count_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

fn check_id(id: ArtworkId) -> Result<(), ValidationError> {
    if id <= 0 {
        return Err(ValidationError::MalformedId(id));
    }
    Ok(())
}

fn check_snapshot(records: &[OrderSlot]) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for s in records {
        if !seen.insert(s.id) {
            return Err(ValidationError::DuplicateRecord(s.id));
        }
    }
    Ok(())
}

/// Assign 1..=N by sequence position. `sequence` carries the orders the
/// records had before, so unchanged records produce no write.
fn renumber(sequence: Vec<OrderSlot>) -> RenumberPlan {
    let mut plan = RenumberPlan {
        ordering: Vec::with_capacity(sequence.len()),
        writes: Vec::new(),
    };
    for (idx, slot) in sequence.into_iter().enumerate() {
        let order = count_i32(idx + 1);
        if slot.order != order {
            plan.writes.push(OrderWrite::new(slot.id, order));
        }
        plan.ordering.push(OrderSlot::new(slot.id, order));
    }
    plan
}

/// Stable ascending sort by order; ties keep their snapshot sequence.
pub fn sort_snapshot(records: &[OrderSlot]) -> Vec<OrderSlot> {
    let mut v = records.to_vec();
    v.sort_by_key(|s| s.order);
    v
}

/// `max(order) + 1`, or 1 for an empty collection.
///
/// Fails when the maximum is already `i32::MAX` (reachable after a trusted
/// reorder with a huge target).
pub fn append_order(records: &[OrderSlot]) -> Result<i32, ValidationError> {
    let max_order = records.iter().map(|s| s.order).max().unwrap_or(0);
    max_order
        .checked_add(1)
        .ok_or(ValidationError::OrderSpaceExhausted { max_order })
}

/// Order a new record is stored with before renumbering runs.
///
/// `desired` must lie in `1..=N+1`.
pub fn tentative_order(records: &[OrderSlot], desired: Option<i32>) -> Result<i32, ValidationError> {
    match desired {
        None => append_order(records),
        Some(d) => {
            let max = count_i32(records.len()).saturating_add(1);
            if d < 1 || d > max {
                return Err(ValidationError::PositionOutOfRange { desired: d, max });
            }
            Ok(d)
        }
    }
}

/// Place `new_id` into `records`.
///
/// Without `desired` the record is appended after the current maximum and no
/// other record moves. With `desired` the record is merged ahead of the
/// existing records, the whole set is stable-sorted by order and renumbered
/// 1..=N+1, so it lands exactly at `desired` and everything at or after that
/// position shifts down by one.
pub fn insert_with_position(
    records: &[OrderSlot],
    new_id: ArtworkId,
    desired: Option<i32>,
) -> Result<RenumberPlan, ValidationError> {
    check_id(new_id)?;
    check_snapshot(records)?;
    if records.iter().any(|s| s.id == new_id) {
        return Err(ValidationError::DuplicateRecord(new_id));
    }

    let order = tentative_order(records, desired)?;
    let new_slot = OrderSlot::new(new_id, order);

    if desired.is_none() {
        let mut ordering = sort_snapshot(records);
        ordering.push(new_slot);
        return Ok(RenumberPlan {
            ordering,
            writes: Vec::new(),
        });
    }

    let mut merged = Vec::with_capacity(records.len() + 1);
    merged.push(new_slot);
    merged.extend_from_slice(records);
    merged.sort_by_key(|s| s.order);
    Ok(renumber(merged))
}

/// Move existing record `id` to `desired` (1..=N). Every other record keeps
/// its relative order.
pub fn update_with_position(
    records: &[OrderSlot],
    id: ArtworkId,
    desired: i32,
) -> Result<RenumberPlan, ValidationError> {
    check_id(id)?;
    check_snapshot(records)?;

    let mut sequence = sort_snapshot(records);
    let idx = sequence
        .iter()
        .position(|s| s.id == id)
        .ok_or(ValidationError::UnknownRecord(id))?;

    let max = count_i32(sequence.len());
    if desired < 1 || desired > max {
        return Err(ValidationError::PositionOutOfRange { desired, max });
    }

    let target = sequence.remove(idx);
    // desired is within 1..=len here, so the index is in bounds.
    sequence.insert((desired - 1) as usize, target);
    Ok(renumber(sequence))
}

/// Close gaps and break duplicates: renumber 1..=N keeping current sequence.
pub fn compact(records: &[OrderSlot]) -> RenumberPlan {
    renumber(sort_snapshot(records))
}

/// Turn a reorder request into writes, in the caller's sequence.
///
/// Only structural checks happen here; contiguity is the caller's
/// responsibility unless [`validate_permutation`] is also applied.
pub fn reorder(moves: &[OrderMove]) -> Result<Vec<OrderWrite>, ValidationError> {
    let mut seen = BTreeSet::new();
    let mut writes = Vec::with_capacity(moves.len());
    for m in moves {
        check_id(m.id)?;
        if m.order < 1 {
            return Err(ValidationError::MalformedOrder {
                id: m.id,
                order: m.order,
            });
        }
        if !seen.insert(m.id) {
            return Err(ValidationError::DuplicateRecord(m.id));
        }
        writes.push(OrderWrite::from(*m));
    }
    Ok(writes)
}

/// Require `moves` to assign 1..=N to every record of `records` exactly once.
pub fn validate_permutation(
    records: &[OrderSlot],
    moves: &[OrderMove],
) -> Result<(), ValidationError> {
    let expected = records.len();
    let known: BTreeSet<ArtworkId> = records.iter().map(|s| s.id).collect();

    for m in moves {
        if !known.contains(&m.id) {
            return Err(ValidationError::UnknownRecord(m.id));
        }
    }

    if moves.len() != expected {
        return Err(ValidationError::NotAPermutation {
            expected,
            detail: format!("got {} assignment(s)", moves.len()),
        });
    }

    let orders: BTreeSet<i32> = moves.iter().map(|m| m.order).collect();
    let target: BTreeSet<i32> = (1..=count_i32(expected)).collect();
    if orders != target {
        let mut got: Vec<i32> = moves.iter().map(|m| m.order).collect();
        got.sort_unstable();
        return Err(ValidationError::NotAPermutation {
            expected,
            detail: format!("orders {got:?}"),
        });
    }
    Ok(())
}

/// What `records` looks like after `writes` land. Writes to unknown ids are
/// dropped.
pub fn project(records: &[OrderSlot], writes: &[OrderWrite]) -> Vec<OrderSlot> {
    let mut out = records.to_vec();
    for w in writes {
        if let Some(slot) = out.iter_mut().find(|s| s.id == w.id) {
            slot.order = w.order;
        }
    }
    sort_snapshot(&out)
}

/// Gap / duplicate / range evidence for a snapshot.
pub fn contiguity(records: &[OrderSlot]) -> ContiguityReport {
    let count = records.len();
    let n = count_i32(count);

    let mut seen: BTreeMap<i32, usize> = BTreeMap::new();
    for s in records {
        *seen.entry(s.order).or_insert(0) += 1;
    }

    ContiguityReport {
        count,
        gaps: (1..=n).filter(|o| !seen.contains_key(o)).collect(),
        duplicates: seen
            .iter()
            .filter(|(_, c)| **c > 1)
            .map(|(o, _)| *o)
            .collect(),
        out_of_range: seen.keys().copied().filter(|o| *o < 1 || *o > n).collect(),
    }
}

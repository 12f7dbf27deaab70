use std::collections::BTreeMap;

use folio_schemas::ArtworkId;
use serde::{Deserialize, Serialize};

/// The only part of an artwork the reconciler looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderSlot {
    pub id: ArtworkId,
    pub order: i32,
}

impl OrderSlot {
    pub fn new(id: ArtworkId, order: i32) -> Self {
        Self { id, order }
    }
}

/// One persistence write: `UPDATE artworks SET sort_order = order WHERE id = id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWrite {
    pub id: ArtworkId,
    pub order: i32,
}

impl OrderWrite {
    pub fn new(id: ArtworkId, order: i32) -> Self {
        Self { id, order }
    }
}

impl From<folio_schemas::OrderMove> for OrderWrite {
    fn from(m: folio_schemas::OrderMove) -> Self {
        Self::new(m.id, m.order)
    }
}

/// Result of planning a renumbering.
///
/// `ordering` is the full collection in final sequence position. `writes`
/// holds only the records whose order differs from the snapshot the plan was
/// computed against, in ascending sequence position.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct RenumberPlan {
    pub ordering: Vec<OrderSlot>,
    pub writes: Vec<OrderWrite>,
}

impl RenumberPlan {
    /// Final order of `id`, if it is part of the plan.
    pub fn order_of(&self, id: ArtworkId) -> Option<i32> {
        self.ordering.iter().find(|s| s.id == id).map(|s| s.order)
    }

    pub fn is_noop(&self) -> bool {
        self.writes.is_empty()
    }

    /// Recompute `writes` against what is actually stored.
    ///
    /// Used when the stored value of a record (e.g. a freshly inserted one)
    /// may differ from the tentative value the plan assumed.
    pub fn rebase_writes(&mut self, stored: &[OrderSlot]) {
        let before: BTreeMap<ArtworkId, i32> = stored.iter().map(|s| (s.id, s.order)).collect();
        self.writes = self
            .ordering
            .iter()
            .filter(|s| before.get(&s.id) != Some(&s.order))
            .map(|s| OrderWrite::new(s.id, s.order))
            .collect();
    }
}

/// Whether a raw reorder request is trusted or must be a full permutation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderPolicy {
    #[default]
    Trust,
    RequirePermutation,
}

/// Contiguity evidence for a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContiguityReport {
    pub count: usize,
    /// Values in 1..=count that no record holds.
    pub gaps: Vec<i32>,
    /// Values held by more than one record.
    pub duplicates: Vec<i32>,
    /// Values outside 1..=count.
    pub out_of_range: Vec<i32>,
}

impl ContiguityReport {
    pub fn is_contiguous(&self) -> bool {
        self.gaps.is_empty() && self.duplicates.is_empty() && self.out_of_range.is_empty()
    }
}

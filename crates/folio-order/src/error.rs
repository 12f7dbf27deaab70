use std::fmt;

use folio_schemas::ArtworkId;

use crate::OrderWrite;

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// Rejected input. Raised before any store write is attempted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Desired position outside 1..=max.
    PositionOutOfRange { desired: i32, max: i32 },
    /// Identifier is not part of the current collection.
    UnknownRecord(ArtworkId),
    /// Identifier appears twice (in the snapshot or in one reorder request).
    DuplicateRecord(ArtworkId),
    /// Identifier is not a positive integer.
    MalformedId(ArtworkId),
    /// Reorder target is not a positive integer.
    MalformedOrder { id: ArtworkId, order: i32 },
    /// Reorder list is not a full permutation of the collection.
    NotAPermutation { expected: usize, detail: String },
    /// Appending would need an order above `i32::MAX`.
    OrderSpaceExhausted { max_order: i32 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::PositionOutOfRange { desired, max } => {
                write!(f, "position {desired} out of range 1..={max}")
            }
            ValidationError::UnknownRecord(id) => write!(f, "unknown artwork id {id}"),
            ValidationError::DuplicateRecord(id) => write!(f, "artwork id {id} given twice"),
            ValidationError::MalformedId(id) => write!(f, "malformed artwork id {id}"),
            ValidationError::MalformedOrder { id, order } => {
                write!(f, "malformed order {order} for artwork id {id}")
            }
            ValidationError::NotAPermutation { expected, detail } => write!(
                f,
                "reorder must assign 1..={expected} to every artwork exactly once: {detail}"
            ),
            ValidationError::OrderSpaceExhausted { max_order } => write!(
                f,
                "cannot append after order {max_order}; compact the collection first"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Connection, pool or transport failure.
    Unavailable,
    /// The targeted row does not exist (update touched zero rows).
    NotFound,
    /// The store refused the statement (constraint, syntax, ...).
    Rejected,
}

/// Failure reported by an [`crate::OrderStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn not_found(id: ArtworkId) -> Self {
        Self {
            kind: StoreErrorKind::NotFound,
            message: format!("artwork id {id} not found"),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Rejected,
            message: message.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            StoreErrorKind::Unavailable => "store unavailable",
            StoreErrorKind::NotFound => "not found",
            StoreErrorKind::Rejected => "store rejected write",
        };
        write!(f, "{kind}: {}", self.message)
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// PartialFailure
// ---------------------------------------------------------------------------

/// A write sequence stopped part-way. Applied writes are not rolled back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialFailure {
    pub applied: Vec<OrderWrite>,
    /// The failed write followed by every write after it, in plan order.
    pub unapplied: Vec<OrderWrite>,
    pub cause: StoreError,
}

impl PartialFailure {
    pub fn unapplied_ids(&self) -> Vec<ArtworkId> {
        self.unapplied.iter().map(|w| w.id).collect()
    }

    /// The write that failed.
    pub fn failed_write(&self) -> Option<&OrderWrite> {
        self.unapplied.first()
    }
}

impl fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "partial failure after {} of {} write(s); unapplied ids {:?}: {}",
            self.applied.len(),
            self.applied.len() + self.unapplied.len(),
            self.unapplied_ids(),
            self.cause
        )
    }
}

impl std::error::Error for PartialFailure {}

// ---------------------------------------------------------------------------
// ReconcileError
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileError {
    Validation(ValidationError),
    PartialFailure(PartialFailure),
    /// The snapshot could not be read (connection or transport); no write
    /// was attempted.
    StoreUnavailable(StoreError),
    /// The store refused the snapshot query; no write was attempted.
    SnapshotFailed(StoreError),
}

impl ReconcileError {
    /// Safe to retry the whole operation as-is: nothing was written.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReconcileError::Validation(_) => false,
            ReconcileError::StoreUnavailable(_) => true,
            ReconcileError::SnapshotFailed(_) => false,
            ReconcileError::PartialFailure(p) => {
                p.applied.is_empty() && p.cause.kind == StoreErrorKind::Unavailable
            }
        }
    }
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::Validation(e) => write!(f, "validation failed: {e}"),
            ReconcileError::PartialFailure(p) => write!(f, "{p}"),
            ReconcileError::StoreUnavailable(e) => write!(f, "snapshot read failed: {e}"),
            ReconcileError::SnapshotFailed(e) => write!(f, "snapshot query rejected: {e}"),
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconcileError::Validation(e) => Some(e),
            ReconcileError::PartialFailure(p) => Some(&p.cause),
            ReconcileError::StoreUnavailable(e) | ReconcileError::SnapshotFailed(e) => Some(e),
        }
    }
}

impl From<ValidationError> for ReconcileError {
    fn from(e: ValidationError) -> Self {
        ReconcileError::Validation(e)
    }
}

impl From<PartialFailure> for ReconcileError {
    fn from(p: PartialFailure) -> Self {
        ReconcileError::PartialFailure(p)
    }
}

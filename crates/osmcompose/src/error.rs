use osmstore::StoreError;
use thiserror::Error;

/// Recoverable, per-unit failures: required referenced data was missing or
/// the topology could not close. The affected way/relation is reported and
/// skipped; nothing partial is emitted for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Incomplete {
    #[error("way {way} references missing node {node}")]
    MissingNode { way: i64, node: i64 },

    #[error("way {way} resolves to fewer than two points")]
    DegenerateWay { way: i64 },

    #[error("relation {relation} references missing way {way}")]
    MissingWay { relation: i64, way: i64 },

    #[error("relation {relation} has an unclosed ring: odd chain incidence at node {node}")]
    OddEndpoint { relation: i64, node: i64 },

    #[error("relation {relation} ring seeded by way {way} cannot be closed")]
    OpenRing { relation: i64, way: i64 },

    #[error("relation {relation} has unresolvable ring containment")]
    ContainmentConflict { relation: i64 },
}

/// Composition failure: either a recoverable [`Incomplete`] condition or a
/// fatal store error. Incomplete conditions are absorbed at the
/// multipolygon builder boundary; store errors propagate and abort the run.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("{0}")]
    Incomplete(#[from] Incomplete),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ComposeError {
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ComposeError::Incomplete(_))
    }
}

/// Splits a composition result into the recoverable and fatal halves so
/// callers can absorb [`Incomplete`] without a chance of swallowing a
/// store failure.
pub(crate) fn recoverable<T>(
    result: Result<T, ComposeError>,
) -> Result<Result<T, Incomplete>, StoreError> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(ComposeError::Incomplete(reason)) => Ok(Err(reason)),
        Err(ComposeError::Store(err)) => Err(err),
    }
}

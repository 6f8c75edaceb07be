use crate::model::FeatureKind;
use thiserror::Error;

/// Fatal store failures. Anything surfacing here aborts the run; there is
/// no incremental resume state, so the caller retries from scratch.
///
/// A record that fails to *decode* on read is not in this enum: it is
/// logged and treated as not-found (see the spill backend).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("failed to encode {kind} {id}: {source}")]
    Encode {
        kind: FeatureKind,
        id: i64,
        source: serde_json::Error,
    },
}

//! Feature store for OSM-style map data.
//!
//! Holds point (node), polyline (way) and relation records between the
//! ingestion phase and the geometry composition phase of a map import.
//! Two interchangeable backends implement the same [`FeatureStore`] trait:
//!
//! - [`MemStore`]: plain hash maps, everything resident. Fastest when the
//!   extract fits in RAM.
//! - [`SpillStore`]: bounded-memory. Inserts are buffered and spilled to
//!   temporary SQLite tables in batches of [`SPILL_THRESHOLD`] records;
//!   reads go straight to SQLite. Handles extracts with tens of millions
//!   of records.
//!
//! Lifecycle: insert during ingestion (optionally through filters), call
//! [`FeatureStore::flush`] once ingestion ends, then treat the store as
//! read-only while geometry is composed. Consumed ways are removed with
//! [`FeatureStore::delete_ways`] afterwards, and [`FeatureStore::teardown`]
//! drops any temporary storage at the end of the run.

pub mod error;
pub mod mem;
pub mod model;
pub mod spill;
pub mod store;

pub use error::StoreError;
pub use mem::MemStore;
pub use model::{FeatureKind, Member, MemberKind, Node, Relation, Tags, Way};
pub use spill::{SpillStore, SPILL_THRESHOLD};
pub use store::{FeatureStore, IdMap};

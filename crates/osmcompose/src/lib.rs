//! Topology-to-geometry assembly for OSM-style map data.
//!
//! Takes the raw records held in an [`osmstore::FeatureStore`] — points,
//! ordered point-chains (ways) and grouped relations — and reconstructs
//! renderable geometry from them: closed polygon rings stitched together
//! from unordered chain fragments, nested into exteriors with holes, with
//! winding normalized for the downstream renderer's fill rule.
//!
//! The pipeline, in the order an importer drives it:
//!
//! 1. ingest records through a [`filter::Ingestor`] (area classification,
//!    tag seeding), then flush the store;
//! 2. [`builder::MultipolygonBuilder`] composes every candidate relation
//!    into multipolygon features, and closed area-tagged ways into simple
//!    polygon features;
//! 3. consumed area ways are deleted from the store;
//! 4. [`feature::each_line_feature`] / [`feature::each_point_feature`]
//!    stream whatever is left for the line and point sinks.
//!
//! Missing references, unclosed rings and unresolvable containment are
//! warning-class conditions ([`Incomplete`]): the affected unit is skipped
//! and counted, never partially emitted. Only store failures abort a run.

pub mod builder;
pub mod error;
pub mod feature;
pub mod filter;
pub mod geom;
pub mod nest;
pub mod resolve;
pub mod ring;

pub use builder::{is_multipolygon, BuilderStats, MultipolygonBuilder};
pub use error::{ComposeError, Incomplete};
pub use feature::{
    each_line_feature, each_point_feature, LineFeature, MultipolygonFeature, PointFeature,
};
pub use filter::{AreaClassifier, IngestFilter, Ingestor, TagCopy};
pub use geom::{Coord, Polygon, Ring};

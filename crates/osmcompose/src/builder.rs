//! Relation-to-multipolygon composition driver.

use log::{info, warn};

use osmstore::{FeatureStore, MemberKind, Relation, StoreError, Way};

use crate::error::{recoverable, Incomplete};
use crate::feature::MultipolygonFeature;
use crate::geom::{Polygon, Ring};
use crate::nest::nest_rings;
use crate::resolve::resolve_way;
use crate::ring::assemble_rings;

/// End-of-run tally reported by the builder.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuilderStats {
    /// Candidate relations examined.
    pub relations: u64,
    /// Multipolygon features emitted from relations.
    pub polygons: u64,
    /// Simple-area features emitted from single closed ways.
    pub areas: u64,
    /// Units skipped because required data was missing or the topology
    /// could not be resolved.
    pub incomplete: u64,
    /// Relations whose hole set failed to assemble and were emitted with
    /// zero holes.
    pub degraded: u64,
}

/// The default candidate check: relations tagged as multipolygon or
/// boundary areas. Callers with their own area classification pass their
/// own predicate to [`MultipolygonBuilder::build_all`].
pub fn is_multipolygon(relation: &Relation) -> bool {
    matches!(
        relation.tags.get("type").map(String::as_str),
        Some("multipolygon" | "boundary")
    )
}

/// Composes polygon features out of a read-only, already flushed store.
///
/// Incomplete conditions from the resolver, ring assembler and nester are
/// absorbed here: the affected relation is logged, counted and skipped.
/// Only store failures propagate out.
pub struct MultipolygonBuilder<'a> {
    store: &'a dyn FeatureStore,
    stats: BuilderStats,
}

impl<'a> MultipolygonBuilder<'a> {
    pub fn new(store: &'a dyn FeatureStore) -> Self {
        Self {
            store,
            stats: BuilderStats::default(),
        }
    }

    pub fn stats(&self) -> BuilderStats {
        self.stats
    }

    /// Compose one relation. `Ok(None)` means the relation was incomplete
    /// (already logged and counted); no partial feature is ever produced.
    pub fn build_relation(
        &mut self,
        relation: &Relation,
    ) -> Result<Option<MultipolygonFeature>, StoreError> {
        self.stats.relations += 1;

        let mut outer: Vec<Way> = Vec::new();
        let mut inner: Vec<Way> = Vec::new();
        for member in &relation.members {
            if member.kind != MemberKind::Way {
                continue;
            }
            let Some(way) = self.store.way(member.id)? else {
                let reason = Incomplete::MissingWay {
                    relation: relation.id,
                    way: member.id,
                };
                warn!("{reason}");
                self.stats.incomplete += 1;
                return Ok(None);
            };
            match member.role.as_str() {
                "outer" => outer.push(way),
                "inner" => inner.push(way),
                _ => {}
            }
        }

        let outer_rings = match recoverable(assemble_rings(self.store, relation.id, &outer))? {
            Ok(rings) if !rings.is_empty() => rings,
            Ok(_) => {
                warn!("relation {} has no outer ring", relation.id);
                self.stats.incomplete += 1;
                return Ok(None);
            }
            Err(reason) => {
                warn!("relation {} outer set: {reason}", relation.id);
                self.stats.incomplete += 1;
                return Ok(None);
            }
        };

        // A broken hole set degrades to no holes instead of losing the
        // whole relation.
        let inner_rings = match recoverable(assemble_rings(self.store, relation.id, &inner))? {
            Ok(rings) => rings,
            Err(reason) => {
                warn!(
                    "relation {} inner set dropped: {reason}",
                    relation.id
                );
                self.stats.degraded += 1;
                Vec::new()
            }
        };

        let mut rings = outer_rings;
        rings.extend(inner_rings);
        let polygons = match recoverable(nest_rings(relation.id, rings))? {
            Ok(polygons) => polygons,
            Err(reason) => {
                warn!("relation {}: {reason}", relation.id);
                self.stats.incomplete += 1;
                return Ok(None);
            }
        };

        self.stats.polygons += 1;
        Ok(Some(MultipolygonFeature {
            id: relation.id,
            tags: relation.tags.clone(),
            polygons,
        }))
    }

    /// Compose every relation accepted by `is_candidate`, emitting each
    /// finished feature, and log the end-of-run tally.
    pub fn build_all(
        &mut self,
        is_candidate: &dyn Fn(&Relation) -> bool,
        emit: &mut dyn FnMut(MultipolygonFeature),
    ) -> Result<(), StoreError> {
        let store = self.store;
        let mut failure: Option<StoreError> = None;
        store.each_relation(&mut |relation| {
            if failure.is_some() || !is_candidate(&relation) {
                return;
            }
            match self.build_relation(&relation) {
                Ok(Some(feature)) => emit(feature),
                Ok(None) => {}
                Err(err) => failure = Some(err),
            }
        })?;
        if let Some(err) = failure {
            return Err(err);
        }
        info!(
            "composed {} multipolygons from {} relations ({} incomplete, {} degraded)",
            self.stats.polygons, self.stats.relations, self.stats.incomplete, self.stats.degraded
        );
        Ok(())
    }

    /// Compose the closed single-way area candidates collected at
    /// ingestion time (the area classifier's side list) into one-polygon
    /// features. Untagged ways are skipped; unresolvable ones are counted
    /// incomplete. The caller deletes the consumed ways from the store
    /// afterwards, once nothing else will read them.
    pub fn build_simple_areas(
        &mut self,
        way_ids: &[i64],
        emit: &mut dyn FnMut(MultipolygonFeature),
    ) -> Result<(), StoreError> {
        for &id in way_ids {
            let Some(way) = self.store.way(id)? else {
                warn!("area way {id} vanished before composition");
                self.stats.incomplete += 1;
                continue;
            };
            if way.tags.is_empty() {
                continue;
            }
            match recoverable(resolve_way(self.store, &way))? {
                Ok(coords) => {
                    self.stats.areas += 1;
                    emit(MultipolygonFeature {
                        id,
                        tags: way.tags.clone(),
                        polygons: vec![Polygon {
                            exterior: Ring { way_id: id, coords },
                            holes: Vec::new(),
                        }],
                    });
                }
                Err(reason) => {
                    warn!("area way {id}: {reason}");
                    self.stats.incomplete += 1;
                }
            }
        }
        Ok(())
    }
}

//! Ingestion-time record filters.
//!
//! Filters run in a fixed, explicitly ordered pipeline as each record
//! enters the store: every filter receives the previous filter's output
//! and returns a (possibly mutated) record. Filters never drop records;
//! records they do not match pass through untouched.

use std::collections::HashMap;

use osmstore::{FeatureStore, Node, Relation, StoreError, Tags, Way};

/// A single ingestion-time transform. The default hooks are identity, so
/// a filter only overrides the kinds it cares about.
pub trait IngestFilter {
    fn on_node(&mut self, node: Node) -> Node {
        node
    }
    fn on_way(&mut self, way: Way) -> Way {
        way
    }
    fn on_relation(&mut self, relation: Relation) -> Relation {
        relation
    }
}

/// Threads each record through the filter pipeline, in order, and into
/// the store. [`finish`](Self::finish) flushes the store once the
/// producer is done.
pub struct Ingestor<'a> {
    store: &'a mut dyn FeatureStore,
    filters: Vec<&'a mut dyn IngestFilter>,
}

impl<'a> Ingestor<'a> {
    pub fn new(store: &'a mut dyn FeatureStore, filters: Vec<&'a mut dyn IngestFilter>) -> Self {
        Self { store, filters }
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), StoreError> {
        let node = self.filters.iter_mut().fold(node, |n, f| f.on_node(n));
        self.store.add_node(node)
    }

    pub fn add_way(&mut self, way: Way) -> Result<(), StoreError> {
        let way = self.filters.iter_mut().fold(way, |w, f| f.on_way(w));
        self.store.add_way(way)
    }

    pub fn add_relation(&mut self, relation: Relation) -> Result<(), StoreError> {
        let relation = self
            .filters
            .iter_mut()
            .fold(relation, |r, f| f.on_relation(r));
        self.store.add_relation(relation)
    }

    /// Declare ingestion complete and commit pending writes.
    pub fn finish(self) -> Result<(), StoreError> {
        self.store.flush()
    }
}

/// Tag rules for [`AreaClassifier`]: key to allowed values, where `None`
/// is a wildcard matching any value.
pub type AreaRules = HashMap<String, Option<Vec<String>>>;

/// Spots closed ways whose tags mark them as simple areas (parks,
/// buildings, lakes drawn as a single closed way) and records their ids
/// in a side list. The ways themselves stay in chain storage; the caller
/// deletes them later, once they have been re-emitted as polygons.
pub struct AreaClassifier {
    rules: AreaRules,
    areas: Vec<i64>,
}

impl AreaClassifier {
    pub fn new(rules: AreaRules) -> Self {
        Self {
            rules,
            areas: Vec::new(),
        }
    }

    /// Ids of closed ways that matched an area rule, in insertion order.
    pub fn areas(&self) -> &[i64] {
        &self.areas
    }

    pub fn into_areas(self) -> Vec<i64> {
        self.areas
    }
}

impl IngestFilter for AreaClassifier {
    fn on_way(&mut self, way: Way) -> Way {
        if way.is_closed() {
            for (key, allowed) in &self.rules {
                let Some(value) = way.tags.get(key) else {
                    continue;
                };
                let hit = match allowed {
                    None => true,
                    Some(values) => values.iter().any(|v| v == value),
                };
                if hit {
                    self.areas.push(way.id);
                    break;
                }
            }
        }
        way
    }
}

/// Copies one tag's value to another key when present, on every record
/// kind. Used to seed a rendering-priority field from a layer tag.
pub struct TagCopy {
    from: String,
    to: String,
}

impl TagCopy {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_owned(),
            to: to.to_owned(),
        }
    }

    fn copy(&self, tags: &mut Tags) {
        if let Some(value) = tags.get(&self.from).cloned() {
            tags.insert(self.to.clone(), value);
        }
    }
}

impl IngestFilter for TagCopy {
    fn on_node(&mut self, mut node: Node) -> Node {
        self.copy(&mut node.tags);
        node
    }

    fn on_way(&mut self, mut way: Way) -> Way {
        self.copy(&mut way.tags);
        way
    }

    fn on_relation(&mut self, mut relation: Relation) -> Relation {
        self.copy(&mut relation.tags);
        relation
    }
}

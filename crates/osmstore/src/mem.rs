//! Fully resident backend: one hash map per record kind.

use crate::error::StoreError;
use crate::model::{Node, Relation, Way};
use crate::store::{FeatureStore, IdMap};

/// In-memory feature store. All operations are O(1)/O(n) in the active
/// set; `flush` and `teardown` are no-ops.
#[derive(Debug, Default)]
pub struct MemStore {
    nodes: IdMap<Node>,
    ways: IdMap<Way>,
    relations: IdMap<Relation>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn get_many<T: Clone>(map: &IdMap<T>, ids: &[i64]) -> IdMap<T> {
    let mut out = IdMap::default();
    for &id in ids {
        if let Some(rec) = map.get(&id) {
            out.insert(id, rec.clone());
        }
    }
    out
}

impl FeatureStore for MemStore {
    fn add_node(&mut self, node: Node) -> Result<(), StoreError> {
        self.nodes.insert(node.id, node);
        Ok(())
    }

    fn add_way(&mut self, way: Way) -> Result<(), StoreError> {
        self.ways.insert(way.id, way);
        Ok(())
    }

    fn add_relation(&mut self, relation: Relation) -> Result<(), StoreError> {
        self.relations.insert(relation.id, relation);
        Ok(())
    }

    fn node(&self, id: i64) -> Result<Option<Node>, StoreError> {
        Ok(self.nodes.get(&id).cloned())
    }

    fn way(&self, id: i64) -> Result<Option<Way>, StoreError> {
        Ok(self.ways.get(&id).cloned())
    }

    fn relation(&self, id: i64) -> Result<Option<Relation>, StoreError> {
        Ok(self.relations.get(&id).cloned())
    }

    fn nodes(&self, ids: &[i64]) -> Result<IdMap<Node>, StoreError> {
        Ok(get_many(&self.nodes, ids))
    }

    fn ways(&self, ids: &[i64]) -> Result<IdMap<Way>, StoreError> {
        Ok(get_many(&self.ways, ids))
    }

    fn relations(&self, ids: &[i64]) -> Result<IdMap<Relation>, StoreError> {
        Ok(get_many(&self.relations, ids))
    }

    fn each_node(&self, f: &mut dyn FnMut(Node)) -> Result<(), StoreError> {
        for node in self.nodes.values() {
            f(node.clone());
        }
        Ok(())
    }

    fn each_way(&self, f: &mut dyn FnMut(Way)) -> Result<(), StoreError> {
        for way in self.ways.values() {
            f(way.clone());
        }
        Ok(())
    }

    fn each_relation(&self, f: &mut dyn FnMut(Relation)) -> Result<(), StoreError> {
        for relation in self.relations.values() {
            f(relation.clone());
        }
        Ok(())
    }

    fn delete_ways(&mut self, ids: &[i64]) -> Result<u64, StoreError> {
        let mut removed = 0u64;
        for id in ids {
            if self.ways.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn node_count(&self) -> u64 {
        self.nodes.len() as u64
    }

    fn way_count(&self) -> u64 {
        self.ways.len() as u64
    }

    fn relation_count(&self) -> u64 {
        self.relations.len() as u64
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), StoreError> {
        self.nodes = IdMap::default();
        self.ways = IdMap::default();
        self.relations = IdMap::default();
        Ok(())
    }
}

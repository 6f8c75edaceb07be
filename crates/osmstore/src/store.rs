//! The backend-independent store contract.

use crate::error::StoreError;
use crate::model::{Node, Relation, Way};

/// Hash map keyed by a 64-bit OSM identifier. Ids are effectively random
/// already, so the identity hasher is enough.
pub type IdMap<T> = hashbrown::HashMap<i64, T, nohash_hasher::BuildNoHashHasher<i64>>;

/// Durable holding of node, way and relation records between ingestion
/// and composition.
///
/// Contract notes shared by all backends:
///
/// - `add_*` may buffer; records are only guaranteed visible to the read
///   methods after [`flush`](Self::flush).
/// - The bulk `nodes`/`ways`/`relations` lookups return a map in which
///   missing ids are simply absent.
/// - `each_*` makes one forward pass over the kind; re-invoking restarts
///   from the beginning.
/// - `*_count` is served from running counters, never by scanning storage.
/// - After `flush`, the store must present a stable view until the next
///   mutation (`delete_ways` or `teardown`), which the borrow rules here
///   enforce by taking `&mut self`.
pub trait FeatureStore {
    fn add_node(&mut self, node: Node) -> Result<(), StoreError>;
    fn add_way(&mut self, way: Way) -> Result<(), StoreError>;
    fn add_relation(&mut self, relation: Relation) -> Result<(), StoreError>;

    fn node(&self, id: i64) -> Result<Option<Node>, StoreError>;
    fn way(&self, id: i64) -> Result<Option<Way>, StoreError>;
    fn relation(&self, id: i64) -> Result<Option<Relation>, StoreError>;

    fn nodes(&self, ids: &[i64]) -> Result<IdMap<Node>, StoreError>;
    fn ways(&self, ids: &[i64]) -> Result<IdMap<Way>, StoreError>;
    fn relations(&self, ids: &[i64]) -> Result<IdMap<Relation>, StoreError>;

    fn each_node(&self, f: &mut dyn FnMut(Node)) -> Result<(), StoreError>;
    fn each_way(&self, f: &mut dyn FnMut(Way)) -> Result<(), StoreError>;
    fn each_relation(&self, f: &mut dyn FnMut(Relation)) -> Result<(), StoreError>;

    /// Remove the given way ids, returning how many records were actually
    /// removed (duplicate or unknown ids do not inflate the count).
    fn delete_ways(&mut self, ids: &[i64]) -> Result<u64, StoreError>;

    fn node_count(&self) -> u64;
    fn way_count(&self) -> u64;
    fn relation_count(&self) -> u64;

    /// Commit pending writes. Must be called once ingestion ends, before
    /// any reads.
    fn flush(&mut self) -> Result<(), StoreError>;

    /// Release all resources held for the run (temporary tables, caches).
    /// The store is unusable afterwards.
    fn teardown(&mut self) -> Result<(), StoreError>;
}

#[cfg(test)]
pub(crate) mod contract {
    //! Trait-level assertions shared by the backend test modules, so both
    //! implementations are held to the same behavior.

    use super::*;
    use crate::model::{Member, Tags};

    fn sample_node(id: i64) -> Node {
        let mut node = Node::new(id, id as f64 * 0.001, -(id as f64) * 0.002);
        node.tags.insert("name".into(), format!("n{id}"));
        node
    }

    pub fn roundtrip_and_counts(store: &mut dyn FeatureStore) {
        let ids: Vec<i64> = (1..=20).collect();
        for &id in &ids {
            store.add_node(sample_node(id)).unwrap();
        }
        store
            .add_way(Way::new(100, vec![1, 2, 3, 1]))
            .unwrap();
        store
            .add_relation(Relation::new(200, vec![Member::way(100, "outer")]))
            .unwrap();
        store.flush().unwrap();

        assert_eq!(store.node_count(), 20);
        assert_eq!(store.way_count(), 1);
        assert_eq!(store.relation_count(), 1);

        // Single get, hit and miss.
        assert_eq!(store.node(7).unwrap().unwrap(), sample_node(7));
        assert!(store.node(999).unwrap().is_none());

        // Bulk get returns exactly the present records.
        let mut wanted = ids.clone();
        wanted.push(777); // absent
        let got = store.nodes(&wanted).unwrap();
        assert_eq!(got.len(), 20);
        for &id in &ids {
            assert_eq!(got[&id], sample_node(id));
        }
        assert!(!got.contains_key(&777));

        // Iteration sees every record, and restarts from scratch.
        for _ in 0..2 {
            let mut seen = Vec::new();
            store.each_node(&mut |n| seen.push(n.id)).unwrap();
            seen.sort_unstable();
            assert_eq!(seen, ids);
        }
    }

    pub fn delete_semantics(store: &mut dyn FeatureStore) {
        for id in 1..=10 {
            store.add_way(Way::new(id, vec![1, 2])).unwrap();
        }
        store.flush().unwrap();
        assert_eq!(store.way_count(), 10);

        // Duplicates and unknown ids must not skew the count.
        let removed = store.delete_ways(&[3, 3, 4, 999]).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.way_count(), 8);
        assert!(store.way(3).unwrap().is_none());
        assert!(store.way(4).unwrap().is_none());
        assert!(store.way(5).unwrap().is_some());

        let mut seen = Vec::new();
        store.each_way(&mut |w| seen.push(w.id)).unwrap();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 5, 6, 7, 8, 9, 10]);
    }

    pub fn tags_survive(store: &mut dyn FeatureStore) {
        let mut way = Way::new(5, vec![1, 2, 3, 1]);
        let mut tags = Tags::new();
        tags.insert("landuse".into(), "forest".into());
        tags.insert("name".into(), "Black Forest".into());
        way.tags = tags.clone();
        store.add_way(way).unwrap();
        store.flush().unwrap();
        assert_eq!(store.way(5).unwrap().unwrap().tags, tags);
    }
}

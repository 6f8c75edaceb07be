//! Bounded-memory backend: buffered inserts spilled to temporary SQLite
//! tables.
//!
//! Records are serialized to JSON blobs keyed by id. Inserts accumulate in
//! a per-kind buffer; once a buffer reaches [`SPILL_THRESHOLD`] it is
//! written out inside a single transaction and cleared, so resident memory
//! stays bounded no matter how large the extract is. Reads always query
//! SQLite directly — they are only meaningful after [`FeatureStore::flush`].

use log::warn;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::error::StoreError;
use crate::model::{FeatureKind, Node, Relation, Way};
use crate::store::{FeatureStore, IdMap};

/// Buffered records per kind before a spill to SQLite is forced.
pub const SPILL_THRESHOLD: usize = 250_000;

/// SQLite caps the number of bound parameters per statement.
const MAX_SQL_PARAMS: usize = 999;

const SCHEMA: &str = r#"
PRAGMA journal_mode=WAL;
PRAGMA synchronous=NORMAL;

DROP TABLE IF EXISTS tmp_nodes;
DROP TABLE IF EXISTS tmp_ways;
DROP TABLE IF EXISTS tmp_relations;

CREATE TABLE tmp_nodes     (id INTEGER PRIMARY KEY NOT NULL, record BLOB NOT NULL);
CREATE TABLE tmp_ways      (id INTEGER PRIMARY KEY NOT NULL, record BLOB NOT NULL);
CREATE TABLE tmp_relations (id INTEGER PRIMARY KEY NOT NULL, record BLOB NOT NULL);
"#;

/// Spill-to-disk feature store backed by SQLite.
pub struct SpillStore {
    conn: Connection,
    spill_at: usize,

    nodes: Vec<Node>,
    ways: Vec<Way>,
    relations: Vec<Relation>,

    node_total: u64,
    way_total: u64,
    relation_total: u64,
}

impl SpillStore {
    /// Open (or create) the scratch database at `path`. Failure here is
    /// fatal for the whole run.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::from_conn(Connection::open(path)?)
    }

    /// Backed by an in-memory SQLite database. Same code paths as
    /// [`open`](Self::open); used by tests and small runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_conn(Connection::open_in_memory()?)
    }

    fn from_conn(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            spill_at: SPILL_THRESHOLD,
            nodes: Vec::new(),
            ways: Vec::new(),
            relations: Vec::new(),
            node_total: 0,
            way_total: 0,
            relation_total: 0,
        })
    }

    #[cfg(test)]
    fn set_spill_threshold(&mut self, spill_at: usize) {
        self.spill_at = spill_at.max(1);
    }

    fn spill_nodes(&mut self) -> Result<(), StoreError> {
        spill_batch(
            &mut self.conn,
            "INSERT OR REPLACE INTO tmp_nodes (id, record) VALUES (?1, ?2)",
            FeatureKind::Node,
            &mut self.nodes,
            |n| n.id,
        )
    }

    fn spill_ways(&mut self) -> Result<(), StoreError> {
        spill_batch(
            &mut self.conn,
            "INSERT OR REPLACE INTO tmp_ways (id, record) VALUES (?1, ?2)",
            FeatureKind::Way,
            &mut self.ways,
            |w| w.id,
        )
    }

    fn spill_relations(&mut self) -> Result<(), StoreError> {
        spill_batch(
            &mut self.conn,
            "INSERT OR REPLACE INTO tmp_relations (id, record) VALUES (?1, ?2)",
            FeatureKind::Relation,
            &mut self.relations,
            |r| r.id,
        )
    }

    fn fetch<T: DeserializeOwned>(
        &self,
        sql: &str,
        kind: FeatureKind,
        id: i64,
    ) -> Result<Option<T>, StoreError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let blob: Option<Vec<u8>> = stmt.query_row(params![id], |row| row.get(0)).optional()?;
        match blob {
            None => Ok(None),
            Some(bytes) => match serde_json::from_slice(&bytes) {
                Ok(rec) => Ok(Some(rec)),
                Err(err) => {
                    // Undecodable record: report it and answer not-found.
                    warn!("undecodable {kind} record {id} treated as missing: {err}");
                    Ok(None)
                }
            },
        }
    }

    fn fetch_many<T: DeserializeOwned>(
        &self,
        sql: &str,
        kind: FeatureKind,
        ids: &[i64],
    ) -> Result<IdMap<T>, StoreError> {
        let mut out = IdMap::default();
        for &id in ids {
            if let Some(rec) = self.fetch::<T>(sql, kind, id)? {
                out.insert(id, rec);
            }
        }
        Ok(out)
    }

    fn scan<T: DeserializeOwned>(
        &self,
        sql: &str,
        kind: FeatureKind,
        f: &mut dyn FnMut(T),
    ) -> Result<(), StoreError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            match serde_json::from_slice(&blob) {
                Ok(rec) => f(rec),
                Err(err) => warn!("undecodable {kind} record {id} skipped in scan: {err}"),
            }
        }
        Ok(())
    }
}

fn spill_batch<T: Serialize>(
    conn: &mut Connection,
    insert_sql: &str,
    kind: FeatureKind,
    records: &mut Vec<T>,
    id_of: fn(&T) -> i64,
) -> Result<(), StoreError> {
    if records.is_empty() {
        return Ok(());
    }
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(insert_sql)?;
        for rec in records.iter() {
            let id = id_of(rec);
            let blob = serde_json::to_vec(rec)
                .map_err(|source| StoreError::Encode { kind, id, source })?;
            stmt.execute(params![id, blob])?;
        }
    }
    tx.commit()?;
    records.clear();
    Ok(())
}

impl FeatureStore for SpillStore {
    fn add_node(&mut self, node: Node) -> Result<(), StoreError> {
        self.node_total += 1;
        self.nodes.push(node);
        if self.nodes.len() >= self.spill_at {
            self.spill_nodes()?;
        }
        Ok(())
    }

    fn add_way(&mut self, way: Way) -> Result<(), StoreError> {
        self.way_total += 1;
        self.ways.push(way);
        if self.ways.len() >= self.spill_at {
            self.spill_ways()?;
        }
        Ok(())
    }

    fn add_relation(&mut self, relation: Relation) -> Result<(), StoreError> {
        self.relation_total += 1;
        self.relations.push(relation);
        if self.relations.len() >= self.spill_at {
            self.spill_relations()?;
        }
        Ok(())
    }

    fn node(&self, id: i64) -> Result<Option<Node>, StoreError> {
        self.fetch(
            "SELECT record FROM tmp_nodes WHERE id = ?1",
            FeatureKind::Node,
            id,
        )
    }

    fn way(&self, id: i64) -> Result<Option<Way>, StoreError> {
        self.fetch(
            "SELECT record FROM tmp_ways WHERE id = ?1",
            FeatureKind::Way,
            id,
        )
    }

    fn relation(&self, id: i64) -> Result<Option<Relation>, StoreError> {
        self.fetch(
            "SELECT record FROM tmp_relations WHERE id = ?1",
            FeatureKind::Relation,
            id,
        )
    }

    fn nodes(&self, ids: &[i64]) -> Result<IdMap<Node>, StoreError> {
        self.fetch_many(
            "SELECT record FROM tmp_nodes WHERE id = ?1",
            FeatureKind::Node,
            ids,
        )
    }

    fn ways(&self, ids: &[i64]) -> Result<IdMap<Way>, StoreError> {
        self.fetch_many(
            "SELECT record FROM tmp_ways WHERE id = ?1",
            FeatureKind::Way,
            ids,
        )
    }

    fn relations(&self, ids: &[i64]) -> Result<IdMap<Relation>, StoreError> {
        self.fetch_many(
            "SELECT record FROM tmp_relations WHERE id = ?1",
            FeatureKind::Relation,
            ids,
        )
    }

    fn each_node(&self, f: &mut dyn FnMut(Node)) -> Result<(), StoreError> {
        self.scan("SELECT id, record FROM tmp_nodes", FeatureKind::Node, f)
    }

    fn each_way(&self, f: &mut dyn FnMut(Way)) -> Result<(), StoreError> {
        self.scan("SELECT id, record FROM tmp_ways", FeatureKind::Way, f)
    }

    fn each_relation(&self, f: &mut dyn FnMut(Relation)) -> Result<(), StoreError> {
        self.scan(
            "SELECT id, record FROM tmp_relations",
            FeatureKind::Relation,
            f,
        )
    }

    fn delete_ways(&mut self, ids: &[i64]) -> Result<u64, StoreError> {
        let mut removed = 0u64;
        for chunk in ids.chunks(MAX_SQL_PARAMS) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!("DELETE FROM tmp_ways WHERE id IN ({placeholders})");
            removed += self.conn.execute(&sql, params_from_iter(chunk.iter()))? as u64;
        }
        self.way_total = self.way_total.saturating_sub(removed);
        Ok(removed)
    }

    fn node_count(&self) -> u64 {
        self.node_total
    }

    fn way_count(&self) -> u64 {
        self.way_total
    }

    fn relation_count(&self) -> u64 {
        self.relation_total
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.spill_nodes()?;
        self.spill_ways()?;
        self.spill_relations()?;
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), StoreError> {
        // Drop the scratch tables and compact whatever shares this file.
        self.conn.execute_batch(
            r#"
            DROP TABLE IF EXISTS tmp_nodes;
            DROP TABLE IF EXISTS tmp_ways;
            DROP TABLE IF EXISTS tmp_relations;
            ANALYZE;
            VACUUM;
            "#,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;

    #[test]
    fn test_roundtrip_and_counts() {
        contract::roundtrip_and_counts(&mut SpillStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_delete_semantics() {
        contract::delete_semantics(&mut SpillStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_tags_survive() {
        contract::tags_survive(&mut SpillStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_reads_require_flush() {
        let mut store = SpillStore::open_in_memory().unwrap();
        store.add_node(Node::new(1, 0.5, 0.5)).unwrap();
        // Buffered only: the read path queries SQLite directly.
        assert!(store.node(1).unwrap().is_none());
        assert_eq!(store.node_count(), 1);
        store.flush().unwrap();
        assert!(store.node(1).unwrap().is_some());
    }

    #[test]
    fn test_auto_spill_at_threshold() {
        let mut store = SpillStore::open_in_memory().unwrap();
        store.set_spill_threshold(10);
        for id in 0..25 {
            store.add_node(Node::new(id, 0.0, 0.0)).unwrap();
        }
        // Two full batches went to SQLite without an explicit flush.
        let mut seen = 0;
        store.each_node(&mut |_| seen += 1).unwrap();
        assert_eq!(seen, 20);
        store.flush().unwrap();
        seen = 0;
        store.each_node(&mut |_| seen += 1).unwrap();
        assert_eq!(seen, 25);
        assert_eq!(store.node_count(), 25);
    }

    #[test]
    fn test_delete_chunks_over_parameter_limit() {
        let mut store = SpillStore::open_in_memory().unwrap();
        let ids: Vec<i64> = (0..2500).collect();
        for &id in &ids {
            store.add_way(Way::new(id, vec![1, 2])).unwrap();
        }
        store.flush().unwrap();
        let removed = store.delete_ways(&ids).unwrap();
        assert_eq!(removed, 2500);
        assert_eq!(store.way_count(), 0);
    }

    #[test]
    fn test_undecodable_record_is_not_found() {
        let mut store = SpillStore::open_in_memory().unwrap();
        store.add_node(Node::new(1, 1.0, 2.0)).unwrap();
        store.flush().unwrap();
        store
            .conn
            .execute(
                "INSERT OR REPLACE INTO tmp_nodes (id, record) VALUES (2, X'DEADBEEF')",
                [],
            )
            .unwrap();
        assert!(store.node(2).unwrap().is_none());
        assert!(store.node(1).unwrap().is_some());
        // Scans skip the bad row instead of failing.
        let mut seen = Vec::new();
        store.each_node(&mut |n| seen.push(n.id)).unwrap();
        assert_eq!(seen, vec![1]);
    }

    #[test]
    fn test_teardown_drops_scratch_tables() {
        let mut store = SpillStore::open_in_memory().unwrap();
        store.add_way(Way::new(1, vec![1, 2])).unwrap();
        store.flush().unwrap();
        store.teardown().unwrap();
        assert!(store.way(1).is_err());
    }
}

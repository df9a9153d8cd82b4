//! SQLite storage backend

use super::traits::{
    GraphStore, NodeFilter, OpenStore, Similarity, StorageError, StorageResult, VectorIndexSpec,
};
use crate::graph::{Edge, EdgeId, EdgeKind, Node, NodeId, NodeType};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Column order shared by every node SELECT
const NODE_COLUMNS: &str = "id, node_type, name, aliases_json, description, embedding_json, created_at";

/// Column order shared by every edge SELECT
const EDGE_COLUMNS: &str = "id, kind, source_id, target_id, description, created_at";

type NodeRow = (String, String, String, String, Option<String>, Option<String>, String);
type EdgeRow = (String, String, String, String, Option<String>, String);

/// SQLite-backed graph store
///
/// One database file with tables for nodes, edges and the vector index
/// definition. Thread-safe via an internal mutex on the connection. Listing
/// queries order by rowid, which upserts preserve, so listings come back in
/// creation order.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                node_type TEXT NOT NULL,
                name TEXT NOT NULL,
                aliases_json TEXT NOT NULL,
                description TEXT,
                embedding_json TEXT,
                created_at TEXT NOT NULL,
                UNIQUE (node_type, name)
            );

            CREATE TABLE IF NOT EXISTS edges (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                source_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                UNIQUE (kind, source_id, target_id)
            );

            CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id);
            CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id);

            -- At most one row: the vector index over the embeddable label
            CREATE TABLE IF NOT EXISTS vector_index (
                slot INTEGER PRIMARY KEY CHECK (slot = 0),
                name TEXT NOT NULL,
                label TEXT NOT NULL,
                dimensions INTEGER NOT NULL,
                similarity TEXT NOT NULL
            );

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    fn read_node_row(row: &Row<'_>) -> rusqlite::Result<NodeRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
        ))
    }

    fn read_edge_row(row: &Row<'_>) -> rusqlite::Result<EdgeRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }

    /// Serialize a node to database columns
    fn node_to_row(node: &Node) -> StorageResult<NodeRow> {
        let embedding = node
            .embedding
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        Ok((
            node.id.as_str().to_string(),
            node.node_type.to_string(),
            node.name.clone(),
            serde_json::to_string(&node.aliases)?,
            node.description.clone(),
            embedding,
            node.created_at.to_rfc3339(),
        ))
    }

    /// Deserialize a node from database columns
    fn row_to_node(row: NodeRow) -> StorageResult<Node> {
        let (id, node_type, name, aliases, description, embedding, created_at) = row;
        Ok(Node {
            id: NodeId::from_string(id),
            node_type: NodeType::parse(&node_type),
            name,
            aliases: serde_json::from_str(&aliases)?,
            description,
            embedding: embedding.map(|e| serde_json::from_str(&e)).transpose()?,
            created_at: parse_timestamp(&created_at)?,
        })
    }

    fn row_to_edge(row: EdgeRow) -> StorageResult<Edge> {
        let (id, kind, source, target, description, created_at) = row;
        let kind = EdgeKind::parse(&kind)
            .ok_or_else(|| StorageError::Corrupt(format!("unknown edge kind '{kind}'")))?;
        Ok(Edge {
            id: EdgeId::from_string(id),
            kind,
            source: NodeId::from_string(source),
            target: NodeId::from_string(target),
            description,
            created_at: parse_timestamp(&created_at)?,
        })
    }

    fn query_edges(&self, sql: &str, node_id: &NodeId) -> StorageResult<Vec<Edge>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![node_id.as_str()], Self::read_edge_row)?;

        let mut edges = Vec::new();
        for row in rows {
            edges.push(Self::row_to_edge(row?)?);
        }
        Ok(edges)
    }
}

fn parse_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::DateParse(e.to_string()))
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl GraphStore for SqliteStore {
    // === Node Operations ===

    fn get_node(&self, id: &NodeId) -> StorageResult<Option<Node>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1"),
                params![id.as_str()],
                Self::read_node_row,
            )
            .optional()?;
        row.map(Self::row_to_node).transpose()
    }

    fn find_node(&self, node_type: &NodeType, name: &str) -> StorageResult<Option<Node>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE node_type = ?1 AND name = ?2"),
                params![node_type.as_str(), name],
                Self::read_node_row,
            )
            .optional()?;
        row.map(Self::row_to_node).transpose()
    }

    fn nodes(&self, filter: &NodeFilter) -> StorageResult<Vec<Node>> {
        let conn = self.lock()?;

        let mut sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE 1 = 1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref node_type) = filter.node_type {
            sql.push_str(" AND node_type = ?");
            params_vec.push(Box::new(node_type.to_string()));
        }

        sql.push_str(" ORDER BY rowid");

        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), Self::read_node_row)?;

        let mut nodes = Vec::new();
        for row in rows {
            nodes.push(Self::row_to_node(row?)?);
        }
        Ok(nodes)
    }

    fn save_node(&self, node: &Node) -> StorageResult<()> {
        let conn = self.lock()?;
        let (id, node_type, name, aliases, description, embedding, created_at) = Self::node_to_row(node)?;

        conn.execute(
            r#"
            INSERT INTO nodes (id, node_type, name, aliases_json, description, embedding_json, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                node_type = excluded.node_type,
                name = excluded.name,
                aliases_json = excluded.aliases_json,
                description = excluded.description,
                embedding_json = excluded.embedding_json
            "#,
            params![id, node_type, name, aliases, description, embedding, created_at],
        )?;
        Ok(())
    }

    fn delete_node(&self, id: &NodeId) -> StorageResult<bool> {
        let conn = self.lock()?;

        conn.execute(
            "DELETE FROM edges WHERE source_id = ?1 OR target_id = ?1",
            params![id.as_str()],
        )?;
        let rows = conn.execute("DELETE FROM nodes WHERE id = ?1", params![id.as_str()])?;

        Ok(rows > 0)
    }

    // === Edge Operations ===

    fn get_edge(&self, id: &EdgeId) -> StorageResult<Option<Edge>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {EDGE_COLUMNS} FROM edges WHERE id = ?1"),
                params![id.as_str()],
                Self::read_edge_row,
            )
            .optional()?;
        row.map(Self::row_to_edge).transpose()
    }

    fn find_edge(&self, kind: EdgeKind, source: &NodeId, target: &NodeId) -> StorageResult<Option<Edge>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {EDGE_COLUMNS} FROM edges WHERE kind = ?1 AND source_id = ?2 AND target_id = ?3"
                ),
                params![kind.as_str(), source.as_str(), target.as_str()],
                Self::read_edge_row,
            )
            .optional()?;
        row.map(Self::row_to_edge).transpose()
    }

    fn edges(&self) -> StorageResult<Vec<Edge>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {EDGE_COLUMNS} FROM edges ORDER BY rowid"))?;
        let rows = stmt.query_map([], Self::read_edge_row)?;

        let mut edges = Vec::new();
        for row in rows {
            edges.push(Self::row_to_edge(row?)?);
        }
        Ok(edges)
    }

    fn edges_from(&self, id: &NodeId) -> StorageResult<Vec<Edge>> {
        self.query_edges(
            &format!("SELECT {EDGE_COLUMNS} FROM edges WHERE source_id = ?1 ORDER BY rowid"),
            id,
        )
    }

    fn edges_to(&self, id: &NodeId) -> StorageResult<Vec<Edge>> {
        self.query_edges(
            &format!("SELECT {EDGE_COLUMNS} FROM edges WHERE target_id = ?1 ORDER BY rowid"),
            id,
        )
    }

    fn save_edge(&self, edge: &Edge) -> StorageResult<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO edges (id, kind, source_id, target_id, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                kind = excluded.kind,
                source_id = excluded.source_id,
                target_id = excluded.target_id,
                description = excluded.description
            "#,
            params![
                edge.id.as_str(),
                edge.kind.as_str(),
                edge.source.as_str(),
                edge.target.as_str(),
                edge.description,
                edge.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn delete_edge(&self, id: &EdgeId) -> StorageResult<bool> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM edges WHERE id = ?1", params![id.as_str()])?;
        Ok(rows > 0)
    }

    // === Vector Index ===

    fn create_vector_index(&self, spec: &VectorIndexSpec) -> StorageResult<()> {
        if let Some(existing) = self.vector_index()? {
            if &existing == spec {
                return Ok(());
            }
            return Err(StorageError::VectorIndexConflict(format!(
                "index '{}' on {} has {} dimensions ({})",
                existing.name,
                existing.label,
                existing.dimensions,
                existing.similarity.as_str()
            )));
        }

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO vector_index (slot, name, label, dimensions, similarity) VALUES (0, ?1, ?2, ?3, ?4)",
            params![
                spec.name,
                spec.label.as_str(),
                spec.dimensions as i64,
                spec.similarity.as_str()
            ],
        )?;
        Ok(())
    }

    fn vector_index(&self) -> StorageResult<Option<VectorIndexSpec>> {
        let conn = self.lock()?;
        let row: Option<(String, String, i64, String)> = conn
            .query_row(
                "SELECT name, label, dimensions, similarity FROM vector_index WHERE slot = 0",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        row.map(|(name, label, dimensions, raw)| {
            Similarity::parse(&raw)
                .map(|similarity| VectorIndexSpec {
                    name,
                    label: NodeType::parse(&label),
                    dimensions: dimensions.max(0) as usize,
                    similarity,
                })
                .ok_or_else(|| StorageError::Corrupt(format!("unknown index similarity '{raw}'")))
        })
        .transpose()
    }

    fn upsert_vectors(&self, ids: &[NodeId], vectors: &[Vec<f32>]) -> StorageResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut written = 0;
        for (id, vector) in ids.iter().zip(vectors) {
            written += tx.execute(
                "UPDATE nodes SET embedding_json = ?1 WHERE id = ?2",
                params![serde_json::to_string(vector)?, id.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(written)
    }

    fn clear(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("DELETE FROM edges; DELETE FROM nodes; DELETE FROM vector_index;")?;
        Ok(())
    }
}

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{IdCounters, PersistenceResult, PlannerSnapshot, PlannerStore};
use crate::member::CompositeGroup;

/// One table per entity family; each row keeps the entity as a JSON payload.
pub struct SqlitePlannerStore {
    connection: Mutex<Connection>,
}

const ENTITY_TABLES: [&str; 5] = ["tasks", "sessions", "revision_plans", "members", "resources"];

impl SqlitePlannerStore {
    pub fn new<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS planner_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                counters_json TEXT NOT NULL,
                group_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                payload TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY,
                payload TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS revision_plans (
                id INTEGER PRIMARY KEY,
                payload TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS members (
                id INTEGER PRIMARY KEY,
                payload TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS resources (
                id INTEGER PRIMARY KEY,
                payload TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn save_state(tx: &Transaction, snapshot: &PlannerSnapshot) -> PersistenceResult<()> {
        let counters = serde_json::to_string(&snapshot.counters)?;
        let group = serde_json::to_string(&snapshot.group)?;
        tx.execute("DELETE FROM planner_state", [])?;
        tx.execute(
            "INSERT INTO planner_state (id, counters_json, group_json) VALUES (1, ?1, ?2)",
            params![counters, group],
        )?;
        Ok(())
    }

    fn save_rows<T: Serialize>(
        tx: &Transaction,
        table: &str,
        rows: impl Iterator<Item = (u32, T)>,
    ) -> PersistenceResult<()> {
        let mut stmt = tx.prepare(&format!("INSERT INTO {table} (id, payload) VALUES (?1, ?2)"))?;
        for (id, row) in rows {
            let json = serde_json::to_string(&row)?;
            stmt.execute(params![id, json])?;
        }
        Ok(())
    }

    fn load_rows<T: DeserializeOwned>(conn: &Connection, table: &str) -> PersistenceResult<Vec<T>> {
        let mut stmt = conn.prepare(&format!("SELECT payload FROM {table} ORDER BY id ASC"))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for json in rows {
            out.push(serde_json::from_str(&json?)?);
        }
        Ok(out)
    }
}

impl PlannerStore for SqlitePlannerStore {
    fn save_planner(&self, snapshot: &PlannerSnapshot) -> PersistenceResult<()> {
        super::validate_snapshot(snapshot)?;
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        Self::save_state(&tx, snapshot)?;
        for table in ENTITY_TABLES {
            tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        Self::save_rows(&tx, "tasks", snapshot.tasks.iter().map(|t| (t.id, t)))?;
        Self::save_rows(&tx, "sessions", snapshot.sessions.iter().map(|s| (s.id, s)))?;
        // Plans are keyed by their task; there is one per task.
        Self::save_rows(
            &tx,
            "revision_plans",
            snapshot.revision_plans.iter().map(|p| (p.task_id, p)),
        )?;
        Self::save_rows(&tx, "members", snapshot.members.iter().map(|m| (m.id, m)))?;
        Self::save_rows(&tx, "resources", snapshot.resources.iter().map(|r| (r.id, r)))?;
        tx.commit()?;
        Ok(())
    }

    fn load_planner(&self) -> PersistenceResult<Option<PlannerSnapshot>> {
        let conn = self.connection.lock();

        let mut stmt =
            conn.prepare("SELECT counters_json, group_json FROM planner_state WHERE id = 1")?;
        let state: Option<(String, String)> = stmt
            .query_row([], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((counters_json, group_json)) = state else {
            return Ok(None);
        };

        let counters: IdCounters = serde_json::from_str(&counters_json)?;
        let group: CompositeGroup = serde_json::from_str(&group_json)?;

        let snapshot = PlannerSnapshot {
            counters,
            group,
            tasks: Self::load_rows(&conn, "tasks")?,
            sessions: Self::load_rows(&conn, "sessions")?,
            revision_plans: Self::load_rows(&conn, "revision_plans")?,
            members: Self::load_rows(&conn, "members")?,
            resources: Self::load_rows(&conn, "resources")?,
        };
        super::validate_snapshot(&snapshot)?;
        Ok(Some(snapshot))
    }
}

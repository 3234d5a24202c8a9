//! SQLite-backed rule store.
//!
//! One row per rule id. The full rule document is kept as JSON next to the
//! denormalized listing columns.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ErrorCode, NudgeError, NudgeResult};
use crate::rule::{RuleRow, TriggerRule};
use crate::traits::RuleStore;

const SELECT_COLUMNS: &str = "SELECT id, rule_id, name, enabled, rule, created_at, updated_at FROM rules";

/// SQLite-backed rule store
pub struct SqliteRuleStore {
    conn: Mutex<Connection>,
}

impl SqliteRuleStore {
    /// Open (or create) a store at the given path
    pub fn new(path: impl AsRef<Path>) -> NudgeResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!(path = %path.display(), "Opened rule store");
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> NudgeResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> NudgeResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| NudgeError::internal("rule store connection lock poisoned"))
    }

    fn init_schema(&self) -> NudgeResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS rules (
                id TEXT PRIMARY KEY,
                rule_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                rule TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_rules_updated ON rules(updated_at);
        "#,
        )?;
        Ok(())
    }

    fn timestamp(dt: DateTime<Utc>) -> String {
        // fixed-width so that text ordering is time ordering
        dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    fn parse_timestamp(raw: &str) -> NudgeResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| NudgeError::Parse {
                message: format!("invalid timestamp '{}': {}", raw, e),
                code: ErrorCode::ParseInvalidTimestamp,
            })
    }

    fn row_to_rule_row(row: &rusqlite::Row<'_>) -> NudgeResult<RuleRow> {
        let row_id: String = row.get(0)?;
        let rule_id: String = row.get(1)?;
        let name: String = row.get(2)?;
        let enabled: i32 = row.get(3)?;
        let rule_json: String = row.get(4)?;
        let created_at: String = row.get(5)?;
        let updated_at: String = row.get(6)?;

        let rule: TriggerRule = serde_json::from_str(&rule_json).map_err(|e| NudgeError::Persistence {
            message: format!("stored document for rule '{}' is unreadable: {}", rule_id, e),
            code: ErrorCode::StoreCorrupted,
            source: Some(Box::new(e)),
        })?;

        Ok(RuleRow {
            row_id,
            rule_id,
            name,
            enabled: enabled != 0,
            rule,
            created_at: Self::parse_timestamp(&created_at)?,
            updated_at: Self::parse_timestamp(&updated_at)?,
        })
    }

    fn get_row(conn: &Connection, rule_id: &str) -> NudgeResult<Option<RuleRow>> {
        let mut stmt = conn.prepare(&format!("{} WHERE rule_id = ?1", SELECT_COLUMNS))?;
        stmt.query_row(params![rule_id], |row| Ok(Self::row_to_rule_row(row)))
            .optional()?
            .transpose()
    }

    /// Row for one rule id.
    pub fn get(&self, rule_id: &str) -> NudgeResult<Option<RuleRow>> {
        let conn = self.conn()?;
        Self::get_row(&conn, rule_id)
    }
}

#[async_trait]
impl RuleStore for SqliteRuleStore {
    async fn list(&self) -> NudgeResult<Vec<RuleRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY updated_at DESC, rule_id ASC",
            SELECT_COLUMNS
        ))?;
        let results = stmt.query_map([], |row| Ok(Self::row_to_rule_row(row)))?;

        results
            .map(|r| r.map_err(NudgeError::from).and_then(|inner| inner))
            .collect()
    }

    async fn upsert(&self, rule: &TriggerRule) -> NudgeResult<RuleRow> {
        let conn = self.conn()?;
        let now = Self::timestamp(Utc::now());
        let document = serde_json::to_string(rule)?;

        conn.execute(
            r#"INSERT INTO rules (id, rule_id, name, enabled, rule, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
               ON CONFLICT(rule_id) DO UPDATE SET
                   name = excluded.name,
                   enabled = excluded.enabled,
                   rule = excluded.rule,
                   updated_at = excluded.updated_at"#,
            params![
                Uuid::new_v4().to_string(),
                rule.id,
                rule.name,
                rule.enabled as i32,
                document,
                now,
            ],
        )?;
        debug!(rule_id = %rule.id, "Upserted rule");

        Self::get_row(&conn, &rule.id)?
            .ok_or_else(|| NudgeError::persistence(format!("rule '{}' missing after upsert", rule.id)))
    }

    async fn remove(&self, rule_id: &str) -> NudgeResult<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM rules WHERE rule_id = ?1", params![rule_id])?;
        debug!(rule_id = %rule_id, deleted, "Removed rule");
        Ok(())
    }
}

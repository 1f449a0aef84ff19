//! The `rusqlite`-backed Timeline.
//!
//! Writes hold a short-lived `std::sync::Mutex` around one connection.
//! Reads open their own connection against the same file and never
//! touch that mutex — with WAL journaling this is the idiomatic way to
//! get lock-free SQLite readers without serializing them behind
//! writers.

use crate::error::TimelineError;
use crate::types::{TimelineEvent, TimelineFilters};
use kernel_core::{EventId, Modality};
use rusqlite::{params, Connection, ToSql};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::instrument;

/// Rows per session beyond which the oldest are silently trimmed.
const MAX_EVENTS_PER_SESSION: i64 = 1_000_000;

fn init_schema(conn: &Connection) -> Result<(), TimelineError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            event_type TEXT NOT NULL,
            data TEXT NOT NULL,
            metadata TEXT NOT NULL,
            modality TEXT NOT NULL,
            timestamp INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_events_session ON events(session_id, id);
        ",
    )?;
    Ok(())
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// The append-only event log shared by every component that needs to
/// record "what happened, when, for which session".
pub struct Timeline {
    path: PathBuf,
    writer: Arc<Mutex<Connection>>,
    in_memory: Option<Arc<Mutex<Connection>>>,
}

impl Timeline {
    /// Open (creating if absent) a Timeline backed by a file at `path`.
    pub fn open(path: &Path) -> Result<Self, TimelineError> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Arc::new(Mutex::new(conn)),
            in_memory: None,
        })
    }

    /// Open an ephemeral in-memory Timeline, for tests. In-memory
    /// connections can't be reopened per-read, so this variant reuses
    /// the writer connection for reads too.
    pub fn open_in_memory() -> Result<Self, TimelineError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        let shared = Arc::new(Mutex::new(conn));
        Ok(Self {
            path: PathBuf::new(),
            writer: shared.clone(),
            in_memory: Some(shared),
        })
    }

    fn reader(&self) -> Result<Arc<Mutex<Connection>>, TimelineError> {
        if let Some(shared) = &self.in_memory {
            return Ok(shared.clone());
        }
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA query_only = true;")?;
        Ok(Arc::new(Mutex::new(conn)))
    }

    /// Append one event, deriving its modality from `event_type` if
    /// `modality` is `None`. Triggers an oldest-trim if the session
    /// exceeds [`MAX_EVENTS_PER_SESSION`] rows.
    #[instrument(skip(self, data, metadata))]
    pub fn append(
        &self,
        session_id: &str,
        event_type: &str,
        data: serde_json::Value,
        metadata: serde_json::Value,
        modality: Option<Modality>,
    ) -> Result<EventId, TimelineError> {
        let modality = modality.unwrap_or_else(|| Modality::derive_from_event_type(event_type));
        let now = now_millis();
        let conn = self.writer.lock().expect("timeline writer mutex poisoned");

        conn.execute(
            "INSERT INTO events (session_id, event_type, data, metadata, modality, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session_id,
                event_type,
                data.to_string(),
                metadata.to_string(),
                modality.to_string(),
                now
            ],
        )?;
        let id = EventId(conn.last_insert_rowid() as u64);

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM events WHERE session_id = ?1",
            params![session_id],
            |r| r.get(0),
        )?;
        if count > MAX_EVENTS_PER_SESSION {
            let excess = count - MAX_EVENTS_PER_SESSION;
            conn.execute(
                "DELETE FROM events WHERE id IN (
                    SELECT id FROM events WHERE session_id = ?1 ORDER BY id ASC LIMIT ?2
                )",
                params![session_id, excess],
            )?;
        }

        Ok(id)
    }

    /// Query events, always newest-first.
    pub fn query(&self, filters: TimelineFilters) -> Result<Vec<TimelineEvent>, TimelineError> {
        let reader = self.reader()?;
        let conn = reader.lock().expect("timeline reader mutex poisoned");

        let mut sql = String::from(
            "SELECT id, session_id, event_type, data, metadata, modality, timestamp FROM events WHERE 1=1",
        );
        let mut bound: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(session_id) = filters.session_id.clone() {
            bound.push(Box::new(session_id));
            sql.push_str(&format!(" AND session_id = ?{}", bound.len()));
        }
        if let Some(event_type) = filters.event_type.clone() {
            bound.push(Box::new(event_type));
            sql.push_str(&format!(" AND event_type = ?{}", bound.len()));
        }
        if let Some(modality) = filters.modality {
            bound.push(Box::new(modality.to_string()));
            sql.push_str(&format!(" AND modality = ?{}", bound.len()));
        }
        if let Some(since) = filters.since {
            bound.push(Box::new(since));
            sql.push_str(&format!(" AND timestamp >= ?{}", bound.len()));
        }
        sql.push_str(" ORDER BY id DESC");
        if let Some(limit) = filters.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut stmt = conn.prepare(&sql)?;
        let params: Vec<&dyn ToSql> = bound.iter().map(|b| b.as_ref()).collect();

        let rows = stmt.query_map(
            params.as_slice(),
            |r| {
                let modality_str: String = r.get(5)?;
                let data_str: String = r.get(3)?;
                let metadata_str: String = r.get(4)?;
                Ok(TimelineEvent {
                    id: EventId(r.get::<_, i64>(0)? as u64),
                    session_id: r.get(1)?,
                    event_type: r.get(2)?,
                    data: serde_json::from_str(&data_str).unwrap_or(serde_json::Value::Null),
                    metadata: serde_json::from_str(&metadata_str).unwrap_or(serde_json::Value::Null),
                    modality: Modality::from_str(&modality_str).unwrap_or(Modality::Text),
                    timestamp: r.get(6)?,
                })
            },
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// The single most recent event for a session, if any.
    pub fn latest(&self, session_id: &str) -> Result<Option<TimelineEvent>, TimelineError> {
        let events = self.query(TimelineFilters {
            session_id: Some(session_id.to_string()),
            limit: Some(1),
            ..Default::default()
        })?;
        Ok(events.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_query_newest_first() {
        let timeline = Timeline::open_in_memory().unwrap();
        timeline
            .append("s1", "tool_call", serde_json::json!({"n": 1}), serde_json::json!({}), None)
            .unwrap();
        timeline
            .append("s1", "tool_call", serde_json::json!({"n": 2}), serde_json::json!({}), None)
            .unwrap();
        let events = timeline.query(TimelineFilters::default()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data["n"], 2);
        assert_eq!(events[1].data["n"], 1);
    }

    #[test]
    fn modality_defaults_via_derivation() {
        let timeline = Timeline::open_in_memory().unwrap();
        timeline
            .append("s1", "vision.analyze_image", serde_json::json!({}), serde_json::json!({}), None)
            .unwrap();
        let events = timeline.query(TimelineFilters::default()).unwrap();
        assert_eq!(events[0].modality, Modality::Vision);
    }

    #[test]
    fn explicit_modality_is_passed_through() {
        let timeline = Timeline::open_in_memory().unwrap();
        timeline
            .append("s1", "generic_event", serde_json::json!({}), serde_json::json!({}), Some(Modality::System))
            .unwrap();
        let events = timeline.query(TimelineFilters::default()).unwrap();
        assert_eq!(events[0].modality, Modality::System);
    }

    #[test]
    fn session_filter_isolates_sessions() {
        let timeline = Timeline::open_in_memory().unwrap();
        timeline.append("s1", "a", serde_json::json!({}), serde_json::json!({}), None).unwrap();
        timeline.append("s2", "a", serde_json::json!({}), serde_json::json!({}), None).unwrap();
        let events = timeline
            .query(TimelineFilters {
                session_id: Some("s1".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].session_id, "s1");
    }

    #[test]
    fn limit_caps_result_count() {
        let timeline = Timeline::open_in_memory().unwrap();
        for i in 0..5 {
            timeline.append("s1", "a", serde_json::json!({"i": i}), serde_json::json!({}), None).unwrap();
        }
        let events = timeline
            .query(TimelineFilters {
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn latest_returns_the_most_recent_event() {
        let timeline = Timeline::open_in_memory().unwrap();
        timeline.append("s1", "a", serde_json::json!({"i": 1}), serde_json::json!({}), None).unwrap();
        timeline.append("s1", "a", serde_json::json!({"i": 2}), serde_json::json!({}), None).unwrap();
        let latest = timeline.latest("s1").unwrap().unwrap();
        assert_eq!(latest.data["i"], 2);
    }
}

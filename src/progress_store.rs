//! Durable cursor state, keyed by canonical route id.
use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use rustc_hash::FxHashMap;
use std::path::Path;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub waypoint_index: usize,
    /// 0 or 1; the cursor moves when this flips back to 0
    pub parity_toggle: u8,
}

/// Persistence port for [`ProgressState`]. Entries are never deleted.
pub trait ProgressStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<ProgressState>>;
    fn set(&self, key: &str, state: ProgressState) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryProgressStore {
    states: Mutex<FxHashMap<String, ProgressState>>,
}

impl ProgressStore for MemoryProgressStore {
    fn get(&self, key: &str) -> Result<Option<ProgressState>> {
        Ok(self.states.lock().get(key).copied())
    }

    fn set(&self, key: &str, state: ProgressState) -> Result<()> {
        self.states.lock().insert(key.to_string(), state);
        Ok(())
    }
}

pub struct SqliteProgressStore {
    conn: Mutex<Connection>,
}

impl SqliteProgressStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Open progress db {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS progress (
                route_id TEXT PRIMARY KEY,
                waypoint_index INTEGER NOT NULL,
                parity_toggle INTEGER NOT NULL
            )",
            [],
        )
        .context("Create progress table")?;
        Ok(SqliteProgressStore {
            conn: Mutex::new(conn),
        })
    }
}

impl ProgressStore for SqliteProgressStore {
    fn get(&self, key: &str) -> Result<Option<ProgressState>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT waypoint_index, parity_toggle FROM progress WHERE route_id = ?",
                params![key],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()
            .with_context(|| format!("Read progress for {key}"))?;

        Ok(row.map(|(index, parity)| ProgressState {
            waypoint_index: index.max(0) as usize,
            parity_toggle: (parity & 1) as u8,
        }))
    }

    fn set(&self, key: &str, state: ProgressState) -> Result<()> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO progress (route_id, waypoint_index, parity_toggle) VALUES (?1, ?2, ?3)
                 ON CONFLICT(route_id) DO UPDATE SET
                    waypoint_index = excluded.waypoint_index,
                    parity_toggle = excluded.parity_toggle",
                params![key, state.waypoint_index as i64, state.parity_toggle as i64],
            )
            .with_context(|| format!("Write progress for {key}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn ProgressStore) {
        assert_eq!(store.get("INR1").unwrap(), None);

        let state = ProgressState {
            waypoint_index: 3,
            parity_toggle: 1,
        };
        store.set("INR1", state).unwrap();
        assert_eq!(store.get("INR1").unwrap(), Some(state));
        assert_eq!(store.get("INR2").unwrap(), None);

        let moved = ProgressState {
            waypoint_index: 4,
            parity_toggle: 0,
        };
        store.set("INR1", moved).unwrap();
        assert_eq!(store.get("INR1").unwrap(), Some(moved));
    }

    #[test]
    fn memory_store_round_trip() {
        exercise(&MemoryProgressStore::default());
    }

    #[test]
    fn sqlite_store_round_trip() {
        let store =
            SqliteProgressStore::from_connection(Connection::open_in_memory().unwrap()).unwrap();
        exercise(&store);
    }

    #[test]
    fn sqlite_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "routepulse-progress-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let state = ProgressState {
            waypoint_index: 2,
            parity_toggle: 1,
        };
        SqliteProgressStore::open(&path)
            .unwrap()
            .set("INR12627", state)
            .unwrap();
        let reopened = SqliteProgressStore::open(&path).unwrap();
        assert_eq!(reopened.get("INR12627").unwrap(), Some(state));

        let _ = std::fs::remove_file(&path);
    }
}

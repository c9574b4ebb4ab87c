//! Key-value settings backed by SQLite.
//!
//! Lives in the same database as the
//! [`SqliteCacheStorage`](crate::worker::sqlite::SqliteCacheStorage), so a
//! single `--db` path carries both the offline cache and the settings.

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Mutex;
use url::Url;

use crate::consts::{DEFAULT_CACHE_NAME, DEFAULT_ORIGIN};

/// Origin the app is served from.
pub const KEY_ORIGIN: &str = "origin";
/// Name of the cache store used by the offline worker.
pub const KEY_CACHE_NAME: &str = "cache_name";

/// Keys `config set` accepts.
pub const KNOWN_KEYS: &[&str] = &[KEY_ORIGIN, KEY_CACHE_NAME];

fn default_for(key: &str) -> Option<&'static str> {
    match key {
        KEY_ORIGIN => Some(DEFAULT_ORIGIN),
        KEY_CACHE_NAME => Some(DEFAULT_CACHE_NAME),
        _ => None,
    }
}

pub struct Config {
    conn: Mutex<Connection>,
}

impl Config {
    /// Open the settings table in the database at `path` (`":memory:"` works).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open settings database {path}"))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS settings (
                name       TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .context("failed to create settings table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE name = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("failed to read setting {key}"))?;
        Ok(value)
    }

    /// Store a setting. Unknown keys and unparsable origins are rejected
    /// before anything is written.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        if default_for(key).is_none() {
            bail!("unknown config key: {key} (known: {})", KNOWN_KEYS.join(", "));
        }
        if key == KEY_ORIGIN {
            Url::parse(value).with_context(|| format!("invalid origin: {value}"))?;
        }
        if value.trim().is_empty() {
            bail!("{key} cannot be empty");
        }

        self.conn.lock().unwrap().execute(
            "INSERT INTO settings (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE
             SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }

    /// Drop a stored setting. Returns whether one was stored.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let removed = self
            .conn
            .lock()
            .unwrap()
            .execute("DELETE FROM settings WHERE name = ?1", [key])?;
        Ok(removed > 0)
    }

    /// Every stored setting, by name.
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT name, value FROM settings ORDER BY name")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Effective value: the command-line override, else the stored value,
    /// else the built-in default.
    pub fn resolve(&self, key: &str, cli_override: Option<&str>) -> Result<String> {
        if let Some(value) = cli_override {
            return Ok(value.to_string());
        }
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }
        match default_for(key) {
            Some(default) => Ok(default.to_string()),
            None => bail!("no default for config key: {key}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Config {
        Config::open(":memory:").unwrap()
    }

    #[test]
    fn unset_key_reads_none() {
        assert!(settings().get(KEY_ORIGIN).unwrap().is_none());
    }

    #[test]
    fn stored_origin_reads_back() {
        let config = settings();
        config.set(KEY_ORIGIN, "http://localhost:9000").unwrap();
        assert_eq!(
            config.get(KEY_ORIGIN).unwrap().as_deref(),
            Some("http://localhost:9000")
        );
    }

    #[test]
    fn later_cache_name_wins() {
        let config = settings();
        config.set(KEY_CACHE_NAME, "restaurant-reviews-v1").unwrap();
        config.set(KEY_CACHE_NAME, "restaurant-reviews-v2").unwrap();
        assert_eq!(
            config.get(KEY_CACHE_NAME).unwrap().as_deref(),
            Some("restaurant-reviews-v2")
        );
        assert_eq!(config.list().unwrap().len(), 1);
    }

    #[test]
    fn rejects_unknown_key() {
        let err = settings().set("theme", "dark").unwrap_err();
        assert!(err.to_string().contains("unknown config key"));
    }

    #[test]
    fn rejects_bad_values() {
        let config = settings();
        assert!(config.set(KEY_ORIGIN, "not a url").is_err());
        assert!(config.set(KEY_CACHE_NAME, "  ").is_err());
        assert!(config.list().unwrap().is_empty());
    }

    #[test]
    fn remove_reports_whether_stored() {
        let config = settings();
        config.set(KEY_CACHE_NAME, "v2").unwrap();
        assert!(config.remove(KEY_CACHE_NAME).unwrap());
        assert!(!config.remove(KEY_CACHE_NAME).unwrap());
        assert!(config.get(KEY_CACHE_NAME).unwrap().is_none());
    }

    #[test]
    fn list_is_sorted_by_name() {
        let config = settings();
        config.set(KEY_ORIGIN, "http://localhost:9000").unwrap();
        config.set(KEY_CACHE_NAME, "v3").unwrap();
        let names: Vec<_> = config.list().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec![KEY_CACHE_NAME, KEY_ORIGIN]);
    }

    #[test]
    fn resolve_order() {
        let config = settings();
        assert_eq!(config.resolve(KEY_ORIGIN, None).unwrap(), DEFAULT_ORIGIN);
        assert_eq!(
            config.resolve(KEY_CACHE_NAME, None).unwrap(),
            DEFAULT_CACHE_NAME
        );

        config.set(KEY_ORIGIN, "http://stored.test").unwrap();
        assert_eq!(config.resolve(KEY_ORIGIN, None).unwrap(), "http://stored.test");
        assert_eq!(
            config.resolve(KEY_ORIGIN, Some("http://flag.test")).unwrap(),
            "http://flag.test"
        );
        assert!(config.resolve("theme", None).is_err());
    }

    #[test]
    fn shares_a_file_with_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let path = path.to_str().unwrap();

        let storage = crate::worker::sqlite::SqliteCacheStorage::open(path).unwrap();
        Config::open(path)
            .unwrap()
            .set(KEY_CACHE_NAME, "persisted")
            .unwrap();
        drop(storage);

        let config = Config::open(path).unwrap();
        assert_eq!(
            config.get(KEY_CACHE_NAME).unwrap().as_deref(),
            Some("persisted")
        );
    }
}

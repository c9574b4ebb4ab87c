use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::{Arc, Mutex};

use super::{Cache, Request, Response, cache_key};

/// SQLite-backed cache storage holding any number of named caches.
///
/// Shares a database with [`Config`](crate::config::Config).
#[derive(Clone)]
pub struct SqliteCacheStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCacheStorage {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open cache database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                cache_name   TEXT NOT NULL,
                url_key      TEXT NOT NULL,
                url          TEXT NOT NULL,
                status       INTEGER NOT NULL,
                content_type TEXT,
                body         BLOB NOT NULL,
                stored_at    TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (cache_name, url_key)
            )",
        )
        .context("failed to create cache table")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Open (or lazily create) the cache with the given name.
    pub fn open_cache(&self, name: &str) -> SqliteCache {
        SqliteCache {
            conn: Arc::clone(&self.conn),
            name: name.to_string(),
        }
    }

    /// Names of all caches holding at least one entry.
    pub fn names(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT DISTINCT cache_name FROM cache_entries ORDER BY cache_name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Drop a whole cache. Returns whether anything was deleted.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute("DELETE FROM cache_entries WHERE cache_name = ?1", [name])?;
        Ok(removed > 0)
    }
}

/// A single named cache inside [`SqliteCacheStorage`].
pub struct SqliteCache {
    conn: Arc<Mutex<Connection>>,
    name: String,
}

impl SqliteCache {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total stored body size in bytes.
    pub fn size(&self) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let size: i64 = conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(body)), 0) FROM cache_entries WHERE cache_name = ?1",
            [&self.name],
            |row| row.get(0),
        )?;
        Ok(size as u64)
    }
}

const UPSERT: &str = "INSERT INTO cache_entries
        (cache_name, url_key, url, status, content_type, body)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT(cache_name, url_key) DO UPDATE SET
        url = excluded.url,
        status = excluded.status,
        content_type = excluded.content_type,
        body = excluded.body,
        stored_at = datetime('now')";

#[async_trait]
impl Cache for SqliteCache {
    async fn match_request(&self, request: &Request) -> Result<Option<Response>> {
        let key = cache_key(&request.url);
        let conn = self.conn.lock().unwrap();
        let response = conn
            .query_row(
                "SELECT url, status, content_type, body FROM cache_entries
                 WHERE cache_name = ?1 AND url_key = ?2",
                [&self.name, &key],
                |row| {
                    Ok(Response {
                        url: row.get(0)?,
                        status: row.get(1)?,
                        content_type: row.get(2)?,
                        body: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(response)
    }

    async fn put(&self, request: &Request, response: &Response) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            UPSERT,
            params![
                self.name,
                cache_key(&request.url),
                request.url.as_str(),
                response.status,
                response.content_type,
                response.body,
            ],
        )?;
        Ok(())
    }

    async fn put_all(&self, entries: &[(Request, Response)]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT)?;
            for (request, response) in entries {
                stmt.execute(params![
                    self.name,
                    cache_key(&request.url),
                    request.url.as_str(),
                    response.status,
                    response.content_type,
                    response.body,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT url FROM cache_entries WHERE cache_name = ?1 ORDER BY stored_at, url_key",
        )?;
        let keys = stmt
            .query_map([&self.name], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn request(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    fn response(req: &Request, body: &str) -> Response {
        Response::new(&req.url, 200, Some("text/plain"), body)
    }

    #[tokio::test]
    async fn match_returns_none_when_empty() {
        let storage = SqliteCacheStorage::in_memory().unwrap();
        let cache = storage.open_cache("test");
        let req = request("http://localhost:8000/");
        assert!(cache.match_request(&req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_then_match() {
        let storage = SqliteCacheStorage::in_memory().unwrap();
        let cache = storage.open_cache("test");
        let req = request("http://localhost:8000/css/styles.css");
        cache.put(&req, &response(&req, "body {}")).await.unwrap();

        let hit = cache.match_request(&req).await.unwrap().unwrap();
        assert_eq!(hit.body, b"body {}");
        assert_eq!(hit.content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn match_ignores_query_string() {
        let storage = SqliteCacheStorage::in_memory().unwrap();
        let cache = storage.open_cache("test");
        let stored = request("http://localhost:8000/restaurant/?id=1");
        cache.put(&stored, &response(&stored, "shell")).await.unwrap();

        let other = request("http://localhost:8000/restaurant/?id=7");
        let hit = cache.match_request(&other).await.unwrap().unwrap();
        assert_eq!(hit.body, b"shell");
    }

    #[tokio::test]
    async fn put_replaces_same_slot() {
        let storage = SqliteCacheStorage::in_memory().unwrap();
        let cache = storage.open_cache("test");
        let a = request("http://localhost:8000/restaurant/?id=1");
        let b = request("http://localhost:8000/restaurant/?id=2");
        cache.put(&a, &response(&a, "one")).await.unwrap();
        cache.put(&b, &response(&b, "two")).await.unwrap();

        assert_eq!(cache.keys().await.unwrap().len(), 1);
        let hit = cache.match_request(&a).await.unwrap().unwrap();
        assert_eq!(hit.body, b"two");
    }

    #[tokio::test]
    async fn caches_are_isolated_by_name() {
        let storage = SqliteCacheStorage::in_memory().unwrap();
        let v1 = storage.open_cache("v1");
        let v2 = storage.open_cache("v2");
        let req = request("http://localhost:8000/");
        v1.put(&req, &response(&req, "old")).await.unwrap();

        assert!(v2.match_request(&req).await.unwrap().is_none());
        assert_eq!(storage.names().unwrap(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn delete_drops_whole_cache() {
        let storage = SqliteCacheStorage::in_memory().unwrap();
        let cache = storage.open_cache("v1");
        let req = request("http://localhost:8000/");
        cache.put(&req, &response(&req, "x")).await.unwrap();

        assert!(storage.delete("v1").unwrap());
        assert!(!storage.delete("v1").unwrap());
        assert!(cache.match_request(&req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_all_stores_every_entry() {
        let storage = SqliteCacheStorage::in_memory().unwrap();
        let cache = storage.open_cache("test");
        let entries: Vec<_> = ["http://localhost:8000/", "http://localhost:8000/img/1.jpg"]
            .iter()
            .map(|u| {
                let req = request(u);
                let resp = response(&req, u);
                (req, resp)
            })
            .collect();
        cache.put_all(&entries).await.unwrap();
        assert_eq!(cache.keys().await.unwrap().len(), 2);
        assert!(cache.size().unwrap() > 0);
    }

    #[tokio::test]
    async fn persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache-test.db");
        let path_str = path.to_str().unwrap();
        let req = request("http://localhost:8000/data/restaurants.json");

        {
            let storage = SqliteCacheStorage::open(path_str).unwrap();
            let cache = storage.open_cache("restaurant-reviews");
            cache.put(&req, &response(&req, "{}")).await.unwrap();
        }

        {
            let storage = SqliteCacheStorage::open(path_str).unwrap();
            let cache = storage.open_cache("restaurant-reviews");
            assert!(cache.match_request(&req).await.unwrap().is_some());
        }
    }
}

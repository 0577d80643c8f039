//! Partition and entry operations.
//!
//! A partition is a named, durable key→response mapping. Keys are request
//! identities; only GET requests are ever written or matched. Enumeration
//! order is insertion order, and replacing a key moves it to the end.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};
use url::Url;

use super::connection::CacheDb;
use super::hash::compute_request_key;
use crate::Error;
use crate::http::{Headers, Request, Response, ResponseKind};

const ENTRY_COLUMNS: &str = "e.status, e.status_text, e.response_type, e.response_url, e.headers_json, e.body";

/// Identity of a stored request, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoredRequest {
    /// Partition key (see [`compute_request_key`]).
    pub key: String,
    pub method: String,
    pub url: String,
    /// Status of the stored response.
    pub status: u16,
    pub stored_at: String,
}

/// Partition name with its entry count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PartitionSummary {
    pub name: String,
    pub entries: usize,
}

/// Raw stored response columns, decoded outside the connection thread.
struct EntryRow {
    status: i64,
    status_text: String,
    response_type: String,
    response_url: Option<String>,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            status: row.get(0)?,
            status_text: row.get(1)?,
            response_type: row.get(2)?,
            response_url: row.get(3)?,
            headers_json: row.get(4)?,
            body: row.get(5)?,
        })
    }

    fn into_response(self) -> Result<Response, Error> {
        let status = u16::try_from(self.status).map_err(|e| Error::CorruptEntry(format!("status: {e}")))?;
        let kind = ResponseKind::parse(&self.response_type)
            .ok_or_else(|| Error::CorruptEntry(format!("unknown response type: {}", self.response_type)))?;
        let headers: Headers =
            serde_json::from_str(&self.headers_json).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;
        let url = self
            .response_url
            .map(|u| Url::parse(&u))
            .transpose()
            .map_err(|e| Error::CorruptEntry(format!("url: {e}")))?;

        Ok(Response { url, status, status_text: self.status_text, kind, headers, body: Bytes::from(self.body) })
    }
}

fn query_entry(
    conn: &rusqlite::Connection, sql: &str, params: &[&dyn rusqlite::ToSql],
) -> Result<Option<EntryRow>, Error> {
    let mut stmt = conn.prepare(sql)?;
    match stmt.query_row(params, EntryRow::from_row) {
        Ok(row) => Ok(Some(row)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl CacheDb {
    /// Open a partition, creating it if it does not exist yet.
    pub async fn open_partition(&self, name: &str) -> Result<Partition, Error> {
        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![owned, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(self.partition(name))
    }

    /// Handle to a partition without creating it.
    ///
    /// Reads through a handle to a missing partition see no entries.
    pub fn partition(&self, name: &str) -> Partition {
        Partition { db: self.clone(), name: name.to_string() }
    }

    pub async fn has_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All partition names in creation order.
    pub async fn partition_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY id ASC")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                let names = rows.collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Partition names with entry counts, in creation order.
    pub async fn partition_summaries(&self) -> Result<Vec<PartitionSummary>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PartitionSummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT p.name, COUNT(e.id) FROM partitions p
                     LEFT JOIN entries e ON e.partition_id = p.id
                     GROUP BY p.id ORDER BY p.id ASC",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(PartitionSummary { name: row.get(0)?, entries: row.get::<_, i64>(1)? as usize })
                })?;
                let summaries = rows.collect::<Result<Vec<_>, _>>()?;
                Ok(summaries)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and every entry in it.
    ///
    /// Returns false if no partition had that name.
    pub async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "DELETE FROM entries WHERE partition_id IN (SELECT id FROM partitions WHERE name = ?1)",
                    params![name],
                )?;
                let deleted = tx.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Look a request up in every partition, oldest partition first.
    ///
    /// Non-GET requests never match.
    pub async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.method.is_get() {
            return Ok(None);
        }

        let key = compute_request_key(&request.method, &request.url);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let sql = format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries e
                     JOIN partitions p ON p.id = e.partition_id
                     WHERE e.key_hash = ?1
                     ORDER BY p.id ASC LIMIT 1"
                );
                query_entry(conn, &sql, &[&key])
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::into_response).transpose()
    }
}

/// Handle to one named partition.
///
/// Owns a clone of the store handle, so it can move into detached tasks.
#[derive(Clone, Debug)]
pub struct Partition {
    db: CacheDb,
    name: String,
}

impl Partition {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a response for a GET request.
    ///
    /// Replaces any previous entry for the same request, moving it to the end
    /// of enumeration order. Recreates the partition if it was deleted.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        if !request.method.is_get() {
            return Err(Error::MethodNotCacheable(format!("{} {}", request.method, request.url)));
        }

        let name = self.name.clone();
        let key = compute_request_key(&request.method, &request.url);
        let method = request.method.to_string();
        let url = request.url.to_string();
        let status = i64::from(response.status);
        let status_text = response.status_text.clone();
        let kind = response.kind.as_str();
        let response_url = response.url.as_ref().map(Url::to_string);
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;
        let body = response.body.to_vec();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![name, stored_at],
                )?;
                let partition_id: i64 =
                    tx.query_row("SELECT id FROM partitions WHERE name = ?1", params![name], |row| row.get(0))?;
                tx.execute(
                    "DELETE FROM entries WHERE partition_id = ?1 AND key_hash = ?2",
                    params![partition_id, key],
                )?;
                tx.execute(
                    "INSERT INTO entries (
                        partition_id, key_hash, method, url, status, status_text,
                        response_type, response_url, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    params![
                        partition_id,
                        key,
                        method,
                        url,
                        status,
                        status_text,
                        kind,
                        response_url,
                        headers_json,
                        body,
                        stored_at
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look a request up in this partition. Non-GET requests never match.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.method.is_get() {
            return Ok(None);
        }

        let name = self.name.clone();
        let key = compute_request_key(&request.method, &request.url);
        let row = self
            .db
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let sql = format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries e
                     JOIN partitions p ON p.id = e.partition_id
                     WHERE p.name = ?1 AND e.key_hash = ?2"
                );
                query_entry(conn, &sql, &[&name, &key])
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::into_response).transpose()
    }

    /// Stored requests in enumeration (insertion) order.
    pub async fn keys(&self) -> Result<Vec<StoredRequest>, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<StoredRequest>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.key_hash, e.method, e.url, e.status, e.stored_at FROM entries e
                     JOIN partitions p ON p.id = e.partition_id
                     WHERE p.name = ?1 ORDER BY e.id ASC",
                )?;
                let rows = stmt.query_map(params![name], |row| {
                    Ok(StoredRequest {
                        key: row.get(0)?,
                        method: row.get(1)?,
                        url: row.get(2)?,
                        status: row.get::<_, i64>(3)? as u16,
                        stored_at: row.get(4)?,
                    })
                })?;
                let keys = rows.collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one entry by key. Returns false if it was already gone.
    pub async fn delete(&self, key: &str) -> Result<bool, Error> {
        let name = self.name.clone();
        let key = key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries
                     WHERE key_hash = ?2 AND partition_id = (SELECT id FROM partitions WHERE name = ?1)",
                    params![name, key],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn entry_count(&self) -> Result<usize, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries e
                     JOIN partitions p ON p.id = e.partition_id
                     WHERE p.name = ?1",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }
}

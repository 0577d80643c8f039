//! Schema migrations for the partition store.
//!
//! Applied versions are recorded in `_migrations`. Each pending migration
//! runs in its own transaction together with its version row, so a failed
//! migration leaves no partial schema behind.

use super::Error;
use tokio_rusqlite::{Connection, params};

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Applied in ascending version order.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "partitions",
    sql: include_str!("../../migrations/001_partitions.sql"),
}];

/// Apply every migration newer than the recorded schema version.
///
/// Returns the versions applied by this call (empty when up to date).
pub async fn run(conn: &Connection) -> Result<Vec<i64>, Error> {
    conn.call(|conn| -> Result<Vec<i64>, Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        let mut applied = Vec::new();
        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            let tx = conn.transaction()?;
            tx.execute_batch(migration.sql)
                .map_err(|e| Error::MigrationFailed(format!("{} ({}): {e}", migration.version, migration.name)))?;
            tx.execute(
                "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;

            tracing::debug!(version = migration.version, name = migration.name, "applied migration");
            applied.push(migration.version);
        }

        Ok(applied)
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_twice_applies_once() {
        let conn = Connection::open_in_memory().await.unwrap();
        assert_eq!(run(&conn).await.unwrap(), vec![1]);
        assert!(run(&conn).await.unwrap().is_empty());

        let recorded: Vec<(i64, String)> = conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT version, name FROM _migrations ORDER BY version")?;
                let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .unwrap();
        assert_eq!(recorded, vec![(1, "partitions".to_string())]);
    }

    #[tokio::test]
    async fn test_schema_tables() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        let tables: Vec<String> = conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master
                     WHERE type='table' AND name IN ('partitions', 'entries') ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .unwrap();
        assert_eq!(tables, vec!["entries", "partitions"]);
    }

    #[test]
    fn test_versions_ascending() {
        assert!(MIGRATIONS.windows(2).all(|w| w[0].version < w[1].version));
        assert!(MIGRATIONS.iter().all(|m| m.version > 0));
    }
}

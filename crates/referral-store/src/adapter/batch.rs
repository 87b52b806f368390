//! A bounded-queue batched writer: callers enqueue set-document operations
//! and a terminal `commit()` runs them in chunks of at most
//! [`MAX_CHUNK_SIZE`], each chunk inside its own transaction, awaiting every
//! chunk before returning. This is the concrete realization of the
//! "chunked batch writer" persistence-adapter requirement: one
//! `SAVEPOINT`-scoped transaction per chunk, sized to bound a single
//! transaction's lock hold time rather than because `SQLite` itself caps
//! transaction size.

use rusqlite::Connection;

use crate::errors::Result;
use crate::sqlite::connection::ConnectionPool;

/// The maximum number of write operations committed in one transaction.
pub const MAX_CHUNK_SIZE: usize = 400;

type Op<'a> = Box<dyn FnOnce(&Connection) -> rusqlite::Result<()> + 'a>;

/// A queue of pending write operations, chunked and committed by
/// [`BatchWriter::commit`]. Internally stateless across calls: a fresh
/// writer is built per request.
#[derive(Default)]
pub struct BatchWriter<'a> {
    ops: Vec<Op<'a>>,
}

impl<'a> BatchWriter<'a> {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Enqueue one set-document operation.
    pub fn set(&mut self, op: impl FnOnce(&Connection) -> rusqlite::Result<()> + 'a) {
        self.ops.push(Box::new(op));
    }

    /// Number of operations currently queued.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Commit every queued operation against `pool`, in chunks of at most
    /// [`MAX_CHUNK_SIZE`], each chunk in its own transaction. All chunks are
    /// run to completion (or the first error is surfaced); chunk ordering
    /// relative to each other is unspecified, matching the persistence
    /// adapter's write-ordering guarantee.
    pub fn commit(self, pool: &ConnectionPool) -> Result<()> {
        for chunk in self.ops.into_iter().collect::<Vec<_>>().chunks_mut(MAX_CHUNK_SIZE.max(1)) {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;
            for op in std::mem::take(chunk) {
                op(&tx)?;
            }
            tx.commit()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::connection::{new_in_memory, ConnectionConfig};

    fn test_pool() -> ConnectionPool {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        pool.get()
            .unwrap()
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, v INTEGER);")
            .unwrap();
        pool
    }

    #[test]
    fn empty_writer_commits_trivially() {
        let pool = test_pool();
        BatchWriter::new().commit(&pool).unwrap();
    }

    #[test]
    fn single_chunk_commits_all_ops() {
        let pool = test_pool();
        let mut writer = BatchWriter::new();
        for i in 0..10 {
            writer.set(move |conn| {
                conn.execute("INSERT INTO t (id, v) VALUES (?1, ?2)", [i, i * 2])?;
                Ok(())
            });
        }
        writer.commit(&pool).unwrap();

        let count: i64 = pool
            .get()
            .unwrap()
            .query_row("SELECT count(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 10);
    }

    #[test]
    fn rotates_across_multiple_chunks() {
        let pool = test_pool();
        let mut writer = BatchWriter::new();
        let total = MAX_CHUNK_SIZE * 2 + 7;
        for i in 0..total {
            writer.set(move |conn| {
                conn.execute(
                    "INSERT INTO t (id, v) VALUES (?1, ?2)",
                    [i as i64, i as i64],
                )?;
                Ok(())
            });
        }
        writer.commit(&pool).unwrap();

        let count: i64 = pool
            .get()
            .unwrap()
            .query_row("SELECT count(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, total as i64);
    }

    #[test]
    fn failing_op_surfaces_error() {
        let pool = test_pool();
        let mut writer = BatchWriter::new();
        writer.set(|conn| conn.execute("INSERT INTO t (id, v) VALUES (1, 1)", []).map(|_| ()));
        writer.set(|conn| {
            // duplicate primary key: fails
            conn.execute("INSERT INTO t (id, v) VALUES (1, 2)", []).map(|_| ())
        });
        assert!(writer.commit(&pool).is_err());
    }
}

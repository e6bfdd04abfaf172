use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;

use crate::errors::ExecutionError;

/// Bounded pool of sandbox connections.
///
/// Each connection owns an empty in-memory main database; exercise
/// namespaces are attached per submission and detached before the
/// connection is returned. Capacity is enforced by a semaphore, so a
/// discarded connection still frees its slot.
#[derive(Clone)]
pub struct SqlitePool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    sem: Arc<Semaphore>,
    idle: Mutex<Vec<Connection>>,
    acquire_timeout: Duration,
}

impl SqlitePool {
    pub fn new(capacity: usize, acquire_timeout: Duration) -> Self {
        SqlitePool {
            inner: Arc::new(PoolInner {
                sem: Arc::new(Semaphore::new(capacity.max(1))),
                idle: Mutex::new(Vec::new()),
                acquire_timeout,
            }),
        }
    }

    /// Waits at most the configured acquire timeout for a free slot,
    /// surfacing PoolExhausted instead of queuing unboundedly.
    pub async fn acquire(&self) -> Result<PooledConn, ExecutionError> {
        let permit = match timeout(
            self.inner.acquire_timeout,
            self.inner.sem.clone().acquire_owned(),
        )
        .await
        {
            Err(_) => return Err(ExecutionError::pool_exhausted()),
            Ok(Err(_)) => return Err(ExecutionError::infrastructure("connection pool closed")),
            Ok(Ok(p)) => p,
        };

        let reused = self.inner.idle.lock().unwrap().pop();
        let conn = match reused {
            Some(c) => c,
            None => Connection::open_in_memory().map_err(|e| {
                ExecutionError::infrastructure(format!("failed to open sandbox connection: {}", e))
            })?,
        };

        Ok(PooledConn {
            conn: Some(conn),
            pool: Arc::clone(&self.inner),
            _permit: permit,
        })
    }

    /// Free slots right now. Used by tests to check that connections are
    /// returned on every path.
    pub fn available(&self) -> usize {
        self.inner.sem.available_permits()
    }
}

/// Scoped connection lease; returns the connection on drop.
#[derive(Debug)]
pub struct PooledConn {
    conn: Option<Connection>,
    pool: Arc<PoolInner>,
    _permit: OwnedSemaphorePermit,
}

impl PooledConn {
    /// Drops the connection instead of returning it, e.g. after a failed
    /// detach left it in an unknown state. The permit is still released.
    pub fn discard(mut self) {
        self.conn = None;
    }
}

impl Deref for PooledConn {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("pooled connection already taken")
    }
}

impl DerefMut for PooledConn {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("pooled connection already taken")
    }
}

impl Drop for PooledConn {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.idle.lock().unwrap().push(conn);
        }
    }
}

/// Caller-side cancellation flag for an in-flight submission. Cloned into
/// the sandbox watchdog, which interrupts the running statement when set.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_and_release() {
        let pool = SqlitePool::new(2, Duration::from_millis(100));
        assert_eq!(pool.available(), 2);
        {
            let a = pool.acquire().await.unwrap();
            let _b = pool.acquire().await.unwrap();
            assert_eq!(pool.available(), 0);
            drop(a);
        }
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn exhaustion_times_out() {
        let pool = SqlitePool::new(1, Duration::from_millis(50));
        let held = pool.acquire().await.unwrap();
        let err = pool.acquire().await.unwrap_err();
        assert_eq!(err.kind, crate::errors::ExecErrorKind::PoolExhausted);
        drop(held);
        assert!(pool.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn discard_frees_the_slot() {
        let pool = SqlitePool::new(1, Duration::from_millis(50));
        let conn = pool.acquire().await.unwrap();
        conn.discard();
        assert_eq!(pool.available(), 1);
        assert!(pool.acquire().await.is_ok());
    }
}

//! Idle connections kept per address between streams.

use crate::transport::FrameTransport;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tandem_rpc_core::{ClientConfig, error::StreamError};

/// Invoked exactly once when a stream is closed, with the final error of the stream.
pub type ReleaseHook = Box<dyn FnOnce(Option<StreamError>) + Send + Sync>;

struct PoolConn<T> {
    conn: Arc<T>,
    created: Instant,
}

/// Keeps healthy connections for reuse.
///
/// A connection goes back only when its stream ended cleanly (no error or the graceful
/// end of stream) and the idle list of its address has room, otherwise it is dropped.
pub struct ConnPool<T: FrameTransport> {
    size: usize,
    ttl: Duration,
    idle: Mutex<HashMap<String, Vec<PoolConn<T>>>>,
}

impl<T: FrameTransport> ConnPool<T> {
    pub fn new(config: &ClientConfig) -> Self {
        Self { size: config.pool_size, ttl: config.pool_ttl, idle: Mutex::new(HashMap::new()) }
    }

    /// Take the most recently returned connection of `addr`, expired ones are dropped on the way.
    pub fn checkout(&self, addr: &str) -> Option<Arc<T>> {
        let mut idle = self.idle.lock();
        let conns = idle.get_mut(addr)?;
        while let Some(item) = conns.pop() {
            if item.created.elapsed() < self.ttl {
                trace!("checkout {:?} from pool", item.conn);
                return Some(item.conn);
            }
            debug!("drop expired {:?}", item.conn);
        }
        None
    }

    /// Returns true when the connection is kept.
    pub fn release(&self, addr: &str, conn: Arc<T>, err: Option<&StreamError>) -> bool {
        if !StreamError::conn_reusable(err) {
            debug!("drop {:?} after err: {:?}", conn, err);
            return false;
        }
        if !conn.is_healthy() {
            debug!("drop unhealthy {:?}", conn);
            return false;
        }
        let mut idle = self.idle.lock();
        let conns = idle.entry(addr.to_string()).or_default();
        if conns.len() >= self.size {
            return false;
        }
        conns.push(PoolConn { conn, created: Instant::now() });
        true
    }

    pub fn idle_count(&self, addr: &str) -> usize {
        self.idle.lock().get(addr).map(|conns| conns.len()).unwrap_or(0)
    }

    /// Bind a [ReleaseHook] that returns `conn` to this pool
    pub fn release_hook(self: &Arc<Self>, addr: &str, conn: Arc<T>) -> ReleaseHook {
        let pool = self.clone();
        let addr = addr.to_string();
        Box::new(move |err: Option<StreamError>| {
            pool.release(&addr, conn, err.as_ref());
        })
    }
}

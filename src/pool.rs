//! Bounded IMAP connection pool
//!
//! The pool owns every live session for one remote endpoint. A
//! semaphore bounds the number of sessions outstanding at
//! `max_connections`; borrowers past the bound wait until a release.
//! Sessions are handed out as RAII [`PooledConnection`] guards, so a
//! borrow is returned on every exit path, including early returns and
//! failures between acquire and use. A leaked borrow would
//! permanently shrink effective capacity; the guard makes that
//! impossible to write.
//!
//! The pool is constructed inert: no session exists until the first
//! [`ConnectionPool::acquire`].

use crate::config::RepositoryConfig;
use crate::connection::{self, ImapSession};
use crate::error::{Error, Result};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

struct PoolShared {
    /// Sessions not currently lent out.
    idle: Mutex<Vec<ImapSession>>,
    /// Bumped by `close()`; guards from an older generation drop
    /// their session on release instead of returning it.
    generation: AtomicU64,
}

/// A bounded pool of authenticated sessions to one remote endpoint.
///
/// Clones share the same pool state.
#[derive(Clone)]
pub struct ConnectionPool {
    config: Arc<RepositoryConfig>,
    semaphore: Arc<Semaphore>,
    shared: Arc<PoolShared>,
}

impl ConnectionPool {
    #[must_use]
    pub fn new(config: Arc<RepositoryConfig>) -> Self {
        let capacity = config.max_connections.max(1);
        Self {
            config,
            semaphore: Arc::new(Semaphore::new(capacity)),
            shared: Arc::new(PoolShared {
                idle: Mutex::new(Vec::with_capacity(capacity)),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Borrow a session, waiting for a capacity slot if every one is
    /// lent out. Reuses an idle session when available, otherwise
    /// dials a new one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] when a fresh session cannot be
    /// established. The capacity slot is released again in that case.
    pub async fn acquire(&self) -> Result<PooledConnection> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::Connection("connection pool shut down".into()))?;

        let generation = self.shared.generation.load(Ordering::Acquire);
        let existing = self.shared.idle.lock().unwrap().pop();

        let session = match existing {
            Some(session) => {
                debug!("Reusing pooled connection");
                session
            }
            None => connection::connect(&self.config).await?,
        };

        Ok(PooledConnection {
            session: Some(session),
            generation,
            shared: Arc::clone(&self.shared),
            _permit: permit,
        })
    }

    /// Terminate all idle sessions and mark outstanding ones for
    /// termination upon release. Later `acquire` calls dial fresh
    /// sessions as needed.
    pub async fn close(&self) {
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        let sessions: Vec<ImapSession> =
            self.shared.idle.lock().unwrap().drain(..).collect();
        debug!("Closing {} idle connection(s)", sessions.len());
        for mut session in sessions {
            session.logout().await.ok();
        }
    }
}

/// A borrowed session. Dropping the guard returns the session to the
/// pool (or terminates it if the pool was closed in the meantime) and
/// frees the capacity slot.
pub struct PooledConnection {
    session: Option<ImapSession>,
    generation: u64,
    shared: Arc<PoolShared>,
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    /// Drop the session instead of returning it, freeing the
    /// capacity slot. For sessions known to be broken.
    pub fn discard(mut self) {
        self.session = None;
    }
}

impl Deref for PooledConnection {
    type Target = ImapSession;

    fn deref(&self) -> &ImapSession {
        self.session.as_ref().expect("session present until drop")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut ImapSession {
        self.session.as_mut().expect("session present until drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            if self.generation == self.shared.generation.load(Ordering::Acquire) {
                self.shared.idle.lock().unwrap().push(session);
            }
            // A stale session is dropped here; the transport closes
            // with it.
        }
    }
}

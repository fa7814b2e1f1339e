//! Remote IMAP repository layer for mail synchronization tools
//!
//! A [`Repository`] presents a named collection of remote mail
//! folders backed by a bounded pool of IMAP connections. It applies
//! user-defined folder selection and renaming policy during
//! discovery, and manages idle-connection keepalive in the
//! background. The message-level synchronization engine sits above
//! this crate and consumes the folder handles it exposes.
//!
//! Connections are lent out as RAII guards from the shared
//! [`ConnectionPool`], so every borrower releases on every exit
//! path; discovery, folder creation, and the keepalive task all
//! coordinate through the pool's own synchronization alone.

mod config;
mod connection;
mod error;
mod folder;
mod keepalive;
mod policy;
mod pool;
mod repository;

pub use config::{IMAP_PORT, IMAPS_PORT, RepositoryConfig};
pub use connection::{ImapSession, ListEntry, SessionStream};
pub use error::{Error, Result};
pub use folder::{Folder, FolderHandle, MappedFolder};
pub use policy::FolderPolicy;
pub use pool::{ConnectionPool, PooledConnection};
pub use repository::{MappedRepository, Repository};

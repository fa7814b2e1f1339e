//! Remote repository composition root
//!
//! A [`Repository`] presents a named collection of mail folders
//! backed by a pooled connection to one remote endpoint. It owns the
//! connection pool, the folder policy, the discovered-folder cache,
//! and the keepalive task, and exposes the configuration accessors
//! the synchronization engine reads between passes.
//!
//! The repository is generic over the folder handle type discovery
//! constructs; [`MappedRepository`] is the variant whose folders
//! carry a persistent UID-map overlay.

use crate::config::RepositoryConfig;
use crate::connection;
use crate::error::{Error, Result};
use crate::folder::{Folder, FolderHandle, MappedFolder};
use crate::keepalive::KeepaliveTask;
use crate::policy::FolderPolicy;
use crate::pool::ConnectionPool;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A remote IMAP repository.
pub struct Repository<F: FolderHandle = Folder> {
    name: String,
    config: Arc<RepositoryConfig>,
    policy: FolderPolicy,
    pool: ConnectionPool,
    /// Discovered folders; populated once and handed out as shared
    /// handles until explicitly invalidated. The async mutex also
    /// serializes concurrent first-time discovery so exactly one
    /// listing request is issued.
    folders: tokio::sync::Mutex<Option<Vec<Arc<F>>>>,
    /// Hierarchy delimiter observed on the first parsed listing
    /// entry.
    separator: OnceLock<char>,
    keepalive: Mutex<Option<KeepaliveTask>>,
}

/// Repository variant whose folder handles track a UID-map overlay.
pub type MappedRepository = Repository<MappedFolder>;

impl<F: FolderHandle> Repository<F> {
    /// Open a repository, compiling the folder policy from the
    /// configured expressions.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a policy expression is
    /// malformed.
    pub fn open(name: impl Into<String>, config: RepositoryConfig) -> Result<Self> {
        let policy = FolderPolicy::from_exprs(
            config.name_translate.as_deref(),
            config.folder_filter.as_deref(),
            config.folder_sort.as_deref(),
            config.folder_includes.clone(),
        )?;
        Ok(Self::open_with_policy(name, config, policy))
    }

    /// Open a repository with an explicitly built policy, bypassing
    /// expression compilation.
    pub fn open_with_policy(
        name: impl Into<String>,
        config: RepositoryConfig,
        policy: FolderPolicy,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            name: name.into(),
            pool: ConnectionPool::new(Arc::clone(&config)),
            config,
            policy,
            folders: tokio::sync::Mutex::new(None),
            separator: OnceLock::new(),
            keepalive: Mutex::new(None),
        }
    }

    // -- configuration accessors --

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.config.host
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.config.username
    }

    /// The port to dial; protocol default when not configured.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.config.effective_port()
    }

    #[must_use]
    pub fn ssl(&self) -> bool {
        self.config.ssl
    }

    #[must_use]
    pub fn preauth_tunnel(&self) -> Option<&str> {
        self.config.preauth_tunnel.as_deref()
    }

    /// Root path under which folder discovery is scoped.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.config.reference
    }

    #[must_use]
    pub fn max_connections(&self) -> usize {
        self.config.max_connections
    }

    #[must_use]
    pub fn expunge(&self) -> bool {
        self.config.expunge
    }

    #[must_use]
    pub fn hold_connection_open(&self) -> bool {
        self.config.hold_connection_open
    }

    /// Keepalive interval in seconds; 0 means disabled.
    #[must_use]
    pub fn keepalive_interval(&self) -> u64 {
        self.config.keepalive
    }

    /// Resolve the password: the configured literal, else the first
    /// line of the password file (read fresh on every call), else
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the password file cannot be read.
    pub async fn password(&self) -> Result<Option<String>> {
        self.config.resolve_password().await
    }

    /// The hierarchy delimiter reported by the server. `None` until
    /// the first discovery has seen a listing entry.
    #[must_use]
    pub fn separator(&self) -> Option<char> {
        self.separator.get().copied()
    }

    /// The connection pool backing this repository.
    #[must_use]
    pub const fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    // -- folders --

    /// The ordered folder list.
    ///
    /// Discovered once and cached; subsequent calls return the same
    /// handles without touching the server. Concurrent first-time
    /// callers are serialized so exactly one listing request is
    /// issued.
    ///
    /// # Errors
    ///
    /// Failing to acquire a connection or to list folders is fatal
    /// for the call; a partial folder list is never returned.
    pub async fn folders(&self) -> Result<Vec<Arc<F>>> {
        let mut cache = self.folders.lock().await;
        if let Some(folders) = cache.as_ref() {
            return Ok(folders.clone());
        }
        let discovered = self.discover().await?;
        *cache = Some(discovered.clone());
        Ok(discovered)
    }

    /// Drop the cached folder list; the next [`Repository::folders`]
    /// call re-queries the server.
    pub async fn invalidate_folder_cache(&self) {
        *self.folders.lock().await = None;
    }

    /// Run the discovery pass: list, parse, apply policy, merge
    /// includes, sort.
    async fn discover(&self) -> Result<Vec<Arc<F>>> {
        let entries = {
            let mut conn = self.pool.acquire().await?;
            connection::list_folders(&mut conn, &self.config.reference).await?
            // The borrow ends here, whether or not the LIST
            // succeeded.
        };

        let mut folders: Vec<Arc<F>> = Vec::new();
        for entry in entries {
            // Some listing implementations emit spurious empty
            // entries for literal-encoded responses.
            if entry.name.is_empty() {
                continue;
            }
            if let Some(delimiter) = entry.delimiter {
                self.separator.get_or_init(|| delimiter);
            }
            if !entry.is_selectable() {
                continue;
            }
            let visible_name = self.policy.translate(&entry.name);
            if !self.policy.filter_accept(&visible_name) {
                continue;
            }
            folders.push(Arc::new(F::from_parts(
                entry.name,
                visible_name,
                entry.delimiter,
                entry.attributes,
            )));
        }

        // Explicitly included folders are validated one by one on a
        // second borrowed connection; a name that fails validation is
        // skipped without aborting the pass.
        if !self.policy.includes().is_empty() {
            let mut conn = self.pool.acquire().await?;
            for name in self.policy.includes() {
                match conn.examine(name).await {
                    Ok(_) => {
                        let visible_name = self.policy.translate(name);
                        folders.push(Arc::new(F::from_parts(
                            name.clone(),
                            visible_name,
                            self.separator.get().copied(),
                            Vec::new(),
                        )));
                    }
                    Err(e) => {
                        warn!("Skipping included folder {}: {}", name, e);
                    }
                }
            }
        }

        folders.sort_by(|a, b| self.policy.sort_compare(a.visible_name(), b.visible_name()));
        info!(
            "Repository {}: discovered {} folder(s)",
            self.name,
            folders.len()
        );
        Ok(folders)
    }

    /// Create a folder on the server.
    ///
    /// The folder is created under the literal bare name; the
    /// configured reference path is not prefixed.
    ///
    /// # Errors
    ///
    /// A non-OK response is an [`Error::Create`] carrying the
    /// repository name, the folder name, and the server's response.
    pub async fn make_folder(&self, folder: &str) -> Result<()> {
        debug!("Repository {}: creating folder {}", self.name, folder);
        let mut conn = self.pool.acquire().await?;
        conn.create(folder).await.map_err(|e| Error::Create {
            repository: self.name.clone(),
            folder: folder.to_string(),
            response: e.to_string(),
        })
    }

    // -- connection lifecycle --

    /// Start the background keepalive task. A zero configured
    /// interval disables keepalive and makes this a no-op, as does a
    /// task that is already running.
    pub fn start_keepalive(&self) {
        let interval = self.config.keepalive;
        if interval == 0 {
            return;
        }
        let mut guard = self.keepalive.lock().unwrap();
        if guard.is_some() {
            debug!("Repository {}: keepalive already running", self.name);
            return;
        }
        debug!(
            "Repository {}: starting keepalive every {}s",
            self.name, interval
        );
        *guard = Some(KeepaliveTask::start(
            self.pool.clone(),
            Duration::from_secs(interval),
        ));
    }

    /// Stop the keepalive task. With `abrupt` the stop signal is
    /// sent without waiting; otherwise the call returns once the
    /// task has exited (at most one in-flight cycle completes
    /// first). A no-op when keepalive is not running.
    pub async fn stop_keepalive(&self, abrupt: bool) {
        let task = self.keepalive.lock().unwrap().take();
        if let Some(task) = task {
            task.stop(abrupt).await;
        }
    }

    /// Terminate pooled connections now. Sessions lent out at this
    /// moment are terminated when returned.
    pub async fn drop_connections(&self) {
        self.pool.close().await;
    }

    /// The control point between sync passes: drop pooled
    /// connections unless configured to hold them open for reuse.
    pub async fn hold_or_drop_connections(&self) {
        if !self.config.hold_connection_open {
            self.drop_connections().await;
        }
    }
}

impl Repository<Folder> {
    /// Open a standard repository producing plain [`Folder`] handles.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a policy expression is
    /// malformed.
    pub fn new(name: impl Into<String>, config: RepositoryConfig) -> Result<Self> {
        Self::open(name, config)
    }

    /// Open a standard repository with an explicitly built policy.
    pub fn with_policy(
        name: impl Into<String>,
        config: RepositoryConfig,
        policy: FolderPolicy,
    ) -> Self {
        Self::open_with_policy(name, config, policy)
    }
}

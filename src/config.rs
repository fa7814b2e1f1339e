//! Repository configuration
//!
//! A [`RepositoryConfig`] is the resolved, immutable bundle of
//! everything a remote repository needs: endpoint, credentials,
//! connection limits, and the folder-policy expressions. It is built
//! once (from the caller's configuration layer or from the
//! environment) and never changes for the repository's lifetime.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Default IMAP port for TLS connections.
pub const IMAPS_PORT: u16 = 993;
/// Default IMAP port for plain connections.
pub const IMAP_PORT: u16 = 143;

/// Resolved configuration for one remote IMAP repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub host: String,
    /// Explicit port; when absent the protocol default applies
    /// (993 with `ssl`, 143 without).
    #[serde(default)]
    pub port: Option<u16>,
    pub username: String,
    /// Literal password. Takes precedence over `password_file`.
    #[serde(default)]
    pub password: Option<String>,
    /// File whose first line is the password. Read on every lookup so
    /// rotated credentials are picked up between sync passes.
    #[serde(default)]
    pub password_file: Option<PathBuf>,
    #[serde(default)]
    pub ssl: bool,
    /// Accept self-signed/invalid server certificates. Needed for
    /// bridge daemons and test servers; leave off for real endpoints.
    #[serde(default)]
    pub tls_accept_invalid_certs: bool,
    /// Command that provides a pre-authenticated session over its
    /// stdio. Carried for the transport layer; informative alongside
    /// host/port.
    #[serde(default)]
    pub preauth_tunnel: Option<String>,
    /// Root path under which folder discovery is scoped.
    #[serde(default)]
    pub reference: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default)]
    pub hold_connection_open: bool,
    #[serde(default = "default_expunge")]
    pub expunge: bool,
    /// Keepalive interval in seconds; 0 disables keepalive.
    #[serde(default)]
    pub keepalive: u64,
    /// Folder-name translation expression (`s/pat/repl/` chains).
    #[serde(default)]
    pub name_translate: Option<String>,
    /// Folder filter expression (`accept /pat/` or `reject /pat/`).
    #[serde(default)]
    pub folder_filter: Option<String>,
    /// Folder sort expression (`lexical` or `reverse`).
    #[serde(default)]
    pub folder_sort: Option<String>,
    /// Folders forced into the result set regardless of discovery.
    #[serde(default)]
    pub folder_includes: Vec<String>,
}

const fn default_max_connections() -> usize {
    1
}

const fn default_expunge() -> bool {
    true
}

impl RepositoryConfig {
    /// Minimal configuration for the given endpoint; everything else
    /// at its documented default.
    #[must_use]
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: username.into(),
            password: None,
            password_file: None,
            ssl: false,
            tls_accept_invalid_certs: false,
            preauth_tunnel: None,
            reference: String::new(),
            max_connections: default_max_connections(),
            hold_connection_open: false,
            expunge: default_expunge(),
            keepalive: 0,
            name_translate: None,
            folder_filter: None,
            folder_sort: None,
            folder_includes: Vec::new(),
        }
    }

    /// Load repository configuration from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `IMAP_REPO_HOST`
    /// - `IMAP_REPO_USERNAME`
    ///
    /// Optional (with defaults):
    /// - `IMAP_REPO_PASSWORD`
    /// - `IMAP_REPO_PORT` (default: protocol default)
    /// - `IMAP_REPO_SSL` (default: `false`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::new(
            env::var("IMAP_REPO_HOST")
                .map_err(|_| Error::Config("IMAP_REPO_HOST not set".into()))?,
            env::var("IMAP_REPO_USERNAME")
                .map_err(|_| Error::Config("IMAP_REPO_USERNAME not set".into()))?,
        );
        config.password = env::var("IMAP_REPO_PASSWORD").ok();
        config.port = match env::var("IMAP_REPO_PORT") {
            Ok(port) => Some(
                port.parse()
                    .map_err(|e| Error::Config(format!("Invalid IMAP_REPO_PORT: {e}")))?,
            ),
            Err(_) => None,
        };
        config.ssl = env::var("IMAP_REPO_SSL").is_ok_and(|v| v == "1" || v == "true");
        Ok(config)
    }

    /// The port to dial: explicit if configured, else the protocol
    /// default for the TLS mode.
    #[must_use]
    pub const fn effective_port(&self) -> u16 {
        match self.port {
            Some(port) => port,
            None if self.ssl => IMAPS_PORT,
            None => IMAP_PORT,
        }
    }

    /// Resolve the password.
    ///
    /// A literal `password` wins. Otherwise the first line of
    /// `password_file` (trailing whitespace stripped) is returned,
    /// read fresh on every call. `None` when neither is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the password file cannot be read.
    pub async fn resolve_password(&self) -> Result<Option<String>> {
        if let Some(password) = &self.password {
            return Ok(Some(password.clone()));
        }
        if let Some(path) = &self.password_file {
            let contents = tokio::fs::read_to_string(path).await?;
            let first_line = contents.lines().next().unwrap_or("");
            return Ok(Some(first_line.trim_end().to_string()));
        }
        Ok(None)
    }
}

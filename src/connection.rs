//! IMAP session establishment and transport helpers
//!
//! Provides the shared [`ImapSession`] type plus the low-level
//! `connect()` and `list_folders()` functions used by the connection
//! pool and folder discovery. Plain-TCP and TLS sessions share one
//! session type through a boxed stream trait object.

use crate::config::RepositoryConfig;
use crate::error::{Error, Result};
use async_imap::Session;
use async_imap::types::{Name, NameAttribute};
use futures::StreamExt;
use futures::io::{AsyncRead, AsyncWrite};
use rustls::pki_types::ServerName;
use std::fmt;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{debug, info};

/// Object-safe bound for the byte stream under a session.
pub trait SessionStream: AsyncRead + AsyncWrite + Send + Sync + Unpin + fmt::Debug {}

impl<T: AsyncRead + AsyncWrite + Send + Sync + Unpin + fmt::Debug> SessionStream for T {}

/// An authenticated IMAP session over plain TCP or TLS.
pub type ImapSession = Session<Box<dyn SessionStream>>;

/// Build a TLS connector.
///
/// Verification uses the bundled webpki roots unless the repository
/// is configured to accept invalid certificates (bridge daemons and
/// test servers present self-signed certs).
fn tls_connector(accept_invalid_certs: bool) -> TlsConnector {
    let config = if accept_invalid_certs {
        rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(DangerousVerifier))
            .with_no_client_auth()
    } else {
        let roots = rustls::RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth()
    };
    TlsConnector::from(Arc::new(config))
}

/// Open a fresh authenticated IMAP session.
///
/// Dials `host:port` (protocol default port when unconfigured),
/// performs the TLS handshake when `ssl` is set, and logs in with the
/// resolved credentials.
///
/// # Errors
///
/// Any transport or authentication failure is a
/// [`Error::Connection`]; a missing password is a configuration
/// error.
pub async fn connect(config: &RepositoryConfig) -> Result<ImapSession> {
    let password = config
        .resolve_password()
        .await?
        .ok_or_else(|| Error::Config("no password or password file configured".into()))?;

    let addr = format!("{}:{}", config.host, config.effective_port());
    debug!("Connecting to IMAP server at {}", addr);

    let tcp_stream = TcpStream::connect(&addr)
        .await
        .map_err(|e| Error::Connection(format!("connect to {addr}: {e}")))?;

    let stream: Box<dyn SessionStream> = if config.ssl {
        let connector = tls_connector(config.tls_accept_invalid_certs);
        let server_name = ServerName::try_from(config.host.clone())
            .map_err(|e| Error::Connection(format!("Invalid server name: {e}")))?;
        let tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| Error::Connection(format!("TLS handshake: {e}")))?;
        Box::new(tls_stream.compat())
    } else {
        Box::new(tcp_stream.compat())
    };

    let client = async_imap::Client::new(stream);
    let session = client
        .login(&config.username, &password)
        .await
        .map_err(|(e, _)| Error::Connection(format!("Login failed: {e}")))?;

    info!("Connected to IMAP server at {}", addr);
    Ok(session)
}

/// One entry of a folder listing: server-reported name attributes,
/// hierarchy delimiter, and the folder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Name attributes in their wire spelling (e.g. `\Noselect`).
    pub attributes: Vec<String>,
    /// Hierarchy delimiter; `None` when the server reported `NIL`.
    pub delimiter: Option<char>,
    /// The folder name.
    pub name: String,
}

impl ListEntry {
    /// Whether the entry names a mailbox that can be selected.
    /// Non-selectable namespace nodes carry `\Noselect`.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self
            .attributes
            .iter()
            .any(|a| a.eq_ignore_ascii_case("\\noselect"))
    }
}

/// The wire spelling of a name attribute.
fn attribute_name(attr: &NameAttribute<'_>) -> String {
    match attr {
        NameAttribute::NoInferiors => "\\Noinferiors".to_string(),
        NameAttribute::NoSelect => "\\Noselect".to_string(),
        NameAttribute::Marked => "\\Marked".to_string(),
        NameAttribute::Unmarked => "\\Unmarked".to_string(),
        NameAttribute::Extension(label) => label.to_string(),
        other => format!("\\{other:?}"),
    }
}

fn list_entry(name: &Name) -> ListEntry {
    ListEntry {
        attributes: name.attributes().iter().map(attribute_name).collect(),
        delimiter: name.delimiter().and_then(|d| d.chars().next()),
        name: name.name().to_string(),
    }
}

/// List folders rooted at the reference path.
///
/// Entries the server garbles are skipped rather than failing the
/// listing; entries with empty names (a quirk of literal-encoded
/// listings) are preserved for the caller to skip.
///
/// # Errors
///
/// Returns an error if the LIST command itself fails.
pub async fn list_folders(
    session: &mut ImapSession,
    reference: &str,
) -> Result<Vec<ListEntry>> {
    let mut stream = session
        .list(Some(reference), Some("*"))
        .await
        .map_err(|e| Error::Imap(format!("LIST failed: {e}")))?;

    let mut entries = Vec::new();
    while let Some(item) = stream.next().await {
        if let Ok(name) = item {
            entries.push(list_entry(&name));
        }
    }
    drop(stream);
    Ok(entries)
}

/// Certificate verifier that accepts all certificates
/// (for bridge daemons and test servers with self-signed certs).
#[derive(Debug)]
struct DangerousVerifier;

impl rustls::client::danger::ServerCertVerifier for DangerousVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::ECDSA_NISTP521_SHA512,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}

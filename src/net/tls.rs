//! TLS configuration and certificate loading.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::crypto::ring;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use thiserror::Error;
use tokio_rustls::TlsAcceptor;

/// Error type for TLS setup.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No certificates found in {0}")]
    NoCertificates(String),

    #[error("No private key found in {0}")]
    NoPrivateKey(String),

    #[error("Invalid TLS configuration: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Certificate chain and private key presented by the server.
#[derive(Debug)]
pub struct TlsIdentity {
    cert_chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl TlsIdentity {
    /// Build an identity from DER material already in memory.
    pub fn from_der(cert_chain: Vec<CertificateDer<'static>>, key: PrivateKeyDer<'static>) -> Self {
        Self { cert_chain, key }
    }

    /// Load certificate chain and key from PEM files.
    pub fn from_pem_files(cert_path: &Path, key_path: &Path) -> Result<Self, TlsError> {
        let cert_display = cert_path.display().to_string();
        let key_display = key_path.display().to_string();

        let mut cert_reader = open(cert_path)?;
        let cert_chain = rustls_pemfile::certs(&mut cert_reader)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| TlsError::Io {
                path: cert_display.clone(),
                source,
            })?;
        if cert_chain.is_empty() {
            return Err(TlsError::NoCertificates(cert_display));
        }

        let mut key_reader = open(key_path)?;
        let key = rustls_pemfile::private_key(&mut key_reader)
            .map_err(|source| TlsError::Io {
                path: key_display.clone(),
                source,
            })?
            .ok_or(TlsError::NoPrivateKey(key_display))?;

        Ok(Self { cert_chain, key })
    }
}

fn open(path: &Path) -> Result<BufReader<File>, TlsError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TlsError::Io {
            path: path.display().to_string(),
            source,
        })
}

/// Build a rustls server config advertising `alpn_protocols` in preference order.
pub fn server_config(
    identity: TlsIdentity,
    alpn_protocols: &[String],
) -> Result<rustls::ServerConfig, TlsError> {
    let mut config = rustls::ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(identity.cert_chain, identity.key)?;

    config.alpn_protocols = alpn_protocols
        .iter()
        .map(|proto| proto.as_bytes().to_vec())
        .collect();

    Ok(config)
}

/// Build the acceptor used by the accept loop.
pub fn acceptor(identity: TlsIdentity, alpn_protocols: &[String]) -> Result<TlsAcceptor, TlsError> {
    let config = server_config(identity, alpn_protocols)?;

    tracing::debug!(alpn = ?alpn_protocols, "TLS acceptor built");

    Ok(TlsAcceptor::from(Arc::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn self_signed() -> rcgen::CertifiedKey {
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap()
    }

    #[test]
    fn loads_pem_files() {
        let certified = self_signed();
        let mut cert = tempfile::NamedTempFile::new().unwrap();
        let mut key = tempfile::NamedTempFile::new().unwrap();
        cert.write_all(certified.cert.pem().as_bytes()).unwrap();
        key.write_all(certified.key_pair.serialize_pem().as_bytes()).unwrap();

        let identity = TlsIdentity::from_pem_files(cert.path(), key.path()).unwrap();
        assert_eq!(identity.cert_chain.len(), 1);

        let config = server_config(identity, &["tls-0.9".into(), "http/1.1".into()]).unwrap();
        assert_eq!(
            config.alpn_protocols,
            vec![b"tls-0.9".to_vec(), b"http/1.1".to_vec()]
        );
    }

    #[test]
    fn empty_cert_file_is_rejected() {
        let cert = tempfile::NamedTempFile::new().unwrap();
        let key = tempfile::NamedTempFile::new().unwrap();

        let err = TlsIdentity::from_pem_files(cert.path(), key.path()).unwrap_err();
        assert!(matches!(err, TlsError::NoCertificates(_)));
    }

    #[test]
    fn missing_key_file_is_io_error() {
        let certified = self_signed();
        let mut cert = tempfile::NamedTempFile::new().unwrap();
        cert.write_all(certified.cert.pem().as_bytes()).unwrap();

        let err =
            TlsIdentity::from_pem_files(cert.path(), Path::new("/no/such/key.pem")).unwrap_err();
        assert!(matches!(err, TlsError::Io { .. }));
    }
}

// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - TLS Handshake Inspector
 * Completes a handshake with standard verification recorded, not enforced,
 * and reports the peer certificate, protocol and cipher suite
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, ProtocolVersion, RootCertStore, SignatureScheme};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;
use x509_parser::prelude::{FromDer, X509Certificate, X509Name};

const HANDSHAKE_TIMEOUT_SECS: u64 = 10;

/// Leaf certificate fields the checks need
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateInfo {
    pub subject_cn: Option<String>,
    pub issuer_cn: Option<String>,
    pub not_after: DateTime<Utc>,
}

/// Classified certificate or handshake problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsFault {
    CertificateExpired(String),
    UntrustedChain(String),
    Other(String),
}

impl std::fmt::Display for TlsFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TlsFault::CertificateExpired(reason) => write!(f, "certificate expired: {}", reason),
            TlsFault::UntrustedChain(reason) => write!(f, "untrusted certificate chain: {}", reason),
            TlsFault::Other(reason) => write!(f, "{}", reason),
        }
    }
}

impl std::error::Error for TlsFault {}

/// Result of a completed handshake
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TlsSession {
    /// `TLSv1.3`, `TLSv1.2`, ...
    pub protocol: Option<String>,
    /// IANA-style suite name, e.g. `TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256`
    pub cipher: Option<String>,
    pub certificate: Option<CertificateInfo>,
    /// Verification failure observed while the handshake was allowed to finish
    pub verification_fault: Option<TlsFault>,
}

/// TLS introspection seam, so checks can run against canned handshakes
#[async_trait]
pub trait TlsProbe: Send + Sync {
    async fn handshake(&self, host: &str, port: u16) -> Result<TlsSession, TlsFault>;
}

/// Runs WebPKI verification, keeps the error and lets the handshake proceed
#[derive(Debug)]
struct RecordingVerifier {
    inner: Arc<WebPkiServerVerifier>,
    fault: Mutex<Option<CertificateError>>,
}

impl ServerCertVerifier for RecordingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if let Err(rustls::Error::InvalidCertificate(err)) = self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            *self.fault.lock() = Some(err);
        }
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Production probe over rustls with the webpki root store
pub struct RustlsProbe {
    provider: Arc<CryptoProvider>,
    roots: Arc<RootCertStore>,
    timeout: Duration,
}

impl RustlsProbe {
    pub fn new() -> Self {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        Self {
            provider: Arc::new(rustls::crypto::ring::default_provider()),
            roots: Arc::new(roots),
            timeout: Duration::from_secs(HANDSHAKE_TIMEOUT_SECS),
        }
    }

    fn client_config(&self) -> Result<(ClientConfig, Arc<RecordingVerifier>), TlsFault> {
        let inner = WebPkiServerVerifier::builder_with_provider(self.roots.clone(), self.provider.clone())
            .build()
            .map_err(|e| TlsFault::Other(format!("verifier setup failed: {}", e)))?;

        let verifier = Arc::new(RecordingVerifier {
            inner,
            fault: Mutex::new(None),
        });

        let config = ClientConfig::builder_with_provider(self.provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| TlsFault::Other(format!("protocol setup failed: {}", e)))?
            .dangerous()
            .with_custom_certificate_verifier(verifier.clone())
            .with_no_client_auth();

        Ok((config, verifier))
    }
}

impl Default for RustlsProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TlsProbe for RustlsProbe {
    async fn handshake(&self, host: &str, port: u16) -> Result<TlsSession, TlsFault> {
        let (config, verifier) = self.client_config()?;
        let connector = TlsConnector::from(Arc::new(config));

        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| TlsFault::Other(format!("invalid server name {}: {}", host, e)))?;

        let tcp = tokio::time::timeout(self.timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| TlsFault::Other(format!("connect to {}:{} timed out", host, port)))?
            .map_err(|e| TlsFault::Other(format!("connect to {}:{} failed: {}", host, port, e)))?;

        let stream = tokio::time::timeout(self.timeout, connector.connect(server_name, tcp))
            .await
            .map_err(|_| TlsFault::Other(format!("handshake with {} timed out", host)))?
            .map_err(|e| classify_io_error(&e))?;

        let (_, connection) = stream.get_ref();

        let certificate = connection
            .peer_certificates()
            .and_then(|chain| chain.first())
            .and_then(|leaf| parse_certificate(leaf.as_ref()));

        let session = TlsSession {
            protocol: connection.protocol_version().map(protocol_name),
            cipher: connection
                .negotiated_cipher_suite()
                .map(|suite| format!("{:?}", suite.suite())),
            certificate,
            verification_fault: verifier.fault.lock().take().map(classify_certificate_error),
        };

        debug!(
            "[TLS] {} negotiated {:?} / {:?}",
            host, session.protocol, session.cipher
        );

        Ok(session)
    }
}

fn protocol_name(version: ProtocolVersion) -> String {
    match version {
        ProtocolVersion::SSLv2 => "SSLv2".to_string(),
        ProtocolVersion::SSLv3 => "SSLv3".to_string(),
        ProtocolVersion::TLSv1_0 => "TLSv1".to_string(),
        ProtocolVersion::TLSv1_1 => "TLSv1.1".to_string(),
        ProtocolVersion::TLSv1_2 => "TLSv1.2".to_string(),
        ProtocolVersion::TLSv1_3 => "TLSv1.3".to_string(),
        other => format!("{:?}", other),
    }
}

fn classify_certificate_error(err: CertificateError) -> TlsFault {
    match err {
        CertificateError::Expired | CertificateError::ExpiredContext { .. } => {
            TlsFault::CertificateExpired("certificate has expired".to_string())
        }
        CertificateError::UnknownIssuer | CertificateError::BadSignature => {
            TlsFault::UntrustedChain(format!("{:?}", err))
        }
        other => TlsFault::Other(format!("{:?}", other)),
    }
}

fn classify_io_error(err: &std::io::Error) -> TlsFault {
    match err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
    {
        Some(rustls::Error::InvalidCertificate(cert_err)) => classify_certificate_error(cert_err.clone()),
        Some(other) => TlsFault::Other(other.to_string()),
        None => TlsFault::Other(err.to_string()),
    }
}

/// Decode the DER leaf; None when it cannot be parsed
pub fn parse_certificate(der: &[u8]) -> Option<CertificateInfo> {
    let (_, cert) = match X509Certificate::from_der(der) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("[TLS] Certificate parse failed: {}", e);
            return None;
        }
    };

    let not_after = DateTime::<Utc>::from_timestamp(cert.validity().not_after.timestamp(), 0)?;

    Some(CertificateInfo {
        subject_cn: common_name(cert.subject()),
        issuer_cn: common_name(cert.issuer()),
        not_after,
    })
}

fn common_name(name: &X509Name<'_>) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
}

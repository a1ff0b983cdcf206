//! TLS configuration, certificate loading and self-signed issuance.

use std::path::Path;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    SignatureAlgorithm,
};
use time::OffsetDateTime;

/// Errors from certificate issuance and TLS setup.
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("certificate generation failed: {0}")]
    Generate(#[from] rcgen::Error),

    #[error("unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("certificate validity out of range: {0:?}")]
    InvalidValidity(Duration),

    #[error("no certificates supplied")]
    Empty,

    #[error("tls configuration failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Key algorithm and size for generated certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// ECDSA on the NIST curve with the given size (256 or 384).
    Ecdsa(u16),
    Ed25519,
    /// RSA with the given modulus size. Generation is not supported by the
    /// ring backend; requests fail with `UnsupportedAlgorithm`.
    Rsa(u16),
}

impl KeyAlgorithm {
    fn signature_algorithm(self) -> Result<&'static SignatureAlgorithm, CertificateError> {
        match self {
            KeyAlgorithm::Ecdsa(256) => Ok(&rcgen::PKCS_ECDSA_P256_SHA256),
            KeyAlgorithm::Ecdsa(384) => Ok(&rcgen::PKCS_ECDSA_P384_SHA384),
            KeyAlgorithm::Ed25519 => Ok(&rcgen::PKCS_ED25519),
            other => Err(CertificateError::UnsupportedAlgorithm(format!("{:?}", other))),
        }
    }
}

/// Parameters for [`issue_self_signed`].
#[derive(Debug, Clone)]
pub struct CertificateRequest {
    pub algorithm: KeyAlgorithm,
    pub common_name: String,
    pub subject_alt_names: Vec<String>,
    pub is_ca: bool,
    pub validity: Duration,
}

impl CertificateRequest {
    /// ECDSA P-384 certificate for `localhost`, as used by the listener fallback.
    pub fn localhost(validity: Duration) -> Self {
        Self {
            algorithm: KeyAlgorithm::Ecdsa(384),
            common_name: "localhost".to_string(),
            subject_alt_names: vec!["localhost".to_string()],
            is_ca: false,
            validity,
        }
    }
}

/// A generated certificate together with its private key.
pub struct IssuedCertificate {
    certificate: Certificate,
    key_pair: KeyPair,
}

impl std::fmt::Debug for IssuedCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedCertificate").finish_non_exhaustive()
    }
}

impl IssuedCertificate {
    pub fn cert_pem(&self) -> String {
        self.certificate.pem()
    }

    pub fn key_pem(&self) -> String {
        self.key_pair.serialize_pem()
    }
}

/// Issue a certificate, self-signed or signed by `parent`.
pub fn issue_self_signed(
    request: &CertificateRequest,
    parent: Option<&IssuedCertificate>,
) -> Result<IssuedCertificate, CertificateError> {
    let key_pair = KeyPair::generate_for(request.algorithm.signature_algorithm()?)?;

    let mut params = CertificateParams::new(request.subject_alt_names.clone())?;
    let mut name = DistinguishedName::new();
    name.push(DnType::CommonName, request.common_name.as_str());
    params.distinguished_name = name;
    params.is_ca = if request.is_ca {
        IsCa::Ca(BasicConstraints::Unconstrained)
    } else {
        IsCa::NoCa
    };

    // Backdate slightly so clock skew does not reject a fresh certificate.
    let now = OffsetDateTime::now_utc();
    params.not_before = now - time::Duration::hours(1);
    params.not_after = time::Duration::try_from(request.validity)
        .ok()
        .and_then(|validity| now.checked_add(validity))
        .ok_or(CertificateError::InvalidValidity(request.validity))?;

    let certificate = match parent {
        Some(issuer) => params.signed_by(&key_pair, &issuer.certificate, &issuer.key_pair)?,
        None => params.self_signed(&key_pair)?,
    };

    tracing::debug!(
        common_name = %request.common_name,
        algorithm = ?request.algorithm,
        signed_by_parent = parent.is_some(),
        "Certificate issued"
    );

    Ok(IssuedCertificate {
        certificate,
        key_pair,
    })
}

/// Build a rustls server configuration.
///
/// The first certificate is the leaf and supplies the private key; any
/// further certificates are sent as its chain.
pub async fn build_transport_config(
    certificates: &[IssuedCertificate],
) -> Result<RustlsConfig, CertificateError> {
    let leaf = certificates.first().ok_or(CertificateError::Empty)?;
    let chain: String = certificates.iter().map(IssuedCertificate::cert_pem).collect();

    let config =
        RustlsConfig::from_pem(chain.into_bytes(), leaf.key_pem().into_bytes()).await?;
    Ok(config)
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, CertificateError> {
    if !cert_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Certificate file not found: {:?}", cert_path),
        )
        .into());
    }
    if !key_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Private key file not found: {:?}", key_path),
        )
        .into());
    }

    Ok(RustlsConfig::from_pem_file(cert_path, key_path).await?)
}

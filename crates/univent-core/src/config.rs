// ── Runtime connection configuration ──
//
// These types describe *how* to reach the UniVent backend. They carry
// credential data and connection tuning, but never touch disk.
// The CLI constructs an `ApiConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use univent_api::{ApiClient, TlsMode, TransportConfig};

use crate::error::CoreError;

/// How to authenticate with the backend.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// A pre-issued bearer token (kiosk provisioning, `--token`).
    Token(SecretString),
    /// Email/password login, exchanged for a token at connect time.
    Password { email: String, password: SecretString },
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (staging backends with self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for talking to one UniVent backend.
///
/// Built by the CLI, passed to core -- core never reads config files.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL (e.g., `https://univent.example.edu`).
    pub url: Url,
    /// Authentication method and credentials.
    pub auth: AuthCredentials,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl ApiConfig {
    /// Build an (unauthenticated) API client from this configuration.
    pub fn build_client(&self) -> Result<ApiClient, CoreError> {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        let transport = TransportConfig::default()
            .with_tls(tls)
            .with_timeout(self.timeout);
        Ok(ApiClient::new(self.url.clone(), &transport)?)
    }
}

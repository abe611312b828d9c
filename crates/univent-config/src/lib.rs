//! Shared configuration for UniVent tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `univent_core::ApiConfig`. The CLI layers its flag
//! overrides on top of this crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use univent_core::{ApiConfig, AuthCredentials, TlsVerification};

/// Service name under which secrets are stored in the OS keyring.
pub const KEYRING_SERVICE: &str = "univent";

/// Environment variable consulted for the password when a profile names none.
pub const PASSWORD_ENV: &str = "UNIVENT_PASSWORD";

/// Environment variable consulted for the login email.
pub const EMAIL_ENV: &str = "UNIVENT_EMAIL";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring unavailable: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    15
}

/// A named backend profile.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "https://univent.example.edu").
    pub api_url: String,

    /// Login email.
    pub email: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Environment variable name containing a pre-issued bearer token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Line-mode barcode scanners (serial / HID character devices).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scanner_devices: Vec<PathBuf>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("edu", "univent", "univent").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("univent");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// A missing file yields the defaults. Environment keys use a double
/// underscore for nesting: `UNIVENT_DEFAULTS__TIMEOUT=30`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading configuration");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("UNIVENT_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

fn keyring_entry(profile_name: &str, kind: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/{kind}"),
    )?)
}

/// Store a profile's password in the OS keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name, "password")?.set_password(password)?;
    Ok(())
}

/// Store a profile's bearer token in the OS keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name, "token")?.set_password(token)?;
    Ok(())
}

fn keyring_secret(profile_name: &str, kind: &str) -> Option<SecretString> {
    let entry = keyring_entry(profile_name, kind).ok()?;
    match entry.get_password() {
        Ok(secret) => Some(SecretString::from(secret)),
        Err(e) => {
            debug!(profile = profile_name, kind, error = %e, "no keyring secret");
            None
        }
    }
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve a pre-issued bearer token: the profile's `token_env`, then the
/// keyring. `None` when neither holds one.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    keyring_secret(profile_name, "token")
}

/// Resolve the login password from the credential chain.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env, then the global variable
    let env_names = profile.password_env.as_deref().into_iter().chain([PASSWORD_ENV]);
    for env_name in env_names {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Some(secret) = keyring_secret(profile_name, "password") {
        return Ok(secret);
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve `AuthCredentials` for a profile: a token when one is available,
/// otherwise email + password.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> Result<AuthCredentials, ConfigError> {
    if let Some(token) = resolve_token(profile, profile_name) {
        return Ok(AuthCredentials::Token(token));
    }

    let email = profile
        .email
        .clone()
        .or_else(|| std::env::var(EMAIL_ENV).ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;
    let password = resolve_password(profile, profile_name)?;
    Ok(AuthCredentials::Password { email, password })
}

/// Parse a backend base URL, naming `field` in the error.
pub fn parse_api_url(raw: &str, field: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("expected an http(s) URL, got {raw}"),
        });
    }
    Ok(url)
}

/// TLS strategy for a profile, before any CLI override.
pub fn profile_tls(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build an `ApiConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_api_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ApiConfig, ConfigError> {
    let url = parse_api_url(&profile.api_url, "api_url")?;
    let auth = resolve_auth(profile, profile_name)?;
    let tls = profile_tls(profile, defaults);
    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(ApiConfig {
        url,
        auth,
        tls,
        timeout,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn write(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn profile() -> Profile {
        Profile {
            api_url: "https://univent.test".into(),
            email: Some("org@univ.ro".into()),
            password: Some("plain".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout, 15);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profiles_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            r#"
            default_profile = "gate-a"

            [defaults]
            timeout = 20

            [profiles.gate-a]
            api_url = "https://univent.example.edu"
            email = "org@univ.ro"
            password_env = "GATE_A_PASSWORD"
            scanner_devices = ["/dev/ttyACM0"]
            "#,
        );

        let cfg = load_config_from(&path).unwrap();
        let gate = &cfg.profiles["gate-a"];

        assert_eq!(cfg.default_profile.as_deref(), Some("gate-a"));
        assert_eq!(cfg.defaults.timeout, 20);
        assert_eq!(cfg.defaults.output, "table");
        assert_eq!(gate.api_url, "https://univent.example.edu");
        assert_eq!(gate.scanner_devices, vec![PathBuf::from("/dev/ttyACM0")]);
        assert!(gate.token_env.is_none());
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert("default".into(), profile());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["default"].email.as_deref(), Some("org@univ.ro"));
    }

    #[test]
    fn api_config_uses_profile_overrides() {
        let mut p = profile();
        p.timeout = Some(5);
        p.ca_cert = Some(PathBuf::from("/etc/univent/ca.pem"));

        let api = profile_to_api_config(&p, "unit-test-profile", &Defaults::default()).unwrap();

        assert_eq!(api.url.as_str(), "https://univent.test/");
        assert_eq!(api.timeout, Duration::from_secs(5));
        assert_eq!(
            api.tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/univent/ca.pem"))
        );
        assert!(matches!(api.auth, AuthCredentials::Password { ref email, .. } if email == "org@univ.ro"));
    }

    #[test]
    fn insecure_beats_custom_ca() {
        let mut p = profile();
        p.insecure = Some(true);
        p.ca_cert = Some(PathBuf::from("/etc/univent/ca.pem"));

        assert_eq!(
            profile_tls(&p, &Defaults::default()),
            TlsVerification::DangerAcceptInvalid
        );
    }

    #[test]
    fn invalid_url_is_a_validation_error() {
        let mut p = profile();
        p.api_url = "ftp://univent.test".into();

        let err = profile_to_api_config(&p, "unit-test-profile", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "api_url"));
    }

    #[test]
    fn profile_without_email_has_no_credentials() {
        let p = Profile {
            api_url: "https://univent.test".into(),
            ..Profile::default()
        };

        if std::env::var(EMAIL_ENV).is_err() {
            let err = resolve_auth(&p, "unit-test-profile-without-email").unwrap_err();
            assert!(matches!(err, ConfigError::NoCredentials { .. }));
        }
    }
}

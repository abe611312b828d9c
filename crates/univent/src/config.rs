//! CLI configuration: thin wrapper around `univent_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--api-url, --token, --email, etc.).

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use univent_core::{ApiConfig, AuthCredentials, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use univent_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Everything a backend-bound command needs from configuration.
#[derive(Debug)]
pub struct Resolved {
    pub profile_name: String,
    pub api: ApiConfig,
    pub scanner_devices: Vec<PathBuf>,
}

/// Build the `ApiConfig` for the active profile with flag overrides.
///
/// Without a matching profile, `--api-url` plus `--token` (or `--email`
/// and `UNIVENT_PASSWORD`) are enough.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        let api = resolve_profile(profile, &profile_name, &cfg.defaults, global)?;
        return Ok(Resolved {
            profile_name,
            api,
            scanner_devices: profile.scanner_devices.clone(),
        });
    }

    if global.profile.is_some() {
        let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }

    // No profile: build from flags / env alone.
    if global.api_url.is_none() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }
    let api = resolve_profile(&Profile::default(), &profile_name, &cfg.defaults, global)?;
    Ok(Resolved {
        profile_name,
        api,
        scanner_devices: Vec::new(),
    })
}

/// Translate a `Profile` + global flags into an `ApiConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<ApiConfig, CliError> {
    // 1. Base URL (flag > env > profile)
    let raw_url = global.api_url.as_deref().unwrap_or(&profile.api_url);
    let url = univent_config::parse_api_url(raw_url, "api_url")?;

    // 2. Auth credentials (flag overrides take priority)
    let auth = resolve_auth_with_flags(profile, profile_name, global)?;

    // 3. TLS verification
    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        univent_config::profile_tls(profile, defaults)
    };

    // 4. Timeout (flag > profile > defaults)
    let timeout = Duration::from_secs(
        global
            .timeout
            .or(profile.timeout)
            .unwrap_or(defaults.timeout),
    );

    Ok(ApiConfig {
        url,
        auth,
        tls,
        timeout,
    })
}

fn resolve_auth_with_flags(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<AuthCredentials, CliError> {
    if let Some(ref token) = global.token {
        return Ok(AuthCredentials::Token(SecretString::from(token.clone())));
    }
    if let Some(ref email) = global.email {
        let password = univent_config::resolve_password(profile, profile_name)?;
        return Ok(AuthCredentials::Password {
            email: email.clone(),
            password,
        });
    }
    Ok(univent_config::resolve_auth(profile, profile_name)?)
}

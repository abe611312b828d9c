//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use univent_api::ApiClient;
use univent_core::SessionContext;

use crate::cli::GlobalOpts;
use crate::config::{self, Resolved};
use crate::error::CliError;

/// An authenticated backend connection.
pub struct Connection {
    pub client: Arc<ApiClient>,
    pub session: SessionContext,
    pub resolved: Resolved,
}

/// Resolve configuration, build the client, and sign in.
pub async fn connect(global: &GlobalOpts) -> Result<Connection, CliError> {
    let resolved = config::resolve(global)?;
    tracing::debug!(
        profile = %resolved.profile_name,
        url = %resolved.api.url,
        "connecting"
    );
    let client = Arc::new(resolved.api.build_client()?);

    let spinner = spinner(global, "Signing in");
    let session = SessionContext::establish(&client, &resolved.api.auth).await;
    spinner.finish_and_clear();

    Ok(Connection {
        client,
        session: session?,
        resolved,
    })
}

/// Stderr spinner for network waits; hidden when quiet or not a terminal.
pub fn spinner(global: &GlobalOpts, message: &str) -> ProgressBar {
    if global.quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

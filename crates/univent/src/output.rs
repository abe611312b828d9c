//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! structured formats use serde, plain emits one value per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use univent_core::CheckInResult;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false)?,
        OutputFormat::JsonCompact => render_json(data, true)?,
        OutputFormat::Yaml => render_yaml(data)?,
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views are
/// pre-formatted text rather than `Tabled` rows.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false)?,
        OutputFormat::JsonCompact => render_json(data, true)?,
        OutputFormat::Yaml => render_yaml(data)?,
        OutputFormat::Plain => id_fn(data),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Check-in banner ──────────────────────────────────────────────────

/// The accept/reject banner shown after each validation.
pub fn verdict_banner(result: &CheckInResult, color: bool) -> String {
    let headline = if result.valid { "ACCEPTED" } else { "REJECTED" };
    let headline = match (color, result.valid) {
        (false, _) => format!("[ {headline} ]"),
        (true, true) => format!("[ {headline} ]").black().on_green().bold().to_string(),
        (true, false) => format!("[ {headline} ]").white().on_red().bold().to_string(),
    };

    let mut out = format!("{headline}  {}", result.message);
    if let Some(ref name) = result.subject_name {
        let name = if color {
            name.bold().to_string()
        } else {
            name.clone()
        };
        out.push_str(&format!("\n  Attendee: {name}"));
    }
    out.push_str(&format!(
        "\n  At: {}",
        result.observed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out
}

/// One-word verdict for plain output.
pub fn verdict_word(result: &CheckInResult) -> &'static str {
    if result.valid { "accepted" } else { "rejected" }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let out = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(out)
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Validation {
        field: "output".into(),
        reason: format!("YAML serialization failed: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn result(valid: bool, subject: Option<&str>) -> CheckInResult {
        CheckInResult {
            valid,
            message: if valid { "Acces permis" } else { "Bilet deja folosit" }.into(),
            subject_name: subject.map(Into::into),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn banner_without_color_names_attendee() {
        let banner = verdict_banner(&result(true, Some("Ana Pop")), false);
        assert!(banner.starts_with("[ ACCEPTED ]  Acces permis"));
        assert!(banner.contains("Attendee: Ana Pop"));
    }

    #[test]
    fn rejection_banner_has_no_attendee_line() {
        let banner = verdict_banner(&result(false, None), false);
        assert!(banner.starts_with("[ REJECTED ]  Bilet deja folosit"));
        assert!(!banner.contains("Attendee"));
        assert_eq!(verdict_word(&result(false, None)), "rejected");
    }
}

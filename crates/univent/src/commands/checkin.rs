//! `univent checkin --event <ID>`: the interactive check-in station.
//!
//! Codes arrive from a line-mode barcode scanner (camera mode) or typed on
//! stdin (manual mode). Verdicts are rendered from the controller's
//! verdict stream, so decodes completing in the background show up the
//! same way as typed submissions.

use std::io::Write;
use std::sync::Arc;

use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::{RecvError, TryRecvError}};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use univent_core::{
    CheckInController, CheckInDeps, CheckInOptions, CheckInResult, CoreError, LineScanner, Notice,
    Notifier, ScanMode, ScanSnapshot, ScanStatus, SubmitOutcome, TracingNotifier,
};

use crate::cli::{CheckinArgs, GlobalOpts, OutputFormat};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

const HELP_LINE: &str =
    "Enter a ticket code to validate. Empty line: next attendee. Commands: :camera :manual :quit";

// ── Terminal notifier ────────────────────────────────────────────────

/// Rings the terminal bell on each verdict so operators hear the result
/// without looking at the screen.
struct TerminalNotifier {
    bell: bool,
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        if self.bell {
            let _ = std::io::stderr().write_all(b"\x07");
        }
        TracingNotifier.notify(notice);
    }
}

// ── Stdin commands ───────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum StationInput {
    Next,
    Code(String),
    Mode(ScanMode),
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> StationInput {
    let line = line.trim();
    match line {
        "" => StationInput::Next,
        ":q" | ":quit" | ":exit" => StationInput::Quit,
        ":camera" | ":scan" => StationInput::Mode(ScanMode::Camera),
        ":manual" => StationInput::Mode(ScanMode::Manual),
        cmd if cmd.starts_with(':') => StationInput::Unknown(cmd.to_owned()),
        code => StationInput::Code(code.to_owned()),
    }
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(args: CheckinArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let conn = util::connect(global).await?;

    let devices = if args.device.is_empty() {
        conn.resolved.scanner_devices.clone()
    } else {
        args.device
    };
    let color = output::should_color(global.color);
    let deps = CheckInDeps {
        scanner: Arc::new(LineScanner::new(devices)),
        validator: conn.client.clone(),
        notifier: Arc::new(TerminalNotifier {
            bell: global.output == OutputFormat::Table && !global.quiet,
        }),
    };

    let controller =
        CheckInController::open(&conn.session, args.event.clone(), deps, CheckInOptions::default())?;

    let event = conn.client.get_event(controller.event_id()).await.map_err(|e| {
        if e.is_not_found() {
            CliError::NotFound {
                resource_type: "event".into(),
                identifier: args.event.clone(),
            }
        } else {
            CoreError::from(e).into()
        }
    })?;

    let notes = Notes {
        enabled: !global.quiet,
    };
    let mut header = format!("Checking in: {}", event.title);
    if let Some(ref location) = event.location {
        header.push_str(&format!(" @ {location}"));
    }
    notes.say(&header);
    notes.say(&format!(
        "Operator: {} ({})",
        controller.actor().display_name,
        controller.actor().role
    ));

    if args.manual {
        controller.switch_mode(ScanMode::Manual).await?;
    } else if !controller.activate_camera().await? {
        notes.say("No barcode scanner available; switching to manual entry.");
        controller.switch_mode(ScanMode::Manual).await?;
    }
    notes.say(HELP_LINE);

    let renderer = tokio::spawn(render(
        controller.subscribe(),
        controller.verdicts(),
        View {
            format: global.output,
            color,
            quiet: global.quiet,
        },
    ));

    let outcome = run_station(&controller, notes).await;

    controller.close().await;
    let tally = renderer.await.unwrap_or_default();
    notes.say(&format!(
        "Session closed: {} accepted, {} rejected.",
        tally.accepted, tally.rejected
    ));
    outcome
}

async fn run_station(controller: &CheckInController, notes: Notes) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Option<JoinHandle<()>> = None;

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };

        match parse_input(&line) {
            StationInput::Quit => break,
            StationInput::Unknown(cmd) => notes.say(&format!("Unknown command {cmd}. {HELP_LINE}")),
            StationInput::Mode(mode) => {
                controller.switch_mode(mode).await?;
                if controller.snapshot().camera_blocked() {
                    notes.say("No barcode scanner available. Use :manual to type codes.");
                }
            }
            StationInput::Next => {
                // Enter right after a typed code acknowledges that code's verdict.
                if let Some(handle) = pending.take() {
                    let _ = handle.await;
                }
                if controller.snapshot().status.is_terminal() {
                    controller.reset().await?;
                }
            }
            StationInput::Code(code) => {
                if let Some(handle) = submit(controller, code, notes).await {
                    pending = Some(handle);
                }
            }
        }
    }

    // Let a typed code finish before closing when input ends.
    if let Some(handle) = pending {
        let _ = handle.await;
    }
    Ok(())
}

async fn submit(
    controller: &CheckInController,
    code: String,
    notes: Notes,
) -> Option<JoinHandle<()>> {
    let snapshot = controller.snapshot();
    if snapshot.mode != ScanMode::Manual {
        notes.say("Manual entry is off while scanning. Use :manual to type codes.");
        return None;
    }

    controller.set_manual_input(code.as_str()).await;
    let controller = controller.clone();
    Some(tokio::spawn(async move {
        match controller.submit_manual_code(&code).await {
            SubmitOutcome::Busy => notes.say("Still validating the previous ticket."),
            SubmitOutcome::AwaitingReset => {
                notes.say("Press Enter for the next attendee before entering another code.");
            }
            SubmitOutcome::Completed(_)
            | SubmitOutcome::EmptyInput
            | SubmitOutcome::Stale
            | SubmitOutcome::Closed => {}
        }
    }))
}

// ── Rendering ────────────────────────────────────────────────────────

/// Operator notes on stderr, kept apart from the verdict stream on stdout.
#[derive(Clone, Copy)]
struct Notes {
    enabled: bool,
}

impl Notes {
    fn say(self, text: &str) {
        if self.enabled {
            eprintln!("{text}");
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    accepted: u32,
    rejected: u32,
}

impl Tally {
    fn record(&mut self, result: &CheckInResult) {
        if result.valid {
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }
    }
}

#[derive(Clone, Copy)]
struct View {
    format: OutputFormat,
    color: bool,
    quiet: bool,
}

/// Print every verdict and the status transitions until the session closes.
///
/// Verdicts come from the controller's verdict stream, so one cleared by an
/// immediate `reset()` is still shown. Snapshots only drive status notes.
async fn render(
    mut snapshots: watch::Receiver<ScanSnapshot>,
    mut verdicts: broadcast::Receiver<CheckInResult>,
    view: View,
) -> Tally {
    let mut tally = Tally::default();
    let mut last = snapshots.borrow_and_update().clone();

    loop {
        tokio::select! {
            biased;
            verdict = verdicts.recv() => match verdict {
                Ok(result) => {
                    tally.record(&result);
                    print_verdict(&result, view);
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "verdict display fell behind");
                }
                Err(RecvError::Closed) => break,
            },
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if !view.quiet {
                    status_note(&last, &snapshot, view.color);
                }
                if snapshot.closed {
                    break;
                }
                last = snapshot;
            }
        }
    }

    // Verdicts are sent before the closing snapshot is published.
    loop {
        match verdicts.try_recv() {
            Ok(result) => {
                tally.record(&result);
                print_verdict(&result, view);
            }
            Err(TryRecvError::Lagged(_)) => {}
            Err(_) => break,
        }
    }
    tally
}

fn status_note(last: &ScanSnapshot, snapshot: &ScanSnapshot, color: bool) {
    if snapshot.mode != last.mode {
        eprintln!("Mode: {}", snapshot.mode);
    }
    if snapshot.status == last.status {
        return;
    }
    match &snapshot.status {
        ScanStatus::Processing { .. } => eprintln!("Validating..."),
        ScanStatus::Scanning => {
            let ready = "Ready for the next attendee.";
            if color {
                eprintln!("{}", ready.dimmed());
            } else {
                eprintln!("{ready}");
            }
        }
        ScanStatus::Idle | ScanStatus::Success(_) | ScanStatus::Error(_) => {}
    }
}

fn print_verdict(result: &CheckInResult, view: View) {
    match output::render_single(
        view.format,
        result,
        |r| output::verdict_banner(r, view.color),
        |r| format!("{}\t{}", output::verdict_word(r), r.message),
    ) {
        Ok(out) => output::print_output(&out, view.quiet),
        Err(e) => tracing::warn!(error = %e, "failed to render verdict"),
    }
}

//! `univent validate <CODE> --event <ID>`
//!
//! One-shot validation for scripts and spot checks. Goes through the same
//! controller as the interactive station so the capability check and the
//! failure mapping are identical; exits non-zero when the ticket is refused.

use std::sync::Arc;

use univent_core::{
    CheckInController, CheckInDeps, CheckInOptions, LineScanner, ScanMode, SubmitOutcome,
    TracingNotifier,
};

use crate::cli::{GlobalOpts, ValidateArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: ValidateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let conn = util::connect(global).await?;

    let deps = CheckInDeps {
        scanner: Arc::new(LineScanner::new(Vec::new())),
        validator: conn.client.clone(),
        notifier: Arc::new(TracingNotifier),
    };
    let controller =
        CheckInController::open(&conn.session, args.event, deps, CheckInOptions::default())?;
    controller.switch_mode(ScanMode::Manual).await?;

    let spinner = util::spinner(global, "Validating ticket");
    let outcome = controller.submit_manual_code(&args.code).await;
    spinner.finish_and_clear();
    controller.close().await;

    let result = match outcome {
        SubmitOutcome::Completed(result) => result,
        SubmitOutcome::EmptyInput => {
            return Err(CliError::Validation {
                field: "code".into(),
                reason: "ticket code cannot be empty".into(),
            });
        }
        other => {
            return Err(CliError::Session {
                message: format!("submission not completed: {other:?}"),
            });
        }
    };

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &result,
        |r| output::verdict_banner(r, color),
        |r| output::verdict_word(r).to_owned(),
    )?;
    output::print_output(&out, global.quiet);

    if result.valid {
        Ok(())
    } else {
        Err(CliError::TicketRejected {
            message: result.message,
        })
    }
}

//! Command dispatch: bridges CLI args to the check-in controller and output.

pub mod checkin;
pub mod config_cmd;
pub mod util;
pub mod validate;
pub mod whoami;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Checkin(args) => checkin::handle(args, global).await,
        Command::Validate(args) => validate::handle(args, global).await,
        Command::Whoami => whoami::handle(global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

//! `univent whoami`

use tabled::Tabled;

use univent_core::Actor;

use crate::cli::GlobalOpts;
use crate::commands::util;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ActorRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Profile")]
    profile: String,
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let conn = util::connect(global).await?;
    let actor = conn.session.actor().clone();
    let profile = conn.resolved.profile_name.clone();

    let out = output::render_list(
        global.output,
        std::slice::from_ref(&actor),
        |a: &Actor| ActorRow {
            name: a.display_name.clone(),
            email: a.email.clone(),
            role: a.role.to_string(),
            profile: profile.clone(),
        },
        |a| a.email.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

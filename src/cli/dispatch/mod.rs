//! Map validated CLI matches to an [`Action`] and the shared [`GlobalArgs`].

use crate::cli::{
    actions::Action,
    commands::{self, ARG_STORE},
    globals::GlobalArgs,
};
use anyhow::{anyhow, Context, Result};

/// # Errors
/// Returns an error if a required argument or the subcommand is missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let store = matches
        .get_one::<String>(ARG_STORE)
        .context("missing required argument: --store")?;
    let globals = GlobalArgs::new(store);

    let action = match matches.subcommand() {
        Some((commands::CMD_LOGIN, sub_m)) => Action::Login {
            response: sub_m
                .get_one::<String>("response")
                .cloned()
                .context("missing required argument: <response>")?,
        },
        Some((commands::CMD_STATUS, _)) => Action::Status,
        Some((commands::CMD_LANDING, _)) => Action::Landing,
        Some((commands::CMD_OPEN, sub_m)) => Action::Open {
            path: sub_m
                .get_one::<String>("path")
                .cloned()
                .context("missing required argument: <path>")?,
        },
        Some((commands::CMD_PASSWORD_CHANGED, _)) => Action::PasswordChanged,
        Some((commands::CMD_UNAUTHORIZED, _)) => Action::Unauthorized,
        Some((commands::CMD_LOGOUT, _)) => Action::Logout,
        Some((other, _)) => return Err(anyhow!("unknown subcommand: {other}")),
        None => return Err(anyhow!("missing subcommand")),
    };

    Ok((action, globals))
}

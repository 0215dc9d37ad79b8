use crate::{
    cli::{actions::Action, globals::GlobalArgs},
    config::ConfigOverrides,
};
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;

fn string(matches: &ArgMatches, name: &str) -> Option<String> {
    matches.get_one::<String>(name).map(ToString::to_string)
}

fn required(matches: &ArgMatches, name: &str) -> Result<String> {
    string(matches, name).ok_or_else(|| anyhow!("missing required argument: --{name}"))
}

fn secret(matches: &ArgMatches, name: &str) -> Result<SecretString> {
    required(matches, name).map(SecretString::from)
}

/// Builds the client configuration from the global arguments.
///
/// # Errors
/// Returns an error if the configuration is invalid.
pub fn globals(matches: &ArgMatches) -> Result<GlobalArgs> {
    GlobalArgs::new(ConfigOverrides {
        api_base_url: string(matches, "api-url"),
        health_url: string(matches, "health-url"),
        state_dir: string(matches, "state-dir"),
        timeout_ms: matches.get_one::<u64>("timeout").copied(),
        reauth_path: string(matches, "reauth-path"),
    })
}

/// Maps the parsed subcommand to an [`Action`].
///
/// # Errors
/// Returns an error if a required argument is missing or the subcommand is unknown.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let (name, sub_m) = matches.subcommand().context("missing subcommand")?;

    let action = match name {
        "register" => Action::Register {
            username: required(sub_m, "username")?,
            email: required(sub_m, "email")?,
            avatar: string(sub_m, "avatar"),
            password: secret(sub_m, "password")?,
            confirm_password: secret(sub_m, "confirm-password")?,
        },
        "login" => Action::Login {
            identifier: required(sub_m, "identifier")?,
            password: secret(sub_m, "password")?,
        },
        "code" => Action::Code {
            session_token: secret(sub_m, "session-token")?,
            code: required(sub_m, "code")?,
        },
        "logout" => Action::Logout,
        "me" => Action::Me,
        "update-profile" => Action::UpdateProfile {
            username: string(sub_m, "username"),
            email: string(sub_m, "email"),
            avatar: string(sub_m, "avatar"),
            clear_avatar: sub_m.get_flag("clear-avatar"),
        },
        "password" => Action::Password {
            old_password: secret(sub_m, "old-password")?,
            new_password: secret(sub_m, "new-password")?,
            confirm_password: secret(sub_m, "confirm-password")?,
        },
        "delete-account" => Action::DeleteAccount,
        "2fa" => match sub_m.subcommand() {
            Some(("setup", _)) => Action::TwoFaSetup,
            Some(("confirm", confirm_m)) => Action::TwoFaConfirm {
                setup_token: secret(confirm_m, "setup-token")?,
                code: required(confirm_m, "code")?,
            },
            Some(("disable", disable_m)) => Action::TwoFaDisable {
                password: secret(disable_m, "password")?,
            },
            _ => return Err(anyhow!("unknown 2fa subcommand")),
        },
        "users" => Action::Users,
        "friends" => match sub_m.subcommand() {
            Some(("list", _)) => Action::Friends,
            Some(("add", add_m)) => Action::AddFriend {
                username: required(add_m, "username")?,
            },
            _ => return Err(anyhow!("unknown friends subcommand")),
        },
        "validate" => Action::Validate,
        "health" => Action::Health,
        other => return Err(anyhow!("unknown subcommand: {other}")),
    };

    Ok(action)
}

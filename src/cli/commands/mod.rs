use crate::config::{
    DEFAULT_API_BASE_URL, DEFAULT_HEALTH_URL, DEFAULT_REAUTH_PATH, DEFAULT_STATE_DIR,
};
use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn validator_url() -> ValueParser {
    ValueParser::from(move |value: &str| -> std::result::Result<String, String> {
        url::Url::parse(value.trim())
            .map(|_| value.trim().to_string())
            .map_err(|err| format!("invalid URL: {err}"))
    })
}

fn password_arg(name: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(long)
        .help(help)
        .hide_env_values(true)
        .required(true)
}

fn code_arg() -> Arg {
    Arg::new("code")
        .short('c')
        .long("code")
        .help("Six digit code from the authenticator app")
        .required(true)
}

fn register() -> Command {
    Command::new("register")
        .about("Create an account")
        .arg(
            Arg::new("username")
                .short('u')
                .long("username")
                .help("Username, 3 to 50 characters")
                .required(true),
        )
        .arg(
            Arg::new("email")
                .short('e')
                .long("email")
                .help("Email address")
                .required(true),
        )
        .arg(Arg::new("avatar").long("avatar").help("Avatar URL"))
        .arg(password_arg("password", "password", "Password").env("IDGATE_PASSWORD"))
        .arg(password_arg(
            "confirm-password",
            "confirm-password",
            "Password again",
        ))
}

fn login() -> Command {
    Command::new("login")
        .about("Log in with a username or email address")
        .arg(
            Arg::new("identifier")
                .short('u')
                .long("user")
                .help("Username or email address")
                .env("IDGATE_USER")
                .required(true),
        )
        .arg(password_arg("password", "password", "Password").env("IDGATE_PASSWORD"))
}

fn code() -> Command {
    Command::new("code")
        .about("Finish a login that requires a second factor")
        .arg(
            Arg::new("session-token")
                .long("session-token")
                .help("Session token printed by the login command")
                .env("IDGATE_SESSION_TOKEN")
                .hide_env_values(true)
                .required(true),
        )
        .arg(code_arg())
}

fn update_profile() -> Command {
    Command::new("update-profile")
        .about("Change username, email or avatar")
        .arg(Arg::new("username").short('u').long("username").help("New username"))
        .arg(Arg::new("email").short('e').long("email").help("New email address"))
        .arg(
            Arg::new("avatar")
                .long("avatar")
                .help("New avatar URL")
                .conflicts_with("clear-avatar"),
        )
        .arg(
            Arg::new("clear-avatar")
                .long("clear-avatar")
                .help("Remove the avatar")
                .action(ArgAction::SetTrue),
        )
}

fn password() -> Command {
    Command::new("password")
        .about("Change the password")
        .arg(password_arg("old-password", "old", "Current password"))
        .arg(password_arg("new-password", "new", "New password"))
        .arg(password_arg("confirm-password", "confirm", "New password again"))
}

fn two_fa() -> Command {
    Command::new("2fa")
        .about("Manage two-factor authentication")
        .subcommand_required(true)
        .subcommand(Command::new("setup").about("Start enrolling an authenticator app"))
        .subcommand(
            Command::new("confirm")
                .about("Finish enrolling with the setup token and a code")
                .arg(
                    Arg::new("setup-token")
                        .long("setup-token")
                        .help("Setup token printed by `2fa setup`")
                        .required(true),
                )
                .arg(code_arg()),
        )
        .subcommand(
            Command::new("disable")
                .about("Turn two-factor authentication off")
                .arg(password_arg("password", "password", "Password").env("IDGATE_PASSWORD")),
        )
}

fn friends() -> Command {
    Command::new("friends")
        .about("List or add friends")
        .subcommand_required(true)
        .subcommand(Command::new("list").about("List friends and whether they are online"))
        .subcommand(
            Command::new("add").about("Add a friend by username").arg(
                Arg::new("username")
                    .help("Username of the new friend")
                    .required(true),
            ),
        )
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("idgate")
        .about("Session and identity client")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Users API base URL")
                .default_value(DEFAULT_API_BASE_URL)
                .env("IDGATE_API_URL")
                .global(true)
                .value_parser(validator_url()),
        )
        .arg(
            Arg::new("health-url")
                .long("health-url")
                .help("Health check URL")
                .default_value(DEFAULT_HEALTH_URL)
                .env("IDGATE_HEALTH_URL")
                .global(true)
                .value_parser(validator_url()),
        )
        .arg(
            Arg::new("state-dir")
                .long("state-dir")
                .help("Directory where the session is kept")
                .default_value(DEFAULT_STATE_DIR)
                .env("IDGATE_STATE_DIR")
                .global(true),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Request timeout in milliseconds")
                .default_value("10000")
                .env("IDGATE_TIMEOUT_MS")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("reauth-path")
                .long("reauth-path")
                .help("Re-authentication entry point used when the session is rejected")
                .default_value(DEFAULT_REAUTH_PATH)
                .env("IDGATE_REAUTH_PATH")
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .help("Log output format")
                .default_value("text")
                .env("IDGATE_LOG_FORMAT")
                .global(true)
                .value_parser(["text", "json"]),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("IDGATE_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(register())
        .subcommand(login())
        .subcommand(code())
        .subcommand(Command::new("logout").about("End the current session"))
        .subcommand(Command::new("me").about("Show the current user"))
        .subcommand(update_profile())
        .subcommand(password())
        .subcommand(
            Command::new("delete-account")
                .about("Delete the current account")
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .help("Confirm the deletion")
                        .action(ArgAction::SetTrue)
                        .required(true),
                ),
        )
        .subcommand(two_fa())
        .subcommand(Command::new("users").about("List users"))
        .subcommand(friends())
        .subcommand(Command::new("validate").about("Ask the server who the held token belongs to"))
        .subcommand(Command::new("health").about("Check whether the API is reachable"))
}

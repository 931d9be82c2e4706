pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};
use std::sync::LazyLock;

pub const ARG_STORE: &str = "store";

pub const CMD_LOGIN: &str = "login";
pub const CMD_STATUS: &str = "status";
pub const CMD_LANDING: &str = "landing";
pub const CMD_OPEN: &str = "open";
pub const CMD_PASSWORD_CHANGED: &str = "password-changed";
pub const CMD_UNAUTHORIZED: &str = "unauthorized";
pub const CMD_LOGOUT: &str = "logout";

static LONG_VERSION: LazyLock<String> =
    LazyLock::new(|| format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH));

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("classgate")
        .about("Session and route admission for the school LMS client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(LONG_VERSION.as_str())
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_STORE)
                .short('s')
                .long("store")
                .help("Path of the session file")
                .default_value("classgate-session.json")
                .env("CLASSGATE_STORE")
                .global(true),
        )
        .subcommand(
            Command::new(CMD_LOGIN)
                .about("Store the credential bundle from a login or email verification response")
                .arg(
                    Arg::new("response")
                        .help("JSON response file ({access, refresh, user}), or - for stdin")
                        .required(true),
                ),
        )
        .subcommand(Command::new(CMD_STATUS).about("Show the current session state"))
        .subcommand(Command::new(CMD_LANDING).about("Print the landing path for the session"))
        .subcommand(
            Command::new(CMD_OPEN)
                .about("Decide what entering the app at a path does")
                .arg(Arg::new("path").help("Route path, e.g. /teacher-dashboard").required(true)),
        )
        .subcommand(
            Command::new(CMD_PASSWORD_CHANGED)
                .about("Clear the provisional-password flag after a successful change"),
        )
        .subcommand(
            Command::new(CMD_UNAUTHORIZED)
                .about("Drop the session after the API answered 401"),
        )
        .subcommand(Command::new(CMD_LOGOUT).about("Destroy the session"));

    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "classgate");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Session and route admission for the school LMS client".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_long_version_is_shared() {
        let first = new().get_long_version().map(|v| v.as_ptr());
        let second = new().get_long_version().map(|v| v.as_ptr());
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(
            new().get_long_version(),
            Some(format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).as_str())
        );
    }

    #[test]
    fn test_store_default() {
        temp_env::with_vars([("CLASSGATE_STORE", None::<&str>)], || {
            let matches = new().get_matches_from(vec!["classgate", "status"]);
            assert_eq!(
                matches.get_one::<String>(ARG_STORE).map(String::as_str),
                Some("classgate-session.json")
            );
        });
    }

    #[test]
    fn test_store_env_and_flag() {
        temp_env::with_vars([("CLASSGATE_STORE", Some("/tmp/from-env.json"))], || {
            let matches = new().get_matches_from(vec!["classgate", "status"]);
            assert_eq!(
                matches.get_one::<String>(ARG_STORE).map(String::as_str),
                Some("/tmp/from-env.json")
            );

            let matches =
                new().get_matches_from(vec!["classgate", "landing", "--store", "/tmp/flag.json"]);
            assert_eq!(
                matches.get_one::<String>(ARG_STORE).map(String::as_str),
                Some("/tmp/flag.json")
            );
        });
    }

    #[test]
    fn test_subcommand_required() {
        let result = new().try_get_matches_from(vec!["classgate"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_open_requires_path() {
        assert!(new().try_get_matches_from(vec!["classgate", "open"]).is_err());

        let matches = new().get_matches_from(vec!["classgate", "open", "/newsfeed"]);
        let open = matches.subcommand_matches(CMD_OPEN);
        assert_eq!(
            open.and_then(|m| m.get_one::<String>("path")).map(String::as_str),
            Some("/newsfeed")
        );
    }

    #[test]
    fn test_check_log_level_env() {
        for (index, level) in ["error", "warn", "info", "debug", "trace"].iter().enumerate() {
            temp_env::with_vars([("CLASSGATE_LOG_LEVEL", Some(*level))], || {
                let matches = new().get_matches_from(vec!["classgate", "status"]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        for count in 0..5_usize {
            temp_env::with_vars([("CLASSGATE_LOG_LEVEL", None::<&str>)], || {
                let mut args = vec!["classgate".to_string(), "status".to_string()];
                if count > 0 {
                    args.push(format!("-{}", "v".repeat(count)));
                }

                let matches = new().get_matches_from(args);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(count).ok()
                );
            });
        }
    }

    #[test]
    fn test_log_json_flag() {
        temp_env::with_vars([("CLASSGATE_LOG_JSON", None::<&str>)], || {
            let matches = new().get_matches_from(vec!["classgate", "status"]);
            assert!(!matches.get_flag(logging::ARG_LOG_JSON));

            let matches = new().get_matches_from(vec!["classgate", "status", "--log-json"]);
            assert!(matches.get_flag(logging::ARG_LOG_JSON));
        });
    }

    #[test]
    fn test_invalid_log_level() {
        temp_env::with_vars([("CLASSGATE_LOG_LEVEL", Some("loud"))], || {
            assert!(new()
                .try_get_matches_from(vec!["classgate", "status"])
                .is_err());
        });
    }
}

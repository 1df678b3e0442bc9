use core::convert::TryFrom;
use std::time::Duration;

use anyhow::{Error, Result};
use clap::{
    App,
    Arg,
    crate_authors, crate_version,
    SubCommand,
};

use crate::platform::Config;

const ABOUT: &str = "
Creates an account on a remote account service, verifying the email with a one-time passcode.

Walks through three steps: details, passcode, password. Anything not given on the
command line is asked for interactively.
";

/// What the user asked us to do
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Signup(Details),
}

/// Identity details given up front; the rest are prompted for
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Details {
    pub full_name: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
}

pub fn app() -> clap::App<'static, 'static> {

    let app = App::new("otp-signup")
        .author(crate_authors!())
        .version(crate_version!())
        .about(ABOUT)
        .setting(clap::AppSettings::SubcommandRequiredElseHelp)

        .arg(Arg::with_name("BASE-URL")
             .short("u")
             .long("base-url")
             .env("OTP_SIGNUP_BASE_URL")
             .default_value("http://localhost:8080")
             .help("base URL of the account service")
             .global(true)
        )

        .arg(Arg::with_name("TIMEOUT")
             .short("t")
             .long("timeout")
             .default_value("30")
             .value_name("SECONDS")
             .help("how long to wait for each request to the account service")
             .global(true)
        )

        .arg(Arg::with_name("verbose")
             .short("v")
             .long("verbose")
             .help("log debug output")
             .global(true)
        )

        .subcommand(SubCommand::with_name("signup")
            .about("register a new account")
            .arg(Arg::with_name("full-name")
                 .long("full-name")
                 .value_name("NAME")
                 .help("full name, e.g. \"Alice Liddell\"")
             )
            .arg(Arg::with_name("mobile")
                 .long("mobile")
                 .value_name("NUMBER")
                 .help("mobile phone number")
             )
            .arg(Arg::with_name("email")
                 .long("email")
                 .value_name("EMAIL")
                 .help("email address the passcode is sent to")
             )
        )
    ;

    app

}

/// Global arguments may be given before or after the subcommand; the latter wins.
fn global_value<'a>(args: &'a clap::ArgMatches<'static>, name: &str) -> Option<&'a str> {
    match args.subcommand() {
        (_, Some(command)) if command.occurrences_of(name) > 0 => command.value_of(name),
        _ => args.value_of(name),
    }
}

/// True if `-v` was given anywhere on the command line
pub fn verbose(args: &clap::ArgMatches<'static>) -> bool {
    args.is_present("verbose") || args.subcommand().1.map_or(false, |command| command.is_present("verbose"))
}

impl TryFrom<&'_ clap::ArgMatches<'static>> for Config {
    type Error = Error;
    fn try_from(args: &clap::ArgMatches<'static>) -> Result<Self> {
        let mut config = Config::default();
        if let Some(base_url) = global_value(args, "BASE-URL") {
            config.base_url = base_url.into();
        }
        if let Some(seconds) = global_value(args, "TIMEOUT") {
            let seconds: u64 = seconds
                .parse()
                .map_err(|_| anyhow::anyhow!("timeout must be a whole number of seconds, not {:?}", seconds))?;
            config.timeout = Duration::from_secs(seconds);
        }
        Ok(config)
    }
}

impl TryFrom<&'_ clap::ArgMatches<'static>> for Command {
    type Error = Error;
    fn try_from(args: &clap::ArgMatches<'static>) -> Result<Self> {
        if let Some(command) = args.subcommand_matches("signup") {
            return Ok(Command::Signup(Details {
                full_name: command.value_of("full-name").map(Into::into),
                mobile: command.value_of("mobile").map(Into::into),
                email: command.value_of("email").map(Into::into),
            }));
        }
        Err(anyhow::anyhow!("Unexpected case"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(argv: &[&str]) -> clap::ArgMatches<'static> {
        app().get_matches_from_safe(argv.iter().copied()).unwrap()
    }

    #[test]
    fn signup_takes_optional_details() {
        let args = matches(&["otp-signup", "signup", "--email", "a@b.com", "--full-name", "Jo"]);
        let command = Command::try_from(&args).unwrap();
        assert_eq!(command, Command::Signup(Details {
            full_name: Some("Jo".into()),
            mobile: None,
            email: Some("a@b.com".into()),
        }));
    }

    #[test]
    fn config_from_global_arguments() {
        let args = matches(&["otp-signup", "--base-url", "https://accounts.example/api/", "--timeout", "5", "signup"]);
        let config = Config::try_from(&args).unwrap();
        assert_eq!(config.base_url, "https://accounts.example/api/");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn global_arguments_after_the_subcommand() {
        let args = matches(&["otp-signup", "signup", "--timeout", "7", "-v"]);
        let config = Config::try_from(&args).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert!(verbose(&args));
    }

    #[test]
    fn bad_timeout_is_an_error() {
        let args = matches(&["otp-signup", "--timeout", "soon", "signup"]);
        assert!(Config::try_from(&args).is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(app().get_matches_from_safe(vec!["otp-signup"]).is_err());
    }
}

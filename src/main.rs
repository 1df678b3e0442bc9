use core::convert::TryFrom;

use anyhow::Result;
use log::{info, LevelFilter};

use otp_signup::{
    cli,
    platform::{self, Config, HttpAccountService},
    prompt::Prompt,
    registration::{Field, FlowStage, Outcome, RegistrationFlow},
};

#[tokio::main]
async fn main() -> Result<()> {

    let args = init_app();
    init_logger(cli::verbose(&args))?;
    info!("Welcome to signup.");

    let config = Config::try_from(&args)?;
    let command = cli::Command::try_from(&args)?;

    match command {
        cli::Command::Signup(details) => {
            signup(&config, details).await?;
        }
    }

    Ok(())
}

pub fn init_app() -> clap::ArgMatches<'static> {
    let app = cli::app();
    let matches = app.get_matches();
    matches
}

pub fn init_logger(verbose: bool) -> Result<()> {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    simple_logger::SimpleLogger::new().with_level(level).init()?;
    Ok(())
}

/// Drives one registration from the terminal. Each round prompts for the current stage's
/// fields and submits; a failed stage is simply asked for again.
async fn signup(config: &Config, details: cli::Details) -> Result<()> {
    let service = HttpAccountService::new(config)?;
    let (flow, mut notices) = RegistrationFlow::new(service);

    let given = [
        (Field::FullName, details.full_name),
        (Field::Mobile, details.mobile),
        (Field::Email, details.email),
    ];
    let mut prefilled = 0;
    for (field, value) in given.iter() {
        if let Some(value) = value {
            flow.update_field(*field, value.as_str()).await;
            prefilled += 1;
        }
    }

    let mut prompt = Prompt::stdin();
    // details given on the command line are only asked again after a failure
    let mut ask_details = prefilled < given.len();

    loop {
        match flow.stage().await {
            FlowStage::Details => {
                if ask_details {
                    let draft = flow.draft().await;
                    for &(field, label) in &[(Field::FullName, "Full name"), (Field::Mobile, "Mobile"), (Field::Email, "Email")] {
                        let current = draft.get(field);
                        let answer = prompt.ask(label, current).await?;
                        flow.update_field(field, answer).await;
                    }
                }
            }
            FlowStage::OtpEntry => {
                let otp = prompt.ask_verbatim("OTP from your email").await?;
                flow.update_field(Field::Otp, otp).await;
            }
            FlowStage::PasswordEntry => {
                let password = prompt.ask_secret("Create password").await?;
                flow.update_field(Field::Password, password).await;
            }
            FlowStage::Completed => break,
        }

        let outcome = flow.submit().await;
        // the submit has emitted its notice by now; show it before the next prompt
        platform::print_pending(&mut notices)?;
        match outcome {
            Outcome::Completed => break,
            Outcome::Failed | Outcome::Incomplete => ask_details = true,
            Outcome::Advanced(_) | Outcome::Busy | Outcome::WrongStage(_) => {}
        }
    }

    info!("registered {}", flow.draft().await.email);
    Ok(())
}

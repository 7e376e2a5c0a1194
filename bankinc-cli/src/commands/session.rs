use anyhow::{Result, bail};
use clap::Args;
use rpassword::prompt_password;
use shared::{
    client::{BankClient, LoginOutcome, RegistrationOutcome, RegistrationProfile},
    session::View,
};

use super::report_failure;

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long, short)]
    pub username: String,

    /// Prompted for when omitted
    #[arg(long, short)]
    pub password: Option<String>,
}

/// Registration takes either an explicit username and password, or the
/// demo onboarding form where the email signs in and the document number
/// is the password.
#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Full name, also printed on the default card
    #[arg(long, short)]
    pub name: String,

    #[arg(long, short, conflicts_with_all = ["document", "email"])]
    pub username: Option<String>,

    /// Prompted for when omitted
    #[arg(long, short, conflicts_with_all = ["document", "email"])]
    pub password: Option<String>,

    /// Identity document number
    #[arg(long, requires = "email")]
    pub document: Option<String>,

    #[arg(long, requires = "document")]
    pub email: Option<String>,
}

impl RegisterArgs {
    fn into_profile(self) -> Result<RegistrationProfile> {
        match (self.username, self.document, self.email) {
            (Some(username), None, None) => {
                let password = password_or_prompt(self.password)?;
                Ok(RegistrationProfile::new(self.name, username, password))
            }
            (None, Some(document), Some(email)) => {
                Ok(RegistrationProfile::from_document(self.name, document, email))
            }
            _ => bail!("pass either --username or both --document and --email"),
        }
    }
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => Ok(prompt_password("Password: ")?),
    }
}

fn print_active_card(card_id: Option<&str>) {
    match card_id {
        Some(card_id) => println!("Active card: {card_id}"),
        None => println!("No card yet. Run `bankinc cards generate` to request one."),
    }
}

pub async fn login(client: &BankClient, args: LoginArgs) -> Result<()> {
    let password = password_or_prompt(args.password)?;

    match client.login(&args.username, &password).await? {
        LoginOutcome::Authenticated { username, card_id } => {
            println!("Signed in as {username}.");
            print_active_card(card_id.as_deref());
        }
        LoginOutcome::Rejected(response) => {
            report_failure(&response);
            bail!("login failed with status {}", response.status);
        }
        LoginOutcome::Superseded => println!("Sign-in superseded by a newer session change."),
    }
    Ok(())
}

pub async fn register(client: &BankClient, args: RegisterArgs) -> Result<()> {
    let profile = args.into_profile()?;

    match client.register(&profile).await? {
        RegistrationOutcome::Registered { username, card } => {
            println!("Registered and signed in as {username}.");
            print_active_card(card.as_ref().map(|card| card.card_id.as_str()));
        }
        RegistrationOutcome::CardCreationFailed { username, response } => {
            println!("Registered and signed in as {username}, but the default card was not created.");
            if let Some(response) = response {
                report_failure(&response);
            }
        }
        RegistrationOutcome::Rejected(response) => {
            report_failure(&response);
            bail!("registration failed with status {}", response.status);
        }
        RegistrationOutcome::Superseded => {
            println!("Registration superseded by a newer session change.");
        }
    }
    Ok(())
}

pub fn logout(client: &BankClient) -> Result<()> {
    client.logout()?;
    println!("Signed out.");
    Ok(())
}

pub async fn status(client: &BankClient) -> Result<()> {
    match client.restore_session().await {
        View::Dashboard => {
            let session = client.session()?;
            println!(
                "Signed in as {}.",
                session.username.as_deref().unwrap_or_default()
            );
            print_active_card(session.card_id.as_deref());
        }
        View::SignedOut => println!("Signed out."),
    }
    Ok(())
}

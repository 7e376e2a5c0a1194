use anyhow::Result;
use clap::{Args, Subcommand};
use shared::{
    client::BankClient,
    models::{CardSummary, GeneratedCard},
    transport::ApiResponse,
};

use super::report_failure;

/// Card to act on. The active card is used when omitted.
#[derive(Args, Debug)]
pub struct CardArgs {
    #[arg(long = "card", value_name = "CARD_ID")]
    pub card_id: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum CardCommand {
    /// Request a new card; it becomes the active card
    Generate {
        /// Six character product code. Defaults to the configured product.
        #[arg(long, short)]
        product: Option<String>,

        /// Name printed on the card. Defaults to the signed-in username.
        #[arg(long)]
        holder: Option<String>,
    },

    /// List the cards of the signed-in user
    Me,

    /// Activate a card
    Enroll(CardArgs),

    /// Block a card
    Block(CardArgs),

    /// Add funds to a card
    Recharge {
        #[command(flatten)]
        card: CardArgs,

        /// Amount to add. Anything that is not a number counts as 0.
        #[arg(long, short, default_value = "", allow_hyphen_values = true)]
        amount: String,
    },

    /// Show a card's balance
    Balance(CardArgs),
}

pub async fn run(client: &BankClient, command: CardCommand) -> Result<()> {
    let response = match command {
        CardCommand::Generate { product, holder } => {
            let response = client
                .generate_card(product.as_deref(), holder.as_deref())
                .await?;
            if response.is_success() {
                if let Some(card) = GeneratedCard::from_body(&response.body) {
                    println!("Card {} generated. Enroll it before use.", card.card_id);
                }
            }
            response
        }
        CardCommand::Me => {
            let response = client.list_cards().await?;
            print_cards(&response);
            response
        }
        CardCommand::Enroll(args) => client.enroll_card(args.card_id.as_deref()).await?,
        CardCommand::Block(args) => client.block_card(args.card_id.as_deref()).await?,
        CardCommand::Recharge { card, amount } => {
            client.recharge(card.card_id.as_deref(), &amount).await?
        }
        CardCommand::Balance(args) => {
            let response = client.balance(args.card_id.as_deref()).await?;
            if response.is_success() {
                println!("Balance: {}", response.body);
            }
            response
        }
    };

    if !response.is_success() {
        report_failure(&response);
    }
    Ok(())
}

fn print_cards(response: &ApiResponse) {
    if !response.is_success() {
        return;
    }
    let cards = CardSummary::list_from(&response.body);
    if cards.is_empty() {
        println!("No cards.");
        return;
    }
    for card in cards {
        let state = match (card.active, card.blocked) {
            (_, true) => "blocked",
            (true, false) => "active",
            (false, false) => "inactive",
        };
        println!(
            "{}  {:<24} {:>12}  {state}",
            card.card_id,
            card.holder_name.as_deref().unwrap_or("-"),
            card.balance.map_or_else(|| "-".to_string(), |balance| format!("{balance:.2}")),
        );
    }
}

use anyhow::Result;
use clap::Subcommand;
use shared::{
    client::BankClient,
    models::{PurchaseReceipt, TransactionRecord},
    transport::ResponseBody,
};

use super::report_failure;

#[derive(Subcommand, Debug)]
pub enum TxCommand {
    /// Charge a purchase to a card
    Purchase {
        /// Card to charge. The active card is used when omitted.
        #[arg(long = "card", value_name = "CARD_ID")]
        card_id: Option<String>,

        /// Purchase price. Anything that is not a number counts as 0.
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        price: String,
    },

    /// Look a transaction up
    Get { transaction_id: Option<String> },

    /// Annul a transaction
    Annul { transaction_id: Option<String> },
}

fn parse<T: serde::de::DeserializeOwned>(body: &ResponseBody) -> Option<T> {
    match body {
        ResponseBody::Json(value) => serde_json::from_value(value.clone()).ok(),
        ResponseBody::Text(_) => None,
    }
}

pub async fn run(client: &BankClient, command: TxCommand) -> Result<()> {
    let response = match command {
        TxCommand::Purchase { card_id, price } => {
            let response = client.purchase(card_id.as_deref(), &price).await?;
            if let Some(receipt) = parse::<PurchaseReceipt>(&response.body) {
                println!("Transaction {} {}.", receipt.transaction_id, receipt.status);
            }
            response
        }
        TxCommand::Get { transaction_id } => {
            let response = client.get_transaction(transaction_id.as_deref()).await?;
            if let Some(record) = parse::<TransactionRecord>(&response.body) {
                let price = record
                    .price
                    .map_or_else(|| "-".to_string(), |price| format!("{price:.2}"));
                println!("Transaction {}: {price}, {}", record.transaction_id, record.status);
            }
            response
        }
        TxCommand::Annul { transaction_id } => {
            client.annul_transaction(transaction_id.as_deref()).await?
        }
    };

    if !response.is_success() {
        report_failure(&response);
    }
    Ok(())
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `/transaction/purchase`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    /// Card charged for the purchase.
    pub card_id: String,
    /// Purchase amount.
    pub price: f64,
}

/// Body of `/transaction/anulation`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnnulationRequest {
    /// Transaction to annul.
    pub transaction_id: String,
}

/// Lifecycle of a recorded purchase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    /// Charged to the card.
    #[serde(alias = "Completed")]
    Completed,
    /// Reversed; the amount was returned.
    #[serde(alias = "Annulled")]
    Annulled,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Completed => "completed",
            Self::Annulled => "annulled",
        })
    }
}

/// Successful answer to a purchase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    /// Identifier to look the purchase up or annul it.
    pub transaction_id: String,
    /// State right after the purchase.
    pub status: TransactionStatus,
}

/// A transaction as returned by `/transaction/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Transaction identifier.
    pub transaction_id: String,
    /// Charged amount.
    #[serde(default)]
    pub price: Option<f64>,
    /// Left as the service formats it.
    #[serde(default)]
    pub transaction_date: Option<serde_json::Value>,
    /// Current state.
    pub status: TransactionStatus,
}

//! Wire shapes exchanged with the BankInc API.

pub mod auth;
pub mod card;
pub mod errors;
pub mod transaction;

pub use auth::{AuthResponse, Credentials};
pub use card::{CardCreateRequest, CardSummary, GeneratedCard, first_card_id};
pub use errors::ErrorResponse;
pub use transaction::{AnnulationRequest, PurchaseReceipt, PurchaseRequest, TransactionRecord, TransactionStatus};

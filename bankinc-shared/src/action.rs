//! Pure mapping from user actions to request descriptors.
//!
//! Nothing here touches the network or the session; [`Action::descriptor`]
//! is the whole contract between a button and an endpoint.

use serde_json::{Value, json};
use std::fmt;
use url::Url;

use crate::models::{AnnulationRequest, CardCreateRequest, Credentials, PurchaseRequest};

/// HTTP verbs used by the banking API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read-only call.
    Get,
    /// Call that changes server state.
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
        })
    }
}

/// Transport-independent description of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// HTTP verb.
    pub method: Method,
    /// Unencoded path segments, appended to the base URL.
    pub path: Vec<String>,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// JSON payload, if the endpoint takes one.
    pub body: Option<Value>,
}

impl RequestDescriptor {
    fn new(method: Method, path: &[&str]) -> Self {
        Self {
            method,
            path: path.iter().map(ToString::to_string).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    fn with_query(mut self, key: &str, value: String) -> Self {
        self.query.push((key.to_string(), value));
        self
    }

    fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Resolves the descriptor against `base`, percent-encoding each segment.
    ///
    /// A path prefix on `base` (e.g. `https://host/api/`) is preserved.
    #[must_use]
    pub fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(&self.path);
        }
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        url
    }
}

/// Every call the client can make.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// `POST /auth/login`
    Login(Credentials),
    /// `POST /auth/register`
    Register(Credentials),
    /// `GET /cards/me`
    ListMyCards,
    /// `POST /cards/generate`
    GenerateCard(CardCreateRequest),
    /// `POST /cards/{id}/enroll`
    EnrollCard {
        /// Card to activate.
        card_id: String,
    },
    /// `POST /cards/{id}/block`
    BlockCard {
        /// Card to block.
        card_id: String,
    },
    /// `POST /cards/{id}/recharge?amount=`
    Recharge {
        /// Card to top up.
        card_id: String,
        /// Already coerced amount.
        amount: f64,
    },
    /// `GET /cards/{id}/balance`
    Balance {
        /// Card to inspect.
        card_id: String,
    },
    /// `POST /transaction/purchase`
    Purchase(PurchaseRequest),
    /// `GET /transaction/{id}`
    GetTransaction {
        /// Transaction to look up.
        transaction_id: String,
    },
    /// `POST /transaction/anulation`
    AnnulTransaction(AnnulationRequest),
}

impl Action {
    /// Stable name used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::Register(_) => "register",
            Self::ListMyCards => "list_my_cards",
            Self::GenerateCard(_) => "generate_card",
            Self::EnrollCard { .. } => "enroll_card",
            Self::BlockCard { .. } => "block_card",
            Self::Recharge { .. } => "recharge",
            Self::Balance { .. } => "balance",
            Self::Purchase(_) => "purchase",
            Self::GetTransaction { .. } => "get_transaction",
            Self::AnnulTransaction(_) => "annul_transaction",
        }
    }

    /// The request this action maps to.
    #[must_use]
    pub fn descriptor(&self) -> RequestDescriptor {
        match self {
            Self::Login(credentials) => {
                RequestDescriptor::new(Method::Post, &["auth", "login"]).with_body(json!(credentials))
            }
            Self::Register(credentials) => RequestDescriptor::new(Method::Post, &["auth", "register"])
                .with_body(json!(credentials)),
            Self::ListMyCards => RequestDescriptor::new(Method::Get, &["cards", "me"]),
            Self::GenerateCard(request) => {
                RequestDescriptor::new(Method::Post, &["cards", "generate"]).with_body(json!(request))
            }
            Self::EnrollCard { card_id } => {
                RequestDescriptor::new(Method::Post, &["cards", card_id.as_str(), "enroll"])
            }
            Self::BlockCard { card_id } => {
                RequestDescriptor::new(Method::Post, &["cards", card_id.as_str(), "block"])
            }
            Self::Recharge { card_id, amount } => {
                RequestDescriptor::new(Method::Post, &["cards", card_id.as_str(), "recharge"])
                    .with_query("amount", amount.to_string())
            }
            Self::Balance { card_id } => {
                RequestDescriptor::new(Method::Get, &["cards", card_id.as_str(), "balance"])
            }
            Self::Purchase(request) => {
                RequestDescriptor::new(Method::Post, &["transaction", "purchase"])
                    .with_body(json!(request))
            }
            Self::GetTransaction { transaction_id } => {
                RequestDescriptor::new(Method::Get, &["transaction", transaction_id.as_str()])
            }
            Self::AnnulTransaction(request) => {
                RequestDescriptor::new(Method::Post, &["transaction", "anulation"])
                    .with_body(json!(request))
            }
        }
    }
}

/// Turns free-text amount input into a number.
///
/// Blank or unparseable input becomes `0`; the service does the real
/// validation.
#[must_use]
pub fn coerce_amount(input: &str) -> f64 {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Picks the explicit id when one was typed, otherwise the remembered one.
#[must_use]
pub fn resolve_id(input: Option<&str>, remembered: Option<String>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .or_else(|| remembered.filter(|id| !id.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:8081").unwrap()
    }

    #[test]
    fn test_coerce_amount() {
        assert_eq!(coerce_amount(""), 0.0);
        assert_eq!(coerce_amount("   "), 0.0);
        assert_eq!(coerce_amount("abc"), 0.0);
        assert_eq!(coerce_amount("NaN"), 0.0);
        assert_eq!(coerce_amount("inf"), 0.0);
        assert_eq!(coerce_amount("12.5"), 12.5);
        assert_eq!(coerce_amount(" 100 "), 100.0);
    }

    #[test]
    fn test_resolve_id_prefers_explicit_input() {
        assert_eq!(
            resolve_id(Some("PROD01A"), Some("PROD01B".into())),
            Some("PROD01A".to_string())
        );
        assert_eq!(
            resolve_id(Some("  "), Some("PROD01B".into())),
            Some("PROD01B".to_string())
        );
        assert_eq!(resolve_id(None, Some("PROD01B".into())), Some("PROD01B".to_string()));
        assert_eq!(resolve_id(Some(""), None), None);
        assert_eq!(resolve_id(None, Some(String::new())), None);
    }

    #[test]
    fn test_login_descriptor() {
        let descriptor = Action::Login(Credentials::new("ana", "pw")).descriptor();
        assert_eq!(descriptor.method, Method::Post);
        assert_eq!(descriptor.url(&base()).as_str(), "http://localhost:8081/auth/login");
        assert_eq!(descriptor.body, Some(json!({"username": "ana", "password": "pw"})));
    }

    #[test]
    fn test_generate_card_descriptor_uses_json_body() {
        let descriptor = Action::GenerateCard(CardCreateRequest {
            product_id: "PROD01".into(),
            holder_name: "Ana Ruiz".into(),
        })
        .descriptor();
        assert_eq!(descriptor.url(&base()).as_str(), "http://localhost:8081/cards/generate");
        assert_eq!(
            descriptor.body,
            Some(json!({"productId": "PROD01", "holderName": "Ana Ruiz"}))
        );
    }

    #[test]
    fn test_card_scoped_descriptors() {
        let card_id = "PROD010000000001".to_string();
        let cases = [
            (Action::EnrollCard { card_id: card_id.clone() }, Method::Post, "enroll"),
            (Action::BlockCard { card_id: card_id.clone() }, Method::Post, "block"),
            (Action::Balance { card_id: card_id.clone() }, Method::Get, "balance"),
        ];
        for (action, method, suffix) in cases {
            let descriptor = action.descriptor();
            assert_eq!(descriptor.method, method);
            assert!(descriptor.body.is_none());
            assert_eq!(
                descriptor.url(&base()).as_str(),
                format!("http://localhost:8081/cards/PROD010000000001/{suffix}")
            );
        }
    }

    #[test]
    fn test_recharge_sends_amount_as_query() {
        let descriptor = Action::Recharge {
            card_id: "PROD010000000001".into(),
            amount: 12.5,
        }
        .descriptor();
        assert_eq!(
            descriptor.url(&base()).as_str(),
            "http://localhost:8081/cards/PROD010000000001/recharge?amount=12.5"
        );

        let zero = Action::Recharge {
            card_id: "c".into(),
            amount: coerce_amount(""),
        }
        .descriptor();
        assert_eq!(zero.query, vec![("amount".to_string(), "0".to_string())]);
    }

    #[test]
    fn test_transaction_descriptors() {
        let purchase = Action::Purchase(PurchaseRequest {
            card_id: "PROD010000000001".into(),
            price: 0.0,
        })
        .descriptor();
        assert_eq!(purchase.url(&base()).as_str(), "http://localhost:8081/transaction/purchase");
        assert_eq!(purchase.body, Some(json!({"cardId": "PROD010000000001", "price": 0.0})));

        let lookup = Action::GetTransaction {
            transaction_id: "tx-1".into(),
        }
        .descriptor();
        assert_eq!(lookup.method, Method::Get);
        assert_eq!(lookup.url(&base()).as_str(), "http://localhost:8081/transaction/tx-1");

        let annul = Action::AnnulTransaction(AnnulationRequest {
            transaction_id: "tx-1".into(),
        })
        .descriptor();
        assert_eq!(annul.url(&base()).as_str(), "http://localhost:8081/transaction/anulation");
        assert_eq!(annul.body, Some(json!({"transactionId": "tx-1"})));
    }

    #[test]
    fn test_url_encodes_segments_and_keeps_base_path() {
        let base = Url::parse("https://bank.example.com/api/").unwrap();
        let descriptor = Action::GetTransaction {
            transaction_id: "a/b c".into(),
        }
        .descriptor();
        assert_eq!(
            descriptor.url(&base).as_str(),
            "https://bank.example.com/api/transaction/a%2Fb%20c"
        );
    }
}

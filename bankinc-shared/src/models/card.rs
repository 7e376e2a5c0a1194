use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transport::ResponseBody;

/// Body of `/cards/generate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardCreateRequest {
    /// Six character product code, e.g. `PROD01`.
    pub product_id: String,
    /// Name printed on the card.
    pub holder_name: String,
}

/// A card as listed by `/cards/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardSummary {
    /// Sixteen digit card number.
    pub card_id: String,
    /// Product code the card was issued under.
    #[serde(default)]
    pub product_id: Option<String>,
    /// Name printed on the card.
    #[serde(default)]
    pub holder_name: Option<String>,
    /// Left as the service formats it.
    #[serde(default)]
    pub expiration_date: Option<Value>,
    /// Available funds.
    #[serde(default)]
    pub balance: Option<f64>,
    /// Cards start inactive until enrolled.
    #[serde(default)]
    pub active: bool,
    /// Blocked cards reject every operation.
    #[serde(default)]
    pub blocked: bool,
}

impl CardSummary {
    /// Reads every well-formed card out of a `/cards/me` body, skipping the rest.
    #[must_use]
    pub fn list_from(body: &ResponseBody) -> Vec<Self> {
        match body {
            ResponseBody::Json(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Card number returned by `/cards/generate`.
///
/// The service answers with the bare number, which may arrive as plain text,
/// a JSON string or a JSON number, while some deployments wrap it as
/// `{"cardId": ...}`. All of them normalize into this type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCard {
    /// Number of the new card.
    pub card_id: String,
}

impl GeneratedCard {
    /// Normalizes any of the known response shapes.
    #[must_use]
    pub fn from_body(body: &ResponseBody) -> Option<Self> {
        let card_id = match body {
            ResponseBody::Text(text) => Some(text.trim().to_string()),
            ResponseBody::Json(value) => card_id_of(value),
        }?;
        (!card_id.is_empty()).then_some(Self { card_id })
    }
}

fn card_id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Object(fields) => fields.get("cardId").and_then(card_id_of),
        _ => None,
    }
}

/// First card id of a `/cards/me` listing, if any.
#[must_use]
pub fn first_card_id(body: &ResponseBody) -> Option<String> {
    match body {
        ResponseBody::Json(Value::Array(items)) => items.first().and_then(|first| {
            first
                .get("cardId")
                .and_then(card_id_of)
                .filter(|id| !id.is_empty())
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generated_card_from_plain_text() {
        let card = GeneratedCard::from_body(&ResponseBody::Text("0123456789012345\n".into()));
        assert_eq!(card.unwrap().card_id, "0123456789012345");
    }

    #[test]
    fn test_generated_card_from_json_number_and_string() {
        let card = GeneratedCard::from_body(&ResponseBody::Json(json!(4_111_111_111_111_111_u64)));
        assert_eq!(card.unwrap().card_id, "4111111111111111");

        let card = GeneratedCard::from_body(&ResponseBody::Json(json!("PROD011234567890")));
        assert_eq!(card.unwrap().card_id, "PROD011234567890");
    }

    #[test]
    fn test_generated_card_from_object() {
        let card = GeneratedCard::from_body(&ResponseBody::Json(json!({"cardId": "PROD019999999999"})));
        assert_eq!(card.unwrap().card_id, "PROD019999999999");
    }

    #[test]
    fn test_generated_card_rejects_unknown_shapes() {
        assert!(GeneratedCard::from_body(&ResponseBody::Text(String::new())).is_none());
        assert!(GeneratedCard::from_body(&ResponseBody::Json(json!({"id": 1}))).is_none());
        assert!(GeneratedCard::from_body(&ResponseBody::Json(json!(null))).is_none());
    }

    #[test]
    fn test_first_card_id() {
        let body = ResponseBody::Json(json!([
            {"cardId": "PROD010000000001", "balance": 10.5},
            {"cardId": "PROD010000000002"}
        ]));
        assert_eq!(first_card_id(&body), Some("PROD010000000001".to_string()));
        assert_eq!(first_card_id(&ResponseBody::Json(json!([]))), None);
        assert_eq!(first_card_id(&ResponseBody::Json(json!({"cardId": "x"}))), None);
    }

    #[test]
    fn test_card_summary_list_skips_malformed_entries() {
        let body = ResponseBody::Json(json!([
            {"cardId": "PROD010000000001", "productId": "PROD01", "holderName": "Ana Ruiz",
             "expirationDate": "2028-10-16", "balance": 25.0, "active": true, "blocked": false},
            {"holderName": "no id"}
        ]));
        let cards = CardSummary::list_from(&body);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].holder_name.as_deref(), Some("Ana Ruiz"));
        assert!(cards[0].active);
        assert_eq!(cards[0].balance, Some(25.0));
        assert_eq!(cards[0].expiration_date, Some(json!("2028-10-16")));
    }
}

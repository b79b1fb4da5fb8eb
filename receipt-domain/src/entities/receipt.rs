// Receipt entities
// Inference output and its persisted header/item shape

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price: Option<f64>,
}

/// Structured receipt as returned by the vision model. Every field may be
/// missing; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptExtraction {
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub tax: Option<f64>,
    #[serde(default)]
    pub items: Option<Vec<LineItem>>,
}

impl ReceiptExtraction {
    pub fn line_items(&self) -> &[LineItem] {
        self.items.as_deref().unwrap_or(&[])
    }
}

/// Result of one extraction call.
///
/// `Failed` serialises to `{"error": "<reason>"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractionOutcome {
    Failed { error: String },
    Receipt(ReceiptExtraction),
}

impl ExtractionOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        ExtractionOutcome::Failed {
            error: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReceiptItem {
    pub id: i64,
    pub name: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReceipt {
    pub id: i64,
    pub business_name: Option<String>,
    pub date: Option<String>,
    pub total: Option<f64>,
    pub tax: Option<f64>,
    pub items: Vec<StoredReceiptItem>,
}

/// JSON schema the model is asked to follow.
pub fn receipt_json_schema() -> Value {
    json!({
        "title": "Receipt",
        "type": "object",
        "properties": {
            "businessName": {
                "anyOf": [{ "type": "string" }, { "type": "null" }],
                "default": null,
                "description": "Name of the business on the receipt"
            },
            "date": {
                "anyOf": [{ "type": "string" }, { "type": "null" }],
                "default": null,
                "description": "Date when the receipt was created"
            },
            "total": {
                "anyOf": [{ "type": "number" }, { "type": "null" }],
                "default": null,
                "description": "Total amount on the receipt"
            },
            "tax": {
                "anyOf": [{ "type": "number" }, { "type": "null" }],
                "default": null,
                "description": "Tax amount on the receipt"
            },
            "items": {
                "anyOf": [
                    {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": { "type": "string" },
                                "price": { "type": "number" }
                            }
                        }
                    },
                    { "type": "null" }
                ],
                "default": null,
                "description": "List of items purchased, each with name and price"
            }
        }
    })
}

// Models sometimes quote amounts ("12.50", "$4.50").
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => Ok(number.as_f64()),
        Some(Value::String(raw)) => parse_amount(&raw)
            .map_err(|_| D::Error::custom(format!("invalid amount '{}'", raw))),
        Some(other) => Err(D::Error::custom(format!(
            "expected a number for amount, got {}",
            other
        ))),
    }
}

fn parse_amount(raw: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let cleaned = raw
        .trim()
        .trim_start_matches(['$', '€', '£', '¥'])
        .trim()
        .replace(',', "");
    if cleaned.is_empty() {
        return Ok(None);
    }
    cleaned.parse::<f64>().map(Some)
}

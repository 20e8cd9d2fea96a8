//! Wire schema for the dialogue platform's webhook exchange. Every inbound
//! field is defaulted so partially populated payloads still parse; unknown
//! fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct WebhookRequest {
    pub response_id: String,
    pub session: String,
    pub query_result: QueryResult,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryResult {
    pub query_text: String,
    pub intent: Intent,
    pub parameters: Map<String, Value>,
    pub output_contexts: Vec<OutputContext>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Intent {
    pub name: String,
    pub display_name: String,
}

/// A named, lifespan-bounded parameter bag the platform carries across turns.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputContext {
    pub name: String,
    pub lifespan_count: i64,
    pub parameters: Map<String, Value>,
}

/// Outbound message. Both fields optional; absence of both serializes to the
/// empty acknowledgement body `{}`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct WebhookResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfillment_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup_event_input: Option<EventInput>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EventInput {
    pub name: String,
    pub language_code: String,
}

mod directory_tests;
mod flow_tests;

use serde_json::{json, Value};

use rsvper_shared::models::dialogflow::WebhookRequest;
use rsvper_shared::test_utils::mock_row_store::MockRowStore;

use crate::directory::INVITED_FAMILY_TABLE;

/// Invited-family sheet used across the tests. Codes 1..=3 sit on their
/// natural rows; code 300 is out of order and only findable by the fallback
/// scan.
pub fn family_rows() -> Vec<Vec<Value>> {
    vec![
        vec![
            json!("Origin"),
            json!("Family"),
            json!("Invitees"),
            json!("Code"),
        ],
        // code 1: invited to everything with fixed counts
        vec![
            json!("US"),
            json!("Shah Family"),
            json!("Anand & Priya"),
            json!("1"),
            json!("4"),
            json!("NULL"),
            json!("2"),
            json!("NULL"),
            json!("6"),
            json!("NULL"),
        ],
        // code 2: Vidhi 5, no Garba, Wedding 3
        vec![
            json!("US"),
            json!("Mehta Family"),
            json!("Ravi"),
            json!("2"),
            json!("5"),
            json!("NULL"),
            json!("NULL"),
            json!("NULL"),
            json!("3"),
            json!("NULL"),
        ],
        // code 3: not invited to anything
        vec![
            json!("UK"),
            json!("Patel Family"),
            json!("Nisha"),
            json!("3"),
            json!("NULL"),
            json!("NULL"),
            json!("NULL"),
            json!("NULL"),
            json!("NULL"),
            json!("NULL"),
        ],
        // code 300: whole family to the Wedding only
        vec![
            json!("IN"),
            json!("Desai Family"),
            json!("Meera"),
            json!("300"),
            json!("NULL"),
            json!("NULL"),
            json!("NULL"),
            json!("NULL"),
            json!("ALL"),
            json!("NULL"),
        ],
    ]
}

pub fn seeded_store() -> MockRowStore {
    MockRowStore::new().with_table(INVITED_FAMILY_TABLE, family_rows())
}

/// Builds an inbound platform payload for one turn.
pub fn webhook_payload(intent: &str, parameters: Value, contexts: Value) -> Value {
    json!({
        "responseId": uuid::Uuid::new_v4().to_string(),
        "session": format!("projects/rsvper-42ec0/agent/sessions/{}", uuid::Uuid::new_v4()),
        "queryResult": {
            "queryText": "8",
            "intent": {
                "name": "projects/rsvper-42ec0/agent/intents/a919510e",
                "displayName": intent
            },
            "parameters": parameters,
            "outputContexts": contexts
        }
    })
}

pub fn parse_request(payload: Value) -> WebhookRequest {
    serde_json::from_value(payload).unwrap()
}

/// Context bag the platform carries the invite code and phone number in.
pub fn invite_context(invite_code: i64) -> Value {
    json!({
        "name": "projects/rsvper-42ec0/agent/sessions/s/contexts/invite_context",
        "lifespanCount": 5,
        "parameters": {
            "inviteCode": invite_code,
            "inviteCode.original": invite_code.to_string(),
            "phoneNumber": "555"
        }
    })
}

/// The platform's memory of answers already collected this session.
pub fn answered_context(parameters: Value) -> Value {
    json!({
        "name": "projects/rsvper-42ec0/agent/sessions/s/contexts/rsvp_context",
        "lifespanCount": 25,
        "parameters": parameters
    })
}

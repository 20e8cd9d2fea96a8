//! Per-turn conversational memory, rebuilt from the platform's contexts.
//!
//! The platform's slot names vary in casing and prefix across intents, so all
//! key matching is case-insensitive substring matching against fixed tokens.
//! Contexts are scanned in the order supplied and the first one carrying a
//! key wins, which keeps duplicated keys across contexts deterministic.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use rsvper_shared::models::dialogflow::WebhookRequest;
use rsvper_shared::models::SubEvent;

/// Keys carrying the raw utterance rather than the resolved value.
const ORIGINAL_SUFFIX: &str = ".original";
/// Token identifying invite-code parameters.
pub const INVITE_CODE_TOKEN: &str = "inviteCode";
/// Token identifying the guest's phone number.
const PHONE_TOKEN: &str = "phone";
/// Token paired with a sub-event name in answer-carrying keys.
const RSVP_TOKEN: &str = "rsvp";
/// Context holding the answers already collected this session.
const ANSWERED_CONTEXT_MARKER: &str = "rsvp_context";

pub fn case_insensitive_contains(haystack: &str, needle: &str) -> bool {
    haystack.to_uppercase().contains(&needle.to_uppercase())
}

#[derive(Clone, Debug, Default)]
pub struct ConversationContext {
    pub session_id: String,
    pub response_id: String,
    pub invite_code: Option<i64>,
    pub phone_number: Option<String>,
    pub answered: BTreeMap<SubEvent, i64>,
}

impl ConversationContext {
    pub fn from_request(request: &WebhookRequest) -> Self {
        let contexts = &request.query_result.output_contexts;

        let invite_code = contexts
            .iter()
            .find_map(|context| find_count_param(&context.parameters, INVITE_CODE_TOKEN));
        let phone_number = contexts
            .iter()
            .find_map(|context| find_string_param(&context.parameters, PHONE_TOKEN));

        let mut answered = BTreeMap::new();
        if let Some(context) = contexts
            .iter()
            .find(|context| case_insensitive_contains(&context.name, ANSWERED_CONTEXT_MARKER))
        {
            for event in SubEvent::ALL {
                if let Some(count) = rsvp_count(&context.parameters, event) {
                    answered.insert(event, count);
                }
            }
        }

        Self {
            session_id: request.session.clone(),
            response_id: request.response_id.clone(),
            invite_code,
            phone_number,
            answered,
        }
    }
}

/// Recorded answer for one sub-event: a key containing the event name and
/// the rsvp token, resolved values only.
pub fn rsvp_count(parameters: &Map<String, Value>, event: SubEvent) -> Option<i64> {
    parameters.iter().find_map(|(key, value)| {
        if case_insensitive_contains(key, ORIGINAL_SUFFIX) {
            return None;
        }
        if case_insensitive_contains(key, event.name())
            && case_insensitive_contains(key, RSVP_TOKEN)
        {
            value_to_count(value)
        } else {
            None
        }
    })
}

/// First numeric parameter whose key contains `token`.
pub fn find_count_param(parameters: &Map<String, Value>, token: &str) -> Option<i64> {
    parameters.iter().find_map(|(key, value)| {
        if case_insensitive_contains(key, ORIGINAL_SUFFIX) {
            return None;
        }
        if case_insensitive_contains(key, token) {
            value_to_count(value)
        } else {
            None
        }
    })
}

fn find_string_param(parameters: &Map<String, Value>, token: &str) -> Option<String> {
    parameters.iter().find_map(|(key, value)| {
        if case_insensitive_contains(key, ORIGINAL_SUFFIX) {
            return None;
        }
        if !case_insensitive_contains(key, token) {
            return None;
        }
        match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    })
}

/// Slot values arrive as JSON numbers or decimal strings depending on how
/// the platform resolved them.
pub fn value_to_count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

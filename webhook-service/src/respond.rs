use rsvper_shared::models::dialogflow::{EventInput, WebhookResponse};

/// Language tag attached to every follow-up event.
pub const LANGUAGE_CODE: &str = "en";

/// Renders a turn decision into the platform's response schema. Empty or
/// absent message and follow-up yield the empty acknowledgement body.
pub fn compose(message: Option<String>, followup: Option<&str>) -> WebhookResponse {
    WebhookResponse {
        fulfillment_text: message.filter(|text| !text.is_empty()),
        followup_event_input: followup.filter(|name| !name.is_empty()).map(|name| EventInput {
            name: name.to_string(),
            language_code: LANGUAGE_CODE.to_string(),
        }),
    }
}

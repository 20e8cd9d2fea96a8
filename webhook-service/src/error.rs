use log::debug;

use rsvper_shared::error::ServiceError;
use rsvper_shared::models::dialogflow::WebhookResponse;

use crate::respond;

// The platform expects a 200 with a well-formed body even when a turn fails,
// so errors map to user-facing fulfillment text rather than status codes.
pub fn fallback_response(err: &ServiceError) -> WebhookResponse {
    let text = match err {
        ServiceError::NotFound(_) | ServiceError::Lookup(_) => {
            "I couldn't find that invite code. Could you double-check the number \
             on your invitation and try again?"
        }
        ServiceError::Extraction(_) => "Sorry, I didn't catch that. Could you say it one more time?",
        ServiceError::Parse(_)
        | ServiceError::StoreWrite(_)
        | ServiceError::Internal(_)
        | ServiceError::Timeout(_) => {
            "Something went wrong on my end. Please try again in a moment."
        }
    };
    debug!("Degrading turn error to fulfillment text: {}", err);
    respond::compose(Some(text.to_string()), None)
}

use axum::{extract::State, Json};
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

use rsvper_shared::error::ServiceError;
use rsvper_shared::models::dialogflow::{WebhookRequest, WebhookResponse};
use rsvper_shared::store::RowStore;

use crate::error::fallback_response;
use crate::flow;

/// Upper bound on one turn, store I/O included. The dialogue platform gives
/// webhooks only a few seconds before it gives up on the call.
const TURN_TIMEOUT: Duration = Duration::from_secs(10);

// POST /webhook - one conversational turn
pub async fn handle_webhook<S: RowStore + ?Sized>(
    State(store): State<Arc<S>>,
    Json(request): Json<WebhookRequest>,
) -> Json<WebhookResponse> {
    info!(
        "Handling turn: intent={:?} session={} response_id={}",
        request.query_result.intent.display_name, request.session, request.response_id
    );

    let turn = flow::handle_turn(store.as_ref(), &request);
    match tokio::time::timeout(TURN_TIMEOUT, turn).await {
        Ok(Ok(response)) => Json(response),
        Ok(Err(err)) => {
            error!("Turn failed for session {}: {}", request.session, err);
            Json(fallback_response(&err))
        }
        Err(_) => {
            let err = ServiceError::Timeout(format!("turn exceeded {:?}", TURN_TIMEOUT));
            error!("Turn timed out for session {}", request.session);
            Json(fallback_response(&err))
        }
    }
}

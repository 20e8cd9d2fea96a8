use serde_json::json;

use rsvper_shared::error::ServiceError;
use rsvper_shared::models::dialogflow::WebhookResponse;
use rsvper_shared::models::SubEvent;
use rsvper_shared::test_utils::test_logging::init_test_logging;

use super::{answered_context, invite_context, parse_request, seeded_store, webhook_payload};
use crate::flow::{self, route_intent, TurnAction};
use crate::ledger::UPDATE_EVENT_TABLE;

#[test]
fn intent_table_routes_names_and_aliases() {
    assert_eq!(route_intent("welcome.invite.code"), Some(TurnAction::Welcome));
    assert_eq!(
        route_intent("Default Welcome Intent - invite code"),
        Some(TurnAction::Welcome)
    );
    assert_eq!(
        route_intent("welcome.invite.code.confirm"),
        Some(TurnAction::WelcomeConfirm)
    );
    assert_eq!(
        route_intent("rsvper.garba.rsvp"),
        Some(TurnAction::Rsvp(SubEvent::Garba))
    );
    assert_eq!(
        route_intent("rsvper.wedding"),
        Some(TurnAction::Rsvp(SubEvent::Wedding))
    );
    // Matching is case-sensitive and exact.
    assert_eq!(route_intent("WELCOME.INVITE.CODE"), None);
    assert_eq!(route_intent("rsvper"), None);
}

#[tokio::test]
async fn welcome_summarizes_invited_events_and_asks_about_the_first() {
    init_test_logging();
    let store = seeded_store();
    let request = parse_request(webhook_payload(
        "welcome.invite.code",
        json!({"inviteCode": 2, "inviteCode.original": "2"}),
        json!([]),
    ));

    let response = flow::handle_turn(&store, &request).await.unwrap();

    let text = response.fulfillment_text.unwrap();
    assert!(text.contains("Ravi"));
    assert!(text.contains("Vidhi (5 invited)"));
    assert!(text.contains("Wedding (3 invited)"));
    assert!(!text.contains("Garba"));
    assert_eq!(response.followup_event_input.unwrap().name, "VIDHI_RSVP");
}

#[tokio::test]
async fn welcome_accepts_string_slot_values() {
    init_test_logging();
    let store = seeded_store();
    let request = parse_request(webhook_payload(
        "welcome.invite.code",
        json!({"inviteCode": "2"}),
        json!([]),
    ));

    let response = flow::handle_turn(&store, &request).await.unwrap();
    assert_eq!(response.followup_event_input.unwrap().name, "VIDHI_RSVP");
}

#[tokio::test]
async fn welcome_names_the_unsized_whole_family_invitation() {
    init_test_logging();
    let store = seeded_store();
    let request = parse_request(webhook_payload(
        "welcome.invite.code",
        json!({"inviteCode": 300}),
        json!([]),
    ));

    let response = flow::handle_turn(&store, &request).await.unwrap();

    let text = response.fulfillment_text.unwrap();
    assert!(text.contains("Wedding (the whole family)"));
    assert_eq!(response.followup_event_input.unwrap().name, "WEDDING_RSVP");
}

#[tokio::test]
async fn welcome_with_nothing_invited_ends_without_followup() {
    init_test_logging();
    let store = seeded_store();
    let request = parse_request(webhook_payload(
        "welcome.invite.code",
        json!({"inviteCode": 3}),
        json!([]),
    ));

    let response = flow::handle_turn(&store, &request).await.unwrap();

    assert!(response.fulfillment_text.is_some());
    assert!(response.followup_event_input.is_none());
}

#[tokio::test]
async fn welcome_without_code_is_an_extraction_error() {
    init_test_logging();
    let store = seeded_store();
    let request = parse_request(webhook_payload("welcome.invite.code", json!({}), json!([])));

    assert!(matches!(
        flow::handle_turn(&store, &request).await,
        Err(ServiceError::Extraction(_))
    ));
}

#[tokio::test]
async fn confirm_emits_the_first_followup_and_no_text() {
    init_test_logging();
    let store = seeded_store();
    let request = parse_request(webhook_payload(
        "welcome.invite.code.confirm",
        json!({}),
        json!([invite_context(2)]),
    ));

    let response = flow::handle_turn(&store, &request).await.unwrap();

    assert!(response.fulfillment_text.is_none());
    assert_eq!(response.followup_event_input.unwrap().name, "VIDHI_RSVP");
}

#[tokio::test]
async fn confirm_without_context_code_is_an_extraction_error() {
    init_test_logging();
    let store = seeded_store();
    let request = parse_request(webhook_payload(
        "welcome.invite.code.confirm",
        json!({}),
        json!([]),
    ));

    assert!(matches!(
        flow::handle_turn(&store, &request).await,
        Err(ServiceError::Extraction(_))
    ));
}

#[tokio::test]
async fn answer_is_recorded_and_the_zero_invited_event_is_skipped() {
    init_test_logging();
    let store = seeded_store();
    // Family 2 is invited to Vidhi and Wedding only; answering Vidhi must
    // steer to Wedding, not Garba.
    let request = parse_request(webhook_payload(
        "rsvper.vidhi",
        json!({"vidhiRsvpdInvitees": 5, "vidhiRsvpdInvitees.original": "5"}),
        json!([invite_context(2)]),
    ));

    let response = flow::handle_turn(&store, &request).await.unwrap();

    assert!(response.fulfillment_text.is_none());
    assert_eq!(response.followup_event_input.unwrap().name, "WEDDING_RSVP");

    let appended = store.appended_rows(UPDATE_EVENT_TABLE);
    assert_eq!(appended.len(), 1);
    assert_eq!(appended[0][0], json!(2));
    assert_eq!(appended[0][1], json!("555"));
    assert_eq!(appended[0][2], json!("VIDHI"));
    assert_eq!(appended[0][3], json!(5));

    let updates = store.cell_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].range, "INVITED_FAMILY!F3");
    assert_eq!(updates[0].rows, vec![vec![json!(5)]]);
}

#[tokio::test]
async fn final_answer_produces_a_completion_summary() {
    init_test_logging();
    let store = seeded_store();
    // Vidhi was answered on an earlier turn and lives in the platform's
    // rsvp context; Wedding is the last open question for family 2.
    let request = parse_request(webhook_payload(
        "rsvper.wedding",
        json!({"weddingRsvpdInvitees": 3}),
        json!([
            invite_context(2),
            answered_context(json!({
                "vidhiRsvpdInvitees": 5,
                "vidhiRsvpdInvitees.original": "5"
            }))
        ]),
    ));

    let response = flow::handle_turn(&store, &request).await.unwrap();

    assert!(response.followup_event_input.is_none());
    let text = response.fulfillment_text.unwrap();
    assert!(text.contains("Vidhi: 5"));
    assert!(text.contains("Wedding: 3"));
    assert!(!text.contains("Garba"));
}

#[tokio::test]
async fn first_context_wins_for_duplicated_keys() {
    init_test_logging();
    let store = seeded_store();
    // Both contexts carry an invite code; the one supplied first is used.
    let request = parse_request(webhook_payload(
        "welcome.invite.code.confirm",
        json!({}),
        json!([invite_context(2), invite_context(300)]),
    ));

    let response = flow::handle_turn(&store, &request).await.unwrap();
    assert_eq!(response.followup_event_input.unwrap().name, "VIDHI_RSVP");
}

#[tokio::test]
async fn answer_without_count_is_an_extraction_error() {
    init_test_logging();
    let store = seeded_store();
    let request = parse_request(webhook_payload(
        "rsvper.vidhi",
        json!({"vidhiRsvpdInvitees.original": "five"}),
        json!([invite_context(2)]),
    ));

    assert!(matches!(
        flow::handle_turn(&store, &request).await,
        Err(ServiceError::Extraction(_))
    ));
    assert!(store.appended_rows(UPDATE_EVENT_TABLE).is_empty());
}

#[tokio::test]
async fn over_capacity_answer_is_allowed_and_recorded() {
    init_test_logging();
    let store = seeded_store();
    let request = parse_request(webhook_payload(
        "rsvper.vidhi",
        json!({"vidhiRsvpdInvitees": 12}),
        json!([invite_context(2)]),
    ));

    let response = flow::handle_turn(&store, &request).await.unwrap();

    assert_eq!(response.followup_event_input.unwrap().name, "WEDDING_RSVP");
    assert_eq!(store.cell_updates()[0].rows, vec![vec![json!(12)]]);
}

#[tokio::test]
async fn unrecognized_intent_returns_the_empty_acknowledgement() {
    init_test_logging();
    let store = seeded_store();
    let request = parse_request(webhook_payload("smalltalk.hello", json!({}), json!([])));

    let response = flow::handle_turn(&store, &request).await.unwrap();
    assert_eq!(response, WebhookResponse::default());
    assert!(store.appended_rows(UPDATE_EVENT_TABLE).is_empty());
}

//! The conversation state machine: routes the platform's intent to a handler,
//! decides what to say back, and picks the follow-up event that keeps the
//! conversation moving.

use log::{info, warn};
use std::collections::BTreeMap;

use rsvper_shared::error::{Result, ServiceError};
use rsvper_shared::models::dialogflow::{WebhookRequest, WebhookResponse};
use rsvper_shared::models::{InvitedFamily, SubEvent, ENTIRE_FAMILY};
use rsvper_shared::store::RowStore;

use crate::directory;
use crate::ledger;
use crate::respond;

pub mod context;

use context::{find_count_param, ConversationContext, INVITE_CODE_TOKEN};

/// What a routed intent asks the state machine to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnAction {
    Welcome,
    WelcomeConfirm,
    Rsvp(SubEvent),
}

/// Intent display names and their aliases, collapsed to one action each.
/// Matching is exact and case-sensitive, as the platform sends them.
const INTENT_TABLE: &[(&str, TurnAction)] = &[
    ("welcome.invite.code", TurnAction::Welcome),
    ("Default Welcome Intent - invite code", TurnAction::Welcome),
    ("welcome.invite.code.confirm", TurnAction::WelcomeConfirm),
    (
        "Default Welcome Intent - invite code - yes",
        TurnAction::WelcomeConfirm,
    ),
    ("rsvper.vidhi", TurnAction::Rsvp(SubEvent::Vidhi)),
    ("rsvper.vidhi.rsvp", TurnAction::Rsvp(SubEvent::Vidhi)),
    ("rsvper.garba", TurnAction::Rsvp(SubEvent::Garba)),
    ("rsvper.garba.rsvp", TurnAction::Rsvp(SubEvent::Garba)),
    ("rsvper.wedding", TurnAction::Rsvp(SubEvent::Wedding)),
    ("rsvper.wedding.rsvp", TurnAction::Rsvp(SubEvent::Wedding)),
];

pub fn route_intent(display_name: &str) -> Option<TurnAction> {
    INTENT_TABLE
        .iter()
        .find(|(name, _)| *name == display_name)
        .map(|(_, action)| *action)
}

/// Handles one conversational turn end to end.
pub async fn handle_turn<S: RowStore + ?Sized>(
    store: &S,
    request: &WebhookRequest,
) -> Result<WebhookResponse> {
    let intent_name = &request.query_result.intent.display_name;
    let Some(action) = route_intent(intent_name) else {
        warn!("Unrecognized intent: {:?}", intent_name);
        return Ok(respond::compose(None, None));
    };

    let ctx = ConversationContext::from_request(request);
    match action {
        TurnAction::Welcome => welcome(store, request).await,
        TurnAction::WelcomeConfirm => welcome_confirm(store, &ctx).await,
        TurnAction::Rsvp(event) => rsvp(store, request, &ctx, event).await,
    }
}

/// First turn: the guest just told us their invite code. Greets them with a
/// summary of what they're invited to and steers toward the first question.
async fn welcome<S: RowStore + ?Sized>(
    store: &S,
    request: &WebhookRequest,
) -> Result<WebhookResponse> {
    let invite_code = find_count_param(&request.query_result.parameters, INVITE_CODE_TOKEN)
        .ok_or_else(|| {
            ServiceError::Extraction("welcome turn carries no invite code parameter".to_string())
        })?;

    let family_row = directory::find_by_invite_code(store, invite_code).await?;
    let family = &family_row.family;

    let invited: Vec<SubEvent> = SubEvent::ALL
        .into_iter()
        .filter(|event| family.is_invited(*event))
        .collect();

    if invited.is_empty() {
        info!("Invite code {} has no invited sub-events", invite_code);
        let message = format!(
            "Hi {}! It doesn't look like any events are attached to your invitation. \
             Please reach out to the hosts directly.",
            family.display_name
        );
        return Ok(respond::compose(Some(message), None));
    }

    let summary = invitation_summary(family, &invited);
    Ok(respond::compose(
        Some(summary),
        Some(invited[0].followup_event()),
    ))
}

/// The guest confirmed the looked-up invitation; jump straight to the first
/// eligible question without repeating the summary.
async fn welcome_confirm<S: RowStore + ?Sized>(
    store: &S,
    ctx: &ConversationContext,
) -> Result<WebhookResponse> {
    let invite_code = ctx.invite_code.ok_or_else(|| {
        ServiceError::Extraction("no invite code in any supplied context".to_string())
    })?;

    let family_row = directory::find_by_invite_code(store, invite_code).await?;
    let followup = family_row
        .family
        .first_invited()
        .map(|event| event.followup_event());
    Ok(respond::compose(None, followup))
}

/// An answer for one sub-event: record it, then either move to the next
/// unanswered sub-event or wrap up.
async fn rsvp<S: RowStore + ?Sized>(
    store: &S,
    request: &WebhookRequest,
    ctx: &ConversationContext,
    event: SubEvent,
) -> Result<WebhookResponse> {
    let invite_code = ctx.invite_code.ok_or_else(|| {
        ServiceError::Extraction(format!("no invite code in context for {} answer", event.name()))
    })?;
    let attendees = context::rsvp_count(&request.query_result.parameters, event).ok_or_else(|| {
        ServiceError::Extraction(format!("no {} answer count in parameters", event.name()))
    })?;
    let phone_number = ctx.phone_number.clone().unwrap_or_default();

    info!(
        "Recording {} attendee(s) for {} on invite code {}",
        attendees,
        event.name(),
        invite_code
    );
    let rsvps = BTreeMap::from([(event, attendees)]);
    ledger::record_answer(
        store,
        invite_code,
        &phone_number,
        &rsvps,
        &ctx.session_id,
        &ctx.response_id,
    )
    .await?;

    let mut answered = ctx.answered.clone();
    answered.insert(event, attendees);

    let family_row = directory::find_by_invite_code(store, invite_code).await?;
    let family = &family_row.family;

    let allotted = family.invited(event);
    if allotted != ENTIRE_FAMILY && attendees > allotted {
        warn!(
            "Invite code {} answered {} for {} but only {} were invited",
            invite_code,
            attendees,
            event.name(),
            allotted
        );
    }

    let next = SubEvent::ALL.into_iter().find(|candidate| {
        *candidate != event && family.is_invited(*candidate) && !answered.contains_key(candidate)
    });
    match next {
        Some(next_event) => Ok(respond::compose(None, Some(next_event.followup_event()))),
        None => Ok(respond::compose(Some(completion_summary(&answered)), None)),
    }
}

fn invitation_summary(family: &InvitedFamily, invited: &[SubEvent]) -> String {
    let parts: Vec<String> = invited
        .iter()
        .map(|event| match family.invited(*event) {
            ENTIRE_FAMILY => format!("{} (the whole family)", event.display_name()),
            count => format!("{} ({} invited)", event.display_name(), count),
        })
        .collect();
    format!(
        "Hi {}! You're invited to: {}. Let's get your RSVPs down one event at a time.",
        family.display_name,
        parts.join(", ")
    )
}

fn completion_summary(answered: &BTreeMap<SubEvent, i64>) -> String {
    let parts: Vec<String> = SubEvent::ALL
        .into_iter()
        .filter_map(|event| {
            answered
                .get(&event)
                .map(|count| format!("{}: {}", event.display_name(), count))
        })
        .collect();
    format!(
        "Great -- I've got all your RSVPs down ({}). See you at the wedding!! <3",
        parts.join(", ")
    )
}

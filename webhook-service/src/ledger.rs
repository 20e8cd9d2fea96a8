use log::{error, info, warn};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::future::Future;

use rsvper_shared::error::{Result, ServiceError};
use rsvper_shared::models::{now_str, SubEvent};
use rsvper_shared::store::{CellUpdate, RowStore};

use crate::directory::{self, INVITED_FAMILY_TABLE};

pub const UPDATE_EVENT_TABLE: &str = "UPDATE_EVENT";

/// Records confirmed answers: one audit row per sub-event in the events log,
/// then the matching rsvpd cells on the family sheet. The two writes are not
/// atomic; the audit log is appended first and stays authoritative if the
/// cell update fails.
pub async fn record_answer<S: RowStore + ?Sized>(
    store: &S,
    invite_code: i64,
    phone_number: &str,
    rsvps: &BTreeMap<SubEvent, i64>,
    session_id: &str,
    response_id: &str,
) -> Result<()> {
    let rows: Vec<Vec<Value>> = rsvps
        .iter()
        .map(|(event, attendees)| {
            vec![
                json!(invite_code),
                json!(phone_number),
                json!(event.name()),
                json!(attendees),
                json!(now_str()),
                json!(session_id),
                json!(response_id),
            ]
        })
        .collect();

    with_one_retry("append update event", || {
        store.append(UPDATE_EVENT_TABLE, rows.clone())
    })
    .await?;
    info!(
        "Appended {} update event row(s) for invite code {}",
        rows.len(),
        invite_code
    );

    let family_row = directory::find_by_invite_code(store, invite_code).await?;
    let updates: Vec<CellUpdate> = rsvps
        .iter()
        .map(|(event, attendees)| {
            CellUpdate::cell(
                INVITED_FAMILY_TABLE,
                event.rsvpd_col(),
                family_row.row_number,
                json!(attendees),
            )
        })
        .collect();

    if let Err(err) = with_one_retry("update family rsvp cells", || {
        store.batch_update(updates.clone())
    })
    .await
    {
        // The audit append already landed, so the two sheets now disagree
        // until someone reconciles them from the events log.
        error!(
            "Update event rows for invite code {} were appended but the family row {} update failed: {}",
            invite_code, family_row.row_number, err
        );
        return Err(err);
    }
    info!(
        "Updated rsvpd cells on row {} for invite code {}",
        family_row.row_number, invite_code
    );
    Ok(())
}

async fn with_one_retry<F, Fut>(operation: &str, mut call: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    match call().await {
        Ok(()) => Ok(()),
        Err(first) => {
            warn!("{} failed, retrying once: {}", operation, first);
            call().await.map_err(|retry| {
                ServiceError::StoreWrite(format!("{} failed after retry: {}", operation, retry))
            })
        }
    }
}

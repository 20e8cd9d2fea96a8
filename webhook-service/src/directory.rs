use log::warn;
use serde_json::Value;

use rsvper_shared::error::{Result, ServiceError};
use rsvper_shared::models::{cell_to_number, InvitedFamily};
use rsvper_shared::store::RowStore;

pub const INVITED_FAMILY_TABLE: &str = "INVITED_FAMILY";

/// Row bound for the fallback scan; the sheet is pre-seeded and never grows
/// past this.
pub const MAX_INVITED_FAMILY_ROWS: usize = 240;

/// Sheet column (0-indexed) holding the invite code.
const INVITE_CODE_COL: usize = 3;
/// Row 1 is the header, so an invite code's natural row is `code + 1`.
const HEADER_ROWS: i64 = 1;

/// A family together with the sheet row it lives on.
#[derive(Clone, Debug, PartialEq)]
pub struct FamilyRow {
    pub row_number: usize,
    pub family: InvitedFamily,
}

/// Resolves an invite code to its family row. Rows are normally ordered by
/// invite code, so the row at `code + 1` is tried first; families that moved
/// are found by a bounded scan of the whole table.
pub async fn find_by_invite_code<S: RowStore + ?Sized>(
    store: &S,
    invite_code: i64,
) -> Result<FamilyRow> {
    if invite_code > 0 && invite_code + HEADER_ROWS <= MAX_INVITED_FAMILY_ROWS as i64 {
        let row_number = (invite_code + HEADER_ROWS) as usize;
        let range = format!("A{}:J{}", row_number, row_number);
        let rows = store.get(INVITED_FAMILY_TABLE, &range).await?;
        if let Some(row) = rows.first() {
            if code_of(row) == Some(invite_code) {
                return Ok(FamilyRow {
                    row_number,
                    family: InvitedFamily::from_row(row)?,
                });
            }
        }
    }

    search_for_invited_family(store, invite_code).await
}

async fn search_for_invited_family<S: RowStore + ?Sized>(
    store: &S,
    invite_code: i64,
) -> Result<FamilyRow> {
    let range = format!("A2:J{}", MAX_INVITED_FAMILY_ROWS);
    let rows = store.get(INVITED_FAMILY_TABLE, &range).await?;

    for (i, row) in rows.iter().enumerate() {
        if row.len() <= INVITE_CODE_COL {
            continue;
        }
        match code_of(row) {
            Some(code) if code == invite_code => {
                return Ok(FamilyRow {
                    row_number: 2 + i,
                    family: InvitedFamily::from_row(row)?,
                });
            }
            Some(_) => {}
            None => warn!("Invite code cell in sheet row {} is not a number", 2 + i),
        }
    }

    Err(ServiceError::NotFound(format!(
        "no family row for invite code {}",
        invite_code
    )))
}

fn code_of(row: &[Value]) -> Option<i64> {
    row.get(INVITE_CODE_COL)
        .and_then(|cell| cell_to_number(cell).ok())
}

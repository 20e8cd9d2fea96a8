use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ServiceError};

pub mod dialogflow;

/// Sentinel meaning "the whole family is invited, headcount unknown".
pub const ENTIRE_FAMILY: i64 = 999;

/// Invited-count cell marking a sub-event the family is not invited to.
pub const NOT_INVITED_CELL: &str = "NULL";
/// Invited-count cell marking an unsized whole-family invitation.
pub const ENTIRE_FAMILY_CELL: &str = "ALL";

/// The three occasions a family RSVPs for, in the order the bot walks
/// through them.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubEvent {
    Vidhi,
    Garba,
    Wedding,
}

impl SubEvent {
    pub const ALL: [SubEvent; 3] = [SubEvent::Vidhi, SubEvent::Garba, SubEvent::Wedding];

    /// Canonical name, as written into the events log.
    pub fn name(&self) -> &'static str {
        match self {
            SubEvent::Vidhi => "VIDHI",
            SubEvent::Garba => "GARBA",
            SubEvent::Wedding => "WEDDING",
        }
    }

    /// Human form used in fulfillment text.
    pub fn display_name(&self) -> &'static str {
        match self {
            SubEvent::Vidhi => "Vidhi",
            SubEvent::Garba => "Garba",
            SubEvent::Wedding => "Wedding",
        }
    }

    /// Sheet column holding the invited headcount.
    pub fn invited_col(&self) -> &'static str {
        match self {
            SubEvent::Vidhi => "E",
            SubEvent::Garba => "G",
            SubEvent::Wedding => "I",
        }
    }

    /// Sheet column the ledger writes the rsvpd headcount into.
    pub fn rsvpd_col(&self) -> &'static str {
        match self {
            SubEvent::Vidhi => "F",
            SubEvent::Garba => "H",
            SubEvent::Wedding => "J",
        }
    }

    /// Dialogflow event that moves the conversation to this occasion's
    /// question.
    pub fn followup_event(&self) -> &'static str {
        match self {
            SubEvent::Vidhi => "VIDHI_RSVP",
            SubEvent::Garba => "GARBA_RSVP",
            SubEvent::Wedding => "WEDDING_RSVP",
        }
    }

    fn index(&self) -> usize {
        match self {
            SubEvent::Vidhi => 0,
            SubEvent::Garba => 1,
            SubEvent::Wedding => 2,
        }
    }
}

/// One pre-seeded row of the invited-family sheet, columns A through J.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct InvitedFamily {
    pub origin: String,
    #[serde(rename = "familyName")]
    pub family_name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "inviteCode")]
    pub invite_code: i64,
    invited: [i64; 3],
    rsvpd: [i64; 3],
}

impl InvitedFamily {
    /// Parses a sheet row. Trailing cells the sheet truncated are treated as
    /// empty, which converts to zero.
    pub fn from_row(row: &[Value]) -> Result<Self> {
        let code_cell = row
            .get(3)
            .ok_or_else(|| ServiceError::Lookup("row has no invite code column".to_string()))?;
        let invite_code = cell_to_number(code_cell)?;

        let mut invited = [0i64; 3];
        let mut rsvpd = [0i64; 3];
        for event in SubEvent::ALL {
            let i = event.index();
            invited[i] = match row.get(4 + 2 * i) {
                Some(cell) => cell_to_number(cell)?,
                None => 0,
            };
            rsvpd[i] = match row.get(5 + 2 * i) {
                Some(cell) => cell_to_number(cell)?,
                None => 0,
            };
        }

        Ok(Self {
            origin: cell_to_string(row.first()),
            family_name: cell_to_string(row.get(1)),
            display_name: cell_to_string(row.get(2)),
            invite_code,
            invited,
            rsvpd,
        })
    }

    /// Invited headcount for one sub-event; zero means not invited,
    /// [`ENTIRE_FAMILY`] means unsized.
    pub fn invited(&self, event: SubEvent) -> i64 {
        self.invited[event.index()]
    }

    /// Last recorded RSVP headcount for one sub-event.
    pub fn rsvpd(&self, event: SubEvent) -> i64 {
        self.rsvpd[event.index()]
    }

    pub fn is_invited(&self, event: SubEvent) -> bool {
        self.invited(event) > 0
    }

    /// First sub-event (in bot order) the family is invited to.
    pub fn first_invited(&self) -> Option<SubEvent> {
        SubEvent::ALL.into_iter().find(|event| self.is_invited(*event))
    }
}

/// Converts one sheet cell to a headcount. The sheet mixes plain numbers with
/// the `NULL` / `ALL` markers, and the API returns numbers as strings or JSON
/// numbers depending on cell formatting.
pub fn cell_to_number(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| ServiceError::Lookup(format!("cell {} is out of range", n))),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NOT_INVITED_CELL) {
                Ok(0)
            } else if trimmed.eq_ignore_ascii_case(ENTIRE_FAMILY_CELL) {
                Ok(ENTIRE_FAMILY)
            } else {
                trimmed.parse::<i64>().map_err(|err| {
                    ServiceError::Lookup(format!("cell {:?} is not a number: {}", s, err))
                })
            }
        }
        other => Err(ServiceError::Lookup(format!("cell {} is not a number", other))),
    }
}

fn cell_to_string(cell: Option<&Value>) -> String {
    match cell {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

// Helper function to get current timestamp as string
pub fn now_str() -> String {
    Utc::now().to_rfc3339()
}

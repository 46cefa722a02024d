//! Who is calling, and what they may do.
//!
//! Participants act only for the role their seat holds in the current
//! turn. The facilitator and the system (bots, the orchestrator, the
//! scheduler) may act for either role. Overrides such as unlocking a slot
//! or ending a match early are reserved for the facilitator.

use serde::{Deserialize, Serialize};

use crate::core::{MatchRecord, ParticipantId, Role};
use crate::error::{EngineError, EngineResult};

/// Authorization context for an engine call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Caller {
    Participant(ParticipantId),
    Facilitator,
    System,
}

impl Caller {
    /// Fail with `Forbidden` unless the caller is the facilitator.
    pub fn require_facilitator(&self, action: &'static str) -> EngineResult<()> {
        match self {
            Caller::Facilitator => Ok(()),
            other => Err(EngineError::Forbidden {
                caller: other.to_string(),
                action,
            }),
        }
    }

    /// Fail with `Forbidden` unless the caller may submit for `role` in
    /// the record's current turn.
    pub fn require_role(&self, record: &MatchRecord, role: Role) -> EngineResult<()> {
        match self {
            Caller::Facilitator | Caller::System => Ok(()),
            Caller::Participant(id) => match record.seat_of(*id) {
                Some(seat) if record.role_of(seat) == role => Ok(()),
                Some(_) => Err(EngineError::Forbidden {
                    caller: self.to_string(),
                    action: "submit for the opposing role",
                }),
                None => Err(EngineError::Forbidden {
                    caller: self.to_string(),
                    action: "act in a match they do not play",
                }),
            },
        }
    }
}

impl std::fmt::Display for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Caller::Participant(id) => write!(f, "{id}"),
            Caller::Facilitator => write!(f, "facilitator"),
            Caller::System => write!(f, "system"),
        }
    }
}

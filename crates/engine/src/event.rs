use state_machine::{Phase, TransitionCause};
use structure::{BreakConfirmationEvent, BreakOfStructureEvent, RetestEvent};
use uuid::Uuid;

use crate::error::SignalError;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Transition {
        from: Phase,
        cause: TransitionCause,
        to: Phase,
    },
    BreakDetected(BreakOfStructureEvent),
    BreakConfirmed(BreakConfirmationEvent),
    RetestConfirmed(RetestEvent),
    Rejected(SignalError),
    SignalEmitted {
        id: Uuid,
    },
    Log(String),
}

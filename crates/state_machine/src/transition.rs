use crate::cause::TransitionCause;
use crate::state::Phase;

#[derive(Debug, PartialEq, Eq)]
pub enum TransitionError {
    IllegalTransition { from: Phase, cause: TransitionCause },
}

pub fn transition(state: Phase, cause: TransitionCause) -> Result<Phase, TransitionError> {
    let next = match (state, cause) {
        // --- Abort: из любой фазы ------------------------------------------
        (_, TransitionCause::Abort) => Phase::Idle,

        // --- Idle -----------------------------------------------------------
        (Phase::Idle, TransitionCause::StructureBroken) => Phase::StructureBreakDetected,

        // --- Structure break detected ---------------------------------------
        (Phase::StructureBreakDetected, TransitionCause::BreakConfirmed) => Phase::BreakConfirmed,

        // --- Break confirmed ------------------------------------------------
        (Phase::BreakConfirmed, TransitionCause::RetestConfirmed) => Phase::RetestConfirmed,

        // --- Retest confirmed -----------------------------------------------
        (Phase::RetestConfirmed, TransitionCause::EntryComputed) => Phase::ReadyForEntry,
        (Phase::RetestConfirmed, TransitionCause::RiskRejected) => Phase::Idle,

        // --- In-flight failures ---------------------------------------------
        (
            Phase::StructureBreakDetected | Phase::BreakConfirmed | Phase::RetestConfirmed,
            TransitionCause::PhaseTimedOut | TransitionCause::ContradictingStructure,
        ) => Phase::Idle,

        // --- Ready for entry ------------------------------------------------
        (
            Phase::ReadyForEntry,
            TransitionCause::SignalEmitted | TransitionCause::Acknowledged | TransitionCause::AckTimedOut,
        ) => Phase::Idle,

        // --- Illegal --------------------------------------------------------
        _ => return Err(TransitionError::IllegalTransition { from: state, cause }),
    };

    Ok(next)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransitionCause {
    // Signal lifecycle
    StructureBroken,
    BreakConfirmed,
    RetestConfirmed,
    EntryComputed,

    // Handoff
    SignalEmitted,
    Acknowledged,
    AckTimedOut,

    // Failures
    PhaseTimedOut,
    RiskRejected,
    ContradictingStructure,
    Abort,
}

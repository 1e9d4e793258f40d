use serde::{Deserialize, Serialize};

/// Фаза сигнала. Строго последовательно, без пропусков.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    StructureBreakDetected,
    BreakConfirmed,
    RetestConfirmed,
    ReadyForEntry,
}

impl Phase {
    /// Есть незавершённый сигнал (до ReadyForEntry)
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            Phase::StructureBreakDetected | Phase::BreakConfirmed | Phase::RetestConfirmed
        )
    }
}

use core_types::{Direction, Increments, Price, TimestampMs};
use policy::{EntryTrigger, PositionSizeResult};
use serde::{Deserialize, Serialize};
use state_machine::Phase;
use structure::{BreakConfirmationEvent, BreakOfStructureEvent, RetestEvent};
use uuid::Uuid;

/// Готовый сигнал для внешнего исполнителя. Отдаётся только целиком.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    pub symbol: String,
    pub direction: Direction,
    pub phase: Phase,
    pub structure_break: BreakOfStructureEvent,
    pub confirmation: BreakConfirmationEvent,
    pub retest: RetestEvent,
    pub entry: EntryTrigger,
    pub stop_price: Price,
    pub atr: Increments,
    pub position: PositionSizeResult,
    pub emitted_at: TimestampMs,
}

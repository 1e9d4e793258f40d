pub mod atr;
pub mod bos;
pub mod candle;
pub mod confirm;
pub mod pivot;
pub mod retest;
pub mod structure;

pub use bos::{BosState, BosTracker, BreakOfStructureEvent};
pub use candle::{Candle, Timeframe};
pub use confirm::{BreakConfirmationEvent, confirm_break};
pub use retest::{RetestEvent, RetestParams, validate_retest};
pub use structure::{MarketStructure, StructureParams, StructureSnapshot, SwingKind, SwingPoint};

pub mod entry;
pub mod instrument;
pub mod sizing;

pub use entry::{EntryTrigger, entry_trigger, stop_price};
pub use instrument::{AssetClass, Instrument};
pub use sizing::{PositionSizeResult, RiskError, RiskParameters, size_position};

use core_types::TimestampMs;
use core_types::{Price, Qty};
use serde::{Deserialize, Serialize};

/// Закрытая OHLC свеча. После получения не меняется.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub ts: TimestampMs,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Qty,
}

impl Candle {
    /// Экстремум свечи в сторону движения: high для Bull, low для Bear
    pub fn extreme(&self, direction: core_types::Direction) -> Price {
        match direction {
            core_types::Direction::Bull => self.high,
            core_types::Direction::Bear => self.low,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Min1,
    Min5,
    Min15,
    Hour1,
    Hour4,
}

impl Timeframe {
    pub fn as_millis(self) -> i64 {
        match self {
            Timeframe::Min1 => 60_000,
            Timeframe::Min5 => 5 * 60_000,
            Timeframe::Min15 => 15 * 60_000,
            Timeframe::Hour1 => 60 * 60_000,
            Timeframe::Hour4 => 4 * 60 * 60_000,
        }
    }
}

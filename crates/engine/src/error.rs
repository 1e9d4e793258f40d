use core_types::{Increments, Price, TimestampMs};
use policy::RiskError;
use state_machine::Phase;
use structure::Timeframe;
use thiserror::Error;

/// Ошибки цикла сигнала. Все обрабатываются локально сбросом машины
/// (или отбрасыванием свечи) и наружу не пробрасываются.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("insufficient data: {have} candles, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("out-of-sequence {timeframe:?} candle at {ts:?}, cursor at {cursor:?}")]
    OutOfSequence {
        timeframe: Timeframe,
        ts: TimestampMs,
        cursor: TimestampMs,
    },

    #[error("volatility out of range: ATR {atr} not in [{min}, {max}]")]
    VolatilityOutOfRange {
        atr: Increments,
        min: Increments,
        max: Increments,
    },

    #[error("risk rejected: {0}")]
    RiskRejected(RiskError),

    #[error("phase {phase:?} timed out after {elapsed_ms} ms")]
    PhaseTimeout { phase: Phase, elapsed_ms: i64 },

    #[error("contradicting structure: close {close} back through break level {level}")]
    ContradictingStructure { level: Price, close: Price },
}

impl From<RiskError> for SignalError {
    fn from(e: RiskError) -> Self {
        match e {
            RiskError::VolatilityOutOfRange { atr, min, max } => {
                SignalError::VolatilityOutOfRange { atr, min, max }
            }
            other => SignalError::RiskRejected(other),
        }
    }
}

/// Ошибки поставщика свечей: единственное, что уходит наверх.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("candle feed disconnected")]
    Disconnected,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("signal encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("csv read failed: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

use std::path::Path;
use std::time::Duration;

use core_types::{Increments, Price, Ratio};
use serde::{Deserialize, Serialize};
use structure::{StructureParams, Timeframe};

use crate::error::ConfigError;

/// От какой цены считается вход
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryBase {
    /// Экстремум подтверждающей свечи младшего ТФ
    Confirmation,
    /// Цена ретеста
    Retest,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckMode {
    /// Сброс в Idle сразу после отдачи сигнала
    Immediate,
    /// Ждём подтверждения исполнителя (не дольше ack_timeout_secs)
    AwaitAck,
}

/// Конфигурация движка. Любое поле можно опустить в JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub coarse_timeframe: Timeframe,
    pub fine_timeframe: Timeframe,

    pub swing_lookback: usize,
    pub swing_side_window: usize,
    pub break_buffer_increments: f64,

    pub retest_tolerance_increments: f64,
    pub entry_offset_increments: f64,
    pub entry_base: EntryBase,

    pub atr_period: usize,
    pub atr_min_increments: f64,
    pub atr_max_increments: f64,
    pub stop_atr_multiple: f64,
    pub risk_percent_of_balance: f64,

    pub phase_timeout_secs: u64,
    pub ack_mode: AckMode,
    pub ack_timeout_secs: u64,

    pub poll_interval_ms: u64,
    pub fast_poll_interval_ms: u64,

    /// Сколько свечей младшего ТФ держать в окне
    pub fine_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            coarse_timeframe: Timeframe::Hour1,
            fine_timeframe: Timeframe::Min5,
            swing_lookback: 50,
            swing_side_window: 5,
            break_buffer_increments: 0.0,
            retest_tolerance_increments: 3.0,
            entry_offset_increments: 0.6,
            entry_base: EntryBase::Confirmation,
            atr_period: 14,
            atr_min_increments: 4.0,
            atr_max_increments: 15.0,
            stop_atr_multiple: 1.0,
            risk_percent_of_balance: 0.0055,
            phase_timeout_secs: 900,
            ack_mode: AckMode::Immediate,
            ack_timeout_secs: 30,
            poll_interval_ms: 1_000,
            fast_poll_interval_ms: 250,
            fine_window: 256,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let cfg: EngineConfig = serde_json::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };

        if self.fine_timeframe.as_millis() >= self.coarse_timeframe.as_millis() {
            return invalid(format!(
                "fine timeframe {:?} must be shorter than coarse {:?}",
                self.fine_timeframe, self.coarse_timeframe
            ));
        }
        if self.swing_side_window == 0 {
            return invalid("swing_side_window must be >= 1".into());
        }
        if self.swing_lookback < self.structure_params().min_candles() {
            return invalid(format!(
                "swing_lookback {} too small for side window {} (need >= {})",
                self.swing_lookback,
                self.swing_side_window,
                self.structure_params().min_candles()
            ));
        }
        if !(self.atr_min_increments <= self.atr_max_increments) {
            return invalid(format!(
                "atr_min_increments {} > atr_max_increments {}",
                self.atr_min_increments, self.atr_max_increments
            ));
        }
        if !(self.risk_percent_of_balance > 0.0 && self.risk_percent_of_balance <= 1.0) {
            return invalid(format!(
                "risk_percent_of_balance {} not in (0, 1]",
                self.risk_percent_of_balance
            ));
        }
        if !(self.retest_tolerance_increments >= 0.0)
            || !(self.entry_offset_increments >= 0.0)
            || !(self.break_buffer_increments >= 0.0)
        {
            return invalid("tolerance, offset and buffer must be >= 0".into());
        }
        if !(self.stop_atr_multiple > 0.0) {
            return invalid("stop_atr_multiple must be > 0".into());
        }
        if self.atr_period == 0 || self.fine_window == 0 {
            return invalid("atr_period and fine_window must be >= 1".into());
        }
        if self.phase_timeout_secs == 0 {
            return invalid("phase_timeout_secs must be >= 1".into());
        }

        Ok(())
    }

    pub fn structure_params(&self) -> StructureParams {
        StructureParams {
            lookback: self.swing_lookback,
            side_window: self.swing_side_window,
        }
    }

    /// Окно старшего ТФ: структура + ATR
    pub fn coarse_window(&self) -> usize {
        self.swing_lookback.max(self.atr_period + 1)
    }

    pub fn break_buffer(&self, increment: Price) -> Price {
        Increments(self.break_buffer_increments).to_price_delta(increment)
    }

    pub fn risk_percent(&self) -> Ratio {
        Ratio(self.risk_percent_of_balance)
    }

    pub fn phase_timeout_ms(&self) -> i64 {
        (self.phase_timeout_secs as i64).saturating_mul(1_000)
    }

    pub fn ack_timeout_ms(&self) -> i64 {
        (self.ack_timeout_secs as i64).saturating_mul(1_000)
    }

    pub fn poll_interval(&self, in_flight: bool) -> Duration {
        if in_flight {
            Duration::from_millis(self.fast_poll_interval_ms.max(1))
        } else {
            Duration::from_millis(self.poll_interval_ms.max(1))
        }
    }
}

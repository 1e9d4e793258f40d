use core_types::{Increments, Money, Qty, Ratio};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instrument::Instrument;

/// Внешние параметры риска на одну оценку
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RiskParameters {
    pub account_balance: Money,
    pub risk_percent_of_balance: Ratio,
    pub atr: Increments,
    pub atr_min: Increments,
    pub atr_max: Increments,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSizeResult {
    pub size: Qty,
    pub risk_amount: Money,
    pub stop_distance: Increments,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    #[error("ATR {atr} outside admissible range [{min}, {max}]")]
    VolatilityOutOfRange {
        atr: Increments,
        min: Increments,
        max: Increments,
    },
    #[error("invalid ATR band: min {min} > max {max}")]
    InvalidBand { min: Increments, max: Increments },
    #[error("account balance must be positive, got {0}")]
    InvalidBalance(Money),
    #[error("risk percent must be in (0, 1], got {0:?}")]
    InvalidRiskPercent(Ratio),
    #[error("stop distance must be positive, got {0}")]
    NonPositiveStop(Increments),
    #[error("instrument {0} has no usable increment value or size bounds")]
    InvalidInstrument(String),
    #[error("size {raw:?} below instrument minimum {min:?}: risk would exceed {risk}")]
    BelowMinimumSize { raw: Qty, min: Qty, risk: Money },
}

/// ATR должен лежать в [min, max] включительно. Никакого clamp:
/// вне диапазона сигнал отбрасывается. NaN тоже отбрасывается.
pub fn check_volatility(atr: Increments, min: Increments, max: Increments) -> Result<(), RiskError> {
    if !(min.0 <= max.0) {
        return Err(RiskError::InvalidBand { min, max });
    }

    if !(min.0 <= atr.0 && atr.0 <= max.0) {
        return Err(RiskError::VolatilityOutOfRange { atr, min, max });
    }

    Ok(())
}

/// Стоп выводится из того же ATR
pub fn stop_distance_from_atr(atr: Increments, multiple: f64) -> Increments {
    atr * multiple
}

/// Размер позиции: (balance * risk%) / (stop * стоимость шага),
/// затем шаг лота и границы инструмента. Меньше минимального лота
/// не округляется вверх, а отклоняется.
pub fn size_position(
    params: &RiskParameters,
    stop_distance: Increments,
    instrument: &Instrument,
) -> Result<PositionSizeResult, RiskError> {
    check_volatility(params.atr, params.atr_min, params.atr_max)?;

    if !(params.account_balance.0 > 0.0) || !params.account_balance.0.is_finite() {
        return Err(RiskError::InvalidBalance(params.account_balance));
    }

    let pct = params.risk_percent_of_balance;
    if !(pct.0 > 0.0 && pct.0 <= 1.0) {
        return Err(RiskError::InvalidRiskPercent(pct));
    }

    if !(stop_distance.0 > 0.0) || !stop_distance.0.is_finite() {
        return Err(RiskError::NonPositiveStop(stop_distance));
    }

    if !instrument.is_valid() {
        return Err(RiskError::InvalidInstrument(instrument.symbol.clone()));
    }

    let risk_amount = pct.of(params.account_balance);
    let raw = Qty(risk_amount.0 / (stop_distance.0 * instrument.value_per_increment.0));

    let size = instrument.bound_size(raw).ok_or(RiskError::BelowMinimumSize {
        raw,
        min: instrument.min_size,
        risk: risk_amount,
    })?;

    Ok(PositionSizeResult {
        size,
        risk_amount,
        stop_distance,
    })
}

use core_types::{Direction, Increments, Price, TimestampMs};
use serde::{Deserialize, Serialize};

use crate::candle::Candle;
use crate::confirm::BreakConfirmationEvent;

/// Округление отклонения, чтобы шум f64 не выталкивал ровно-на-границе
/// значения за допуск.
const DEVIATION_SCALE: f64 = 1e6;

/// Параметры ретеста
#[derive(Debug, Copy, Clone)]
pub struct RetestParams {
    pub tolerance: Increments,
    /// Шаг цены инструмента
    pub increment: Price,
}

/// Возврат цены к уровню подтверждения
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetestEvent {
    pub price: Price,
    pub ts: TimestampMs,
    /// Отклонение от цены подтверждения, в шагах цены. |deviation| <= tolerance.
    pub deviation: Increments,
}

/// Первая свеча после подтверждения, вернувшаяся в коридор допуска.
///
/// Bull ждёт откат вниз: проверяется low. Bear ждёт откат вверх: high.
pub fn validate_retest(
    direction: Direction,
    confirmation: &BreakConfirmationEvent,
    candle: &Candle,
    params: RetestParams,
) -> Option<RetestEvent> {
    if candle.ts <= confirmation.ts {
        return None;
    }

    let touch = candle.extreme(direction.opposite());
    let raw = Increments::from_price_delta(touch - confirmation.price, params.increment)?;
    let deviation = Increments((raw.0 * DEVIATION_SCALE).round() / DEVIATION_SCALE);

    if deviation.0.abs() > params.tolerance.0 {
        return None;
    }

    Some(RetestEvent {
        price: touch,
        ts: candle.ts,
        deviation,
    })
}

use core_types::{Direction, Price, TimestampMs};
use serde::{Deserialize, Serialize};

use crate::bos::BreakOfStructureEvent;
use crate::candle::Candle;

/// Подтверждение пробоя на младшем ТФ
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakConfirmationEvent {
    /// Фактический экстремум подтверждающей свечи, а не уровень старшего ТФ
    pub price: Price,
    pub ts: TimestampMs,
}

/// Первая свеча младшего ТФ после BOS, чей экстремум прошёл уровень.
///
/// Цена подтверждения = high (Bull) / low (Bear) этой свечи. Свечи с
/// `ts <= bos.ts` не рассматриваются.
pub fn confirm_break(bos: &BreakOfStructureEvent, candle: &Candle) -> Option<BreakConfirmationEvent> {
    if candle.ts <= bos.ts {
        return None;
    }

    let extreme = candle.extreme(bos.direction);
    let crossed = match bos.direction {
        Direction::Bull => extreme.0 > bos.level.0,
        Direction::Bear => extreme.0 < bos.level.0,
    };

    crossed.then_some(BreakConfirmationEvent {
        price: extreme,
        ts: candle.ts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candle::test_support::hl;
    use crate::structure::MarketStructure;

    fn bos(direction: Direction, level: f64) -> BreakOfStructureEvent {
        BreakOfStructureEvent {
            direction,
            level: Price(level),
            preceding_structure: MarketStructure::Downtrend,
            ts: TimestampMs(100),
            swing_ts: TimestampMs(50),
        }
    }

    #[test]
    fn confirmation_uses_candle_extreme_not_level() {
        let ev = confirm_break(&bos(Direction::Bull, 146.985), &hl(101, 147.000, 146.95)).unwrap();
        assert_eq!(ev.price, Price(147.000));
        assert_eq!(ev.ts, TimestampMs(101));
    }

    #[test]
    fn bear_confirmation_uses_low() {
        let ev = confirm_break(&bos(Direction::Bear, 146.985), &hl(101, 147.05, 146.97)).unwrap();
        assert_eq!(ev.price, Price(146.97));
    }

    #[test]
    fn candle_not_after_bos_is_ignored() {
        assert!(confirm_break(&bos(Direction::Bull, 146.985), &hl(100, 147.5, 146.9)).is_none());
        assert!(confirm_break(&bos(Direction::Bull, 146.985), &hl(99, 147.5, 146.9)).is_none());
    }

    #[test]
    fn touching_level_does_not_confirm() {
        assert!(confirm_break(&bos(Direction::Bull, 146.985), &hl(101, 146.985, 146.9)).is_none());
    }
}

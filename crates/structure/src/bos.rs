use core_types::{Direction, Price, TimestampMs};
use serde::{Deserialize, Serialize};

use crate::candle::Candle;
use crate::pivot::Pivot;
use crate::structure::{MarketStructure, StructureSnapshot};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BosState {
    Watching,
    Detected,
}

/// Пробой структуры на старшем ТФ. Создаётся один раз, не меняется.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakOfStructureEvent {
    pub direction: Direction,
    /// Пробитый swing уровень (поддержка в uptrend / сопротивление в downtrend)
    pub level: Price,
    pub preceding_structure: MarketStructure,
    pub ts: TimestampMs,
    /// Время свечи, сформировавшей swing уровень
    pub swing_ts: TimestampMs,
}

impl BreakOfStructureEvent {
    /// "uptrend death" / "downtrend death"
    pub fn label(&self) -> &'static str {
        match self.direction {
            Direction::Bear => "uptrend death",
            Direction::Bull => "downtrend death",
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct BosParams {
    /// Насколько экстремум должен уйти за уровень (0 = строго за уровень)
    pub buffer: Price,
}

impl Default for BosParams {
    fn default() -> Self {
        Self { buffer: Price(0.0) }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct BosTracker {
    pub state: BosState,
    pub event: Option<BreakOfStructureEvent>,
    /// Swing, пробой которого уже запускал цикл. Повторно не срабатывает.
    consumed: Option<(Direction, TimestampMs)>,
}

impl Default for BosTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BosTracker {
    pub fn new() -> Self {
        Self {
            state: BosState::Watching,
            event: None,
            consumed: None,
        }
    }

    /// Проверить закрытую свечу старшего ТФ.
    ///
    /// Уровень всегда берётся из противоположного свинга: swing low для
    /// uptrend, swing high для downtrend. Только первая подходящая свеча
    /// создаёт событие; дальше трекер молчит до `reset()`.
    pub fn on_candle_close(
        &mut self,
        candle: &Candle,
        snapshot: &StructureSnapshot,
        params: BosParams,
    ) -> Option<BreakOfStructureEvent> {
        if self.state == BosState::Detected {
            return None;
        }

        let (direction, swing) = match snapshot.structure {
            MarketStructure::Uptrend => (Direction::Bear, snapshot.last_low?),
            MarketStructure::Downtrend => (Direction::Bull, snapshot.last_high?),
            MarketStructure::Transition | MarketStructure::Unknown => return None,
        };

        if swing.ts >= candle.ts || self.consumed == Some((direction, swing.ts)) {
            return None;
        }

        if !breaches(candle, direction, &swing, params.buffer) {
            return None;
        }

        let event = BreakOfStructureEvent {
            direction,
            level: swing.price,
            preceding_structure: snapshot.structure,
            ts: candle.ts,
            swing_ts: swing.ts,
        };

        self.state = BosState::Detected;
        self.event = Some(event);
        self.consumed = Some((direction, swing.ts));

        Some(event)
    }

    /// Новый цикл. Уже использованный swing остаётся помеченным.
    pub fn reset(&mut self) {
        self.state = BosState::Watching;
        self.event = None;
    }
}

fn breaches(candle: &Candle, direction: Direction, swing: &Pivot, buffer: Price) -> bool {
    match direction {
        Direction::Bear => candle.low.0 < swing.price.0 - buffer.0,
        Direction::Bull => candle.high.0 > swing.price.0 + buffer.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candle::test_support::hl;
    use crate::pivot::PivotKind;

    fn snapshot(structure: MarketStructure, high: f64, low: f64) -> StructureSnapshot {
        StructureSnapshot {
            structure,
            swings: Vec::new(),
            last_high: Some(Pivot {
                index: 5,
                ts: TimestampMs(5),
                price: Price(high),
                kind: PivotKind::High,
            }),
            last_low: Some(Pivot {
                index: 7,
                ts: TimestampMs(7),
                price: Price(low),
                kind: PivotKind::Low,
            }),
        }
    }

    #[test]
    fn uptrend_support_break_is_bear() {
        let mut t = BosTracker::new();
        let s = snapshot(MarketStructure::Uptrend, 148.0, 146.985);

        let ev = t
            .on_candle_close(&hl(10, 147.2, 146.90), &s, BosParams::default())
            .unwrap();

        assert_eq!(ev.direction, Direction::Bear);
        assert_eq!(ev.level, Price(146.985));
        assert_eq!(ev.label(), "uptrend death");
        assert_eq!(t.state, BosState::Detected);
    }

    #[test]
    fn downtrend_resistance_break_is_bull() {
        let mut t = BosTracker::new();
        let s = snapshot(MarketStructure::Downtrend, 146.985, 146.0);

        let ev = t
            .on_candle_close(&hl(10, 147.0, 146.5), &s, BosParams::default())
            .unwrap();

        assert_eq!(ev.direction, Direction::Bull);
        assert_eq!(ev.level, Price(146.985));
        assert_eq!(ev.preceding_structure, MarketStructure::Downtrend);
    }

    #[test]
    fn uptrend_ignores_resistance_break() {
        // в uptrend пробой вверх не является сломом структуры
        let mut t = BosTracker::new();
        let s = snapshot(MarketStructure::Uptrend, 148.0, 146.0);

        assert!(
            t.on_candle_close(&hl(10, 149.0, 147.0), &s, BosParams::default())
                .is_none()
        );
    }

    #[test]
    fn transition_and_unknown_never_break() {
        let mut t = BosTracker::new();
        for st in [MarketStructure::Transition, MarketStructure::Unknown] {
            let s = snapshot(st, 148.0, 146.0);
            assert!(
                t.on_candle_close(&hl(10, 150.0, 140.0), &s, BosParams::default())
                    .is_none()
            );
        }
    }

    #[test]
    fn only_first_qualifying_candle_fires() {
        let mut t = BosTracker::new();
        let s = snapshot(MarketStructure::Uptrend, 148.0, 146.0);

        assert!(t.on_candle_close(&hl(10, 146.5, 145.5), &s, BosParams::default()).is_some());
        assert!(t.on_candle_close(&hl(11, 146.0, 145.0), &s, BosParams::default()).is_none());
    }

    #[test]
    fn consumed_swing_does_not_refire_after_reset() {
        let mut t = BosTracker::new();
        let s = snapshot(MarketStructure::Uptrend, 148.0, 146.0);

        assert!(t.on_candle_close(&hl(10, 146.5, 145.5), &s, BosParams::default()).is_some());
        t.reset();
        assert!(t.on_candle_close(&hl(11, 146.0, 145.0), &s, BosParams::default()).is_none());

        // новый swing low -> новый цикл
        let mut fresh = snapshot(MarketStructure::Uptrend, 148.0, 145.2);
        fresh.last_low.as_mut().unwrap().ts = TimestampMs(9);
        assert!(t.on_candle_close(&hl(12, 145.5, 145.0), &fresh, BosParams::default()).is_some());
    }

    #[test]
    fn buffer_requires_extra_distance() {
        let mut t = BosTracker::new();
        let s = snapshot(MarketStructure::Uptrend, 148.0, 146.0);
        let params = BosParams { buffer: Price(0.05) };

        assert!(t.on_candle_close(&hl(10, 146.5, 145.97), &s, params).is_none());
        assert!(t.on_candle_close(&hl(11, 146.5, 145.90), &s, params).is_some());
    }
}

#![allow(dead_code)]

use core_types::{Increments, Money, Price, Qty, TimestampMs};
use engine::config::EngineConfig;
use engine::event::EngineEvent;
use engine::machine::{SignalStateMachine, TickInput};
use policy::instrument::{AssetClass, Instrument};
use structure::candle::Candle;

pub const T0: i64 = 1_700_000_000_000;
pub const HOUR: i64 = 3_600_000;
pub const MIN: i64 = 60_000;

/// Пробитый уровень: последний swing high нисходящего тренда
pub const LEVEL: f64 = 146.985;

pub fn candle(ts: i64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        ts: TimestampMs(ts),
        open: Price((high + low) / 2.0),
        high: Price(high),
        low: Price(low),
        close: Price(close),
        volume: Qty(100.0),
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// 30 свечей H1: нисходящий зигзаг, последний swing high (i = 26) ровно на LEVEL
pub fn downtrend() -> Vec<Candle> {
    (0..30)
        .map(|i| {
            let base = LEVEL - 0.25 + 0.02 * (26 - i) as f64;
            let wave = [0.0, 0.1, 0.2, 0.1][i as usize % 4];
            let high = round3(base + wave + 0.05);
            let low = round3(base + wave - 0.05);
            candle(T0 + i * HOUR, high, low, round3(base + wave))
        })
        .collect()
}

/// Свеча H1, пробивающая LEVEL вверх
pub fn break_candle() -> Candle {
    candle(T0 + 30 * HOUR, 147.02, 146.80, 146.99)
}

pub fn break_ts() -> i64 {
    T0 + 30 * HOUR
}

/// M5 после пробоя: без пересечения, подтверждение на 147.000, ретест на 146.99
pub fn fine_no_cross() -> Candle {
    candle(break_ts() + 5 * MIN, 146.95, 146.90, 146.93)
}

pub fn fine_confirm() -> Candle {
    candle(break_ts() + 10 * MIN, 147.000, 146.96, 146.99)
}

pub fn fine_retest() -> Candle {
    candle(break_ts() + 15 * MIN, 147.05, 146.99, 147.03)
}

pub fn config() -> EngineConfig {
    EngineConfig {
        swing_side_window: 2,
        ..EngineConfig::default()
    }
}

pub fn usdjpy() -> Instrument {
    Instrument::preset("USDJPY", AssetClass::FxYen)
}

pub fn machine(config: EngineConfig) -> SignalStateMachine {
    SignalStateMachine::new("USDJPY", config, usdjpy()).expect("valid config")
}

pub fn input(coarse: Vec<Candle>, fine: Vec<Candle>, atr: Option<f64>) -> TickInput {
    let mut t = TickInput::new(Money(100_000.0));
    t.coarse = coarse;
    t.fine = fine;
    t.risk.atr = atr.map(Increments);
    t
}

/// Прогнать историю тренда по одной свече, как это делал бы живой поток
pub fn warm_up(m: &mut SignalStateMachine) {
    for c in downtrend() {
        assert!(m.tick(c.ts, input(vec![c], vec![], None)).is_none());
    }
    m.take_events();
}

pub fn rejections(events: &[EngineEvent]) -> Vec<&engine::SignalError> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Rejected(err) => Some(err),
            _ => None,
        })
        .collect()
}

/// Полный цикл сценария с ATR 10: сигнал на 147.006
pub fn regression_signal() -> engine::Signal {
    let mut m = machine(config());
    warm_up(&mut m);

    let b = break_candle();
    m.tick(b.ts, input(vec![b], vec![], None));

    let mut out = None;
    for c in [fine_no_cross(), fine_confirm(), fine_retest()] {
        if let Some(s) = m.tick(c.ts, input(vec![], vec![c], Some(10.0))) {
            out = Some(s);
        }
    }
    out.expect("scenario emits a signal")
}

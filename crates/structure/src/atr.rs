use core_types::{Increments, Price};

use crate::candle::Candle;

/// True Range для одной свечи
pub fn true_range(prev_close: Price, candle: &Candle) -> Price {
    let hl = candle.high.0 - candle.low.0;
    let hc = (candle.high.0 - prev_close.0).abs();
    let lc = (candle.low.0 - prev_close.0).abs();

    Price(hl.max(hc).max(lc))
}

/// Простая ATR (SMA true range) по последним `period` свечам.
/// Нужна хотя бы `period + 1` свеча (первая даёт prev close).
pub fn atr(candles: &[Candle], period: usize) -> Option<Price> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let window = &candles[candles.len() - period - 1..];
    let sum: f64 = window
        .windows(2)
        .map(|w| true_range(w[0].close, &w[1]).0)
        .sum();

    Some(Price(sum / period as f64))
}

/// ATR в шагах цены инструмента
pub fn atr_in_increments(candles: &[Candle], period: usize, increment: Price) -> Option<Increments> {
    atr(candles, period).and_then(|a| Increments::from_price_delta(a, increment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candle::test_support::hl;

    #[test]
    fn true_range_includes_gap_from_prev_close() {
        let c = hl(1, 101.0, 100.5);
        assert_eq!(true_range(Price(99.0), &c), Price(2.0));
    }

    #[test]
    fn atr_uses_only_last_period() {
        let mut candles = vec![hl(0, 200.0, 100.0)];
        candles.extend((1..=5).map(|i| hl(i, 150.1, 149.9)));

        // 3 последних TR по 0.2, первая широкая свеча вне окна
        let a = atr(&candles, 3).unwrap();
        assert!((a.0 - 0.2).abs() < 1e-9);
        assert!(atr(&candles, 6).is_none());
    }

    #[test]
    fn atr_converts_to_increments() {
        let candles: Vec<_> = (0..15).map(|i| hl(i, 147.05, 146.95)).collect();
        let a = atr_in_increments(&candles, 14, Price(0.01)).unwrap();
        assert!((a.0 - 10.0).abs() < 1e-6);
    }
}

use crate::candle::Candle;
use core_types::{Price, TimestampMs};

/// Тип пивота
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PivotKind {
    High,
    Low,
}

/// Подтверждённый pivot (K свечей с каждой стороны)
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Pivot {
    pub index: usize,
    pub ts: TimestampMs,
    pub price: Price,
    pub kind: PivotKind,
}

/// Проверка: является ли свеча pivot high
pub fn is_pivot_high(candles: &[Candle], i: usize, k: usize) -> bool {
    if k == 0 || i < k || i + k >= candles.len() {
        return false;
    }

    let hi = candles[i].high.0;

    candles[i - k..i].iter().all(|c| c.high.0 < hi)
        && candles[i + 1..=i + k].iter().all(|c| c.high.0 < hi)
}

/// Проверка: является ли свеча pivot low
pub fn is_pivot_low(candles: &[Candle], i: usize, k: usize) -> bool {
    if k == 0 || i < k || i + k >= candles.len() {
        return false;
    }

    let lo = candles[i].low.0;

    candles[i - k..i].iter().all(|c| c.low.0 > lo)
        && candles[i + 1..=i + k].iter().all(|c| c.low.0 > lo)
}

/// Все пивоты окна в хронологическом порядке.
/// Края окна (первые и последние k свечей) пропускаются.
pub fn find_pivots(candles: &[Candle], k: usize) -> Vec<Pivot> {
    let mut out = Vec::new();

    for (i, c) in candles.iter().enumerate() {
        if is_pivot_high(candles, i, k) {
            out.push(Pivot {
                index: i,
                ts: c.ts,
                price: c.high,
                kind: PivotKind::High,
            });
        }
        if is_pivot_low(candles, i, k) {
            out.push(Pivot {
                index: i,
                ts: c.ts,
                price: c.low,
                kind: PivotKind::Low,
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candle::test_support::hl;

    #[test]
    fn peak_with_k_lower_neighbours_is_pivot_high() {
        let candles = vec![
            hl(0, 10.0, 9.0),
            hl(1, 11.0, 10.0),
            hl(2, 12.0, 11.0),
            hl(3, 11.0, 10.0),
            hl(4, 10.0, 9.0),
        ];

        assert!(is_pivot_high(&candles, 2, 2));
        assert!(!is_pivot_high(&candles, 1, 2));
        // края не могут быть пивотами
        assert!(!is_pivot_high(&candles, 0, 2));
        assert!(!is_pivot_high(&candles, 4, 2));
    }

    #[test]
    fn equal_neighbour_blocks_pivot() {
        let candles = vec![
            hl(0, 10.0, 9.0),
            hl(1, 12.0, 10.0),
            hl(2, 12.0, 11.0),
            hl(3, 11.0, 10.0),
            hl(4, 10.0, 9.0),
        ];

        assert!(!is_pivot_high(&candles, 2, 1));
    }

    #[test]
    fn find_pivots_reports_both_kinds_in_order() {
        let candles = vec![
            hl(0, 10.0, 9.0),
            hl(1, 12.0, 11.0),
            hl(2, 10.0, 8.0),
            hl(3, 13.0, 11.0),
            hl(4, 11.0, 10.0),
        ];

        let pivots = find_pivots(&candles, 1);
        let kinds: Vec<_> = pivots.iter().map(|p| (p.index, p.kind)).collect();

        assert_eq!(
            kinds,
            vec![(1, PivotKind::High), (2, PivotKind::Low), (3, PivotKind::High)]
        );
    }
}

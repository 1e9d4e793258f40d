use core_types::{Price, TimestampMs};
use serde::{Deserialize, Serialize};

use crate::candle::Candle;
use crate::pivot::{Pivot, PivotKind, find_pivots};

/// Минимум свинг-хаёв и свинг-лоёв для классификации
pub const MIN_SWINGS: usize = 3;

/// Параметры структуры
#[derive(Debug, Copy, Clone)]
pub struct StructureParams {
    pub lookback: usize,    // окно анализа, например 50
    pub side_window: usize, // K свечей с каждой стороны пивота, например 5
}

impl Default for StructureParams {
    fn default() -> Self {
        Self {
            lookback: 50,
            side_window: 5,
        }
    }
}

impl StructureParams {
    /// Меньше свечей нет смысла анализировать: не поместятся 3 пивота
    /// одного типа с окнами по K свечей.
    pub fn min_candles(&self) -> usize {
        2 * self.side_window + MIN_SWINGS
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStructure {
    Uptrend,
    Downtrend,
    Transition,
    Unknown,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingKind {
    HigherHigh,
    LowerHigh,
    HigherLow,
    LowerLow,
}

/// Свинг, классифицированный относительно предыдущего свинга того же типа
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub price: Price,
    pub ts: TimestampMs,
    pub kind: SwingKind,
}

/// Результат анализа окна
#[derive(Debug, Clone)]
pub struct StructureSnapshot {
    pub structure: MarketStructure,
    pub swings: Vec<SwingPoint>,
    /// Последний swing high (сопротивление для downtrend)
    pub last_high: Option<Pivot>,
    /// Последний swing low (поддержка для uptrend)
    pub last_low: Option<Pivot>,
}

impl StructureSnapshot {
    fn unknown() -> Self {
        Self {
            structure: MarketStructure::Unknown,
            swings: Vec::new(),
            last_high: None,
            last_low: None,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
struct PairCounts {
    higher: usize,
    lower: usize,
}

/// Сравнение соседних пар: строго выше = higher, иначе lower
fn count_pairs(prices: &[Price]) -> PairCounts {
    let mut counts = PairCounts::default();
    for w in prices.windows(2) {
        if w[1].0 > w[0].0 {
            counts.higher += 1;
        } else {
            counts.lower += 1;
        }
    }
    counts
}

fn classify(highs: &[Pivot], lows: &[Pivot]) -> MarketStructure {
    if highs.len() < MIN_SWINGS || lows.len() < MIN_SWINGS {
        return MarketStructure::Unknown;
    }

    let hp: Vec<Price> = highs.iter().map(|p| p.price).collect();
    let lp: Vec<Price> = lows.iter().map(|p| p.price).collect();
    let h = count_pairs(&hp);
    let l = count_pairs(&lp);

    if h.higher > h.lower && l.higher > l.lower {
        MarketStructure::Uptrend
    } else if h.lower > h.higher && l.lower > l.higher {
        MarketStructure::Downtrend
    } else {
        MarketStructure::Transition
    }
}

fn label_swings(pivots: &[Pivot], higher: SwingKind, lower: SwingKind) -> Vec<SwingPoint> {
    pivots
        .windows(2)
        .map(|w| SwingPoint {
            price: w[1].price,
            ts: w[1].ts,
            kind: if w[1].price.0 > w[0].price.0 {
                higher
            } else {
                lower
            },
        })
        .collect()
}

/// Классифицировать структуру по последним `lookback` свечам.
///
/// Недостаточно свечей или свингов -> `Unknown`, уровни всё равно
/// отдаются, если найдены.
pub fn detect_structure(candles: &[Candle], params: StructureParams) -> StructureSnapshot {
    let start = candles.len().saturating_sub(params.lookback);
    let window = &candles[start..];

    if window.len() < params.min_candles() {
        return StructureSnapshot::unknown();
    }

    let pivots = find_pivots(window, params.side_window);

    let highs: Vec<Pivot> = pivots
        .iter()
        .filter(|p| p.kind == PivotKind::High)
        .map(|p| Pivot {
            index: p.index + start,
            ..*p
        })
        .collect();
    let lows: Vec<Pivot> = pivots
        .iter()
        .filter(|p| p.kind == PivotKind::Low)
        .map(|p| Pivot {
            index: p.index + start,
            ..*p
        })
        .collect();

    let mut swings = label_swings(&highs, SwingKind::HigherHigh, SwingKind::LowerHigh);
    swings.extend(label_swings(&lows, SwingKind::HigherLow, SwingKind::LowerLow));
    swings.sort_by_key(|s| s.ts);

    StructureSnapshot {
        structure: classify(&highs, &lows),
        swings,
        last_high: highs.last().copied(),
        last_low: lows.last().copied(),
    }
}

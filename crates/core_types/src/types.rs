//! Core domain types.
//!
//! Цель:
//! - запретить "голые" f64 в бизнес-логике
//! - зафиксировать единицы измерения (цена vs. количество шагов цены)
//! - сделать ошибки очевидными на уровне типов

use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Цена инструмента (например USDJPY)
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub f64);

/// Размер позиции (лоты / контракты)
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Qty(pub f64);

/// Денежная сумма в валюте счёта
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub f64);

/// Доля / коэффициент (0.0 .. 1.0)
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ratio(pub f64);

/// Расстояние, выраженное в шагах цены инструмента ("пипсы").
///
/// 0.6 increments на USDJPY (шаг 0.01) = 0.006 в цене.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Increments(pub f64);

/// Время в миллисекундах (unix epoch)
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimestampMs(pub i64);

/// Направление сетапа
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Bull,
    Bear,
}

//
// --- Conversions & helpers --------------------------------------------------
//

impl Direction {
    /// +1 для Bull, -1 для Bear
    pub fn sign(self) -> f64 {
        match self {
            Direction::Bull => 1.0,
            Direction::Bear => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Bull => Direction::Bear,
            Direction::Bear => Direction::Bull,
        }
    }
}

impl Increments {
    /// Перевод шагов цены в абсолютную дельту цены
    pub fn to_price_delta(self, increment: Price) -> Price {
        Price(self.0 * increment.0)
    }

    /// Перевод абсолютной дельты цены в шаги
    pub fn from_price_delta(delta: Price, increment: Price) -> Option<Self> {
        if increment.0 <= 0.0 || !increment.0.is_finite() {
            return None;
        }
        Some(Increments(delta.0 / increment.0))
    }
}

impl Ratio {
    pub fn of(self, money: Money) -> Money {
        Money(money.0 * self.0)
    }
}

impl TimestampMs {
    pub fn plus_millis(self, ms: i64) -> Self {
        TimestampMs(self.0.saturating_add(ms))
    }

    pub fn millis_since(self, earlier: TimestampMs) -> i64 {
        self.0.saturating_sub(earlier.0)
    }
}

//
// --- Arithmetic (строго минимально) -----------------------------------------
//

impl Add for Price {
    type Output = Price;
    fn add(self, rhs: Price) -> Price {
        Price(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Price;
    fn sub(self, rhs: Price) -> Price {
        Price(self.0 - rhs.0)
    }
}

impl Mul<f64> for Increments {
    type Output = Increments;
    fn mul(self, rhs: f64) -> Increments {
        Increments(self.0 * rhs)
    }
}

//
// --- Display (для логов) ----------------------------------------------------
//

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}", self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl fmt::Display for Increments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} inc", self.0)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Bull => f.write_str("bull"),
            Direction::Bear => f.write_str("bear"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_convert_with_yen_scaling() {
        let d = Increments(0.6).to_price_delta(Price(0.01));
        assert!((d.0 - 0.006).abs() < 1e-12);

        let back = Increments::from_price_delta(Price(0.15), Price(0.01)).unwrap();
        assert!((back.0 - 15.0).abs() < 1e-9);
    }

    #[test]
    fn zero_increment_is_not_convertible() {
        assert!(Increments::from_price_delta(Price(1.0), Price(0.0)).is_none());
    }

    #[test]
    fn direction_serializes_as_snake_case() {
        let s = serde_json::to_string(&Direction::Bull).unwrap();
        assert_eq!(s, "\"bull\"");
        assert_eq!(Direction::Bear.opposite(), Direction::Bull);
    }
}

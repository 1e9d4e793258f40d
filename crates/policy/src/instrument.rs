use core_types::{Money, Price, Qty};
use serde::{Deserialize, Serialize};

/// Класс актива определяет шаг цены ("пипс") по умолчанию
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    FxMajor,
    FxYen,
    Metal,
    Index,
    Crypto,
}

impl AssetClass {
    pub fn default_increment(self) -> Price {
        match self {
            AssetClass::FxMajor => Price(0.0001),
            AssetClass::FxYen => Price(0.01),
            AssetClass::Metal => Price(0.1),
            AssetClass::Index | AssetClass::Crypto => Price(1.0),
        }
    }

    /// Знаков после запятой в котировке
    pub fn digits(self) -> u32 {
        match self {
            AssetClass::FxMajor => 5,
            AssetClass::FxYen => 3,
            AssetClass::Metal | AssetClass::Crypto => 2,
            AssetClass::Index => 1,
        }
    }

    /// Стоимость одного шага цены на 1 лот, в валюте счёта
    pub fn default_value_per_increment(self) -> Money {
        match self {
            AssetClass::FxMajor | AssetClass::FxYen | AssetClass::Metal => Money(10.0),
            AssetClass::Index | AssetClass::Crypto => Money(1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub asset_class: AssetClass,
    pub increment: Price,
    pub digits: u32,
    pub value_per_increment: Money,
    pub min_size: Qty,
    pub max_size: Qty,
    pub size_step: Qty,
}

impl Instrument {
    pub fn preset(symbol: impl Into<String>, asset_class: AssetClass) -> Self {
        Self {
            symbol: symbol.into(),
            asset_class,
            increment: asset_class.default_increment(),
            digits: asset_class.digits(),
            value_per_increment: asset_class.default_value_per_increment(),
            min_size: Qty(0.01),
            max_size: Qty(100.0),
            size_step: Qty(0.01),
        }
    }

    /// Округлить цену до точности котировки
    pub fn normalize(&self, price: Price) -> Price {
        let scale = 10f64.powi(self.digits as i32);
        Price((price.0 * scale).round() / scale)
    }

    /// Размер вниз к шагу лота, сверху ограничен max_size.
    ///
    /// None, если после шага размер меньше min_size: округление вверх
    /// увеличило бы риск сверх расчётного.
    pub fn bound_size(&self, raw: Qty) -> Option<Qty> {
        let stepped = if self.size_step.0 > 0.0 {
            let steps = (raw.0 / self.size_step.0 + 1e-9).floor();
            steps * self.size_step.0
        } else {
            raw.0
        };

        if !(stepped + 1e-12 >= self.min_size.0) {
            return None;
        }

        Some(Qty(stepped.min(self.max_size.0)))
    }

    pub fn is_valid(&self) -> bool {
        self.increment.0 > 0.0
            && self.value_per_increment.0 > 0.0
            && self.min_size.0 > 0.0
            && self.min_size.0 <= self.max_size.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yen_pairs_are_coarser_than_majors() {
        let jpy = Instrument::preset("USDJPY", AssetClass::FxYen);
        let eur = Instrument::preset("EURUSD", AssetClass::FxMajor);

        assert_eq!(jpy.increment, Price(0.01));
        assert!(eur.increment.0 < jpy.increment.0);
    }

    #[test]
    fn normalize_rounds_to_digits() {
        let jpy = Instrument::preset("USDJPY", AssetClass::FxYen);
        assert_eq!(jpy.normalize(Price(147.0060000001)), Price(147.006));
    }

    #[test]
    fn size_is_stepped_down_and_bounded() {
        let i = Instrument::preset("EURUSD", AssetClass::FxMajor);

        assert!((i.bound_size(Qty(5.557)).unwrap().0 - 5.55).abs() < 1e-9);
        assert_eq!(i.bound_size(Qty(1_000.0)), Some(Qty(100.0)));
        assert_eq!(i.bound_size(Qty(0.01)), Some(Qty(0.01)));
    }

    #[test]
    fn size_below_minimum_is_not_rounded_up() {
        let i = Instrument::preset("EURUSD", AssetClass::FxMajor);

        assert_eq!(i.bound_size(Qty(0.001)), None);
        // 0.0199 -> 0.01 ок, 0.0099 -> 0.00 нет
        assert_eq!(i.bound_size(Qty(0.0199)), Some(Qty(0.01)));
        assert_eq!(i.bound_size(Qty(0.0099)), None);
    }
}

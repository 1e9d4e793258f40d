use core_types::{Direction, Increments, Price};
use serde::{Deserialize, Serialize};

use crate::instrument::Instrument;

/// Точная цена входа
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryTrigger {
    pub price: Price,
    pub direction: Direction,
}

/// base ± offset * increment, знак по направлению.
///
/// Базой служит цена подтверждения пробоя (или ретеста), никогда не
/// уровень старшего ТФ.
pub fn entry_trigger(
    direction: Direction,
    base: Price,
    offset: Increments,
    instrument: &Instrument,
) -> EntryTrigger {
    let delta = offset.to_price_delta(instrument.increment);
    let raw = Price(base.0 + direction.sign() * delta.0);

    EntryTrigger {
        price: instrument.normalize(raw),
        direction,
    }
}

/// Стоп по другую сторону входа на `distance` шагов
pub fn stop_price(trigger: &EntryTrigger, distance: Increments, instrument: &Instrument) -> Price {
    let delta = distance.to_price_delta(instrument.increment);
    instrument.normalize(Price(trigger.price.0 - trigger.direction.sign() * delta.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::AssetClass;

    fn usdjpy() -> Instrument {
        Instrument::preset("USDJPY", AssetClass::FxYen)
    }

    #[test]
    fn bull_entry_is_offset_above_confirmation_price() {
        let t = entry_trigger(Direction::Bull, Price(147.000), Increments(0.6), &usdjpy());

        assert!((t.price.0 - 147.006).abs() < 1e-9);
        // не от уровня 146.985
        assert!((t.price.0 - 146.991).abs() > 1e-6);
    }

    #[test]
    fn bear_entry_is_offset_below() {
        let t = entry_trigger(Direction::Bear, Price(146.970), Increments(0.6), &usdjpy());
        assert!((t.price.0 - 146.964).abs() < 1e-9);
        assert_eq!(t.direction, Direction::Bear);
    }

    #[test]
    fn major_pair_scaling_is_finer() {
        let eur = Instrument::preset("EURUSD", AssetClass::FxMajor);
        let t = entry_trigger(Direction::Bull, Price(1.08500), Increments(0.6), &eur);
        assert!((t.price.0 - 1.08506).abs() < 1e-9);
    }

    #[test]
    fn stop_sits_on_the_far_side() {
        let t = entry_trigger(Direction::Bull, Price(147.000), Increments(0.6), &usdjpy());
        let s = stop_price(&t, Increments(10.0), &usdjpy());
        assert!((s.0 - 146.906).abs() < 1e-9);

        let b = EntryTrigger {
            price: Price(146.964),
            direction: Direction::Bear,
        };
        assert!((stop_price(&b, Increments(10.0), &usdjpy()).0 - 147.064).abs() < 1e-9);
    }
}

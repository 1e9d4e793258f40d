pub mod types;

pub use types::{Direction, Increments, Money, Price, Qty, Ratio, TimestampMs};

use core_types::{Increments, Price, TimestampMs};

use structure::atr::atr_in_increments;
use structure::candle::{Candle, Timeframe};

use crate::error::SignalError;

/// Хвостовое окно свечей одного ТФ. Только append, строго по времени.
#[derive(Debug, Clone)]
pub struct CandleFeed {
    pub timeframe: Timeframe,
    pub window: usize,
    candles: Vec<Candle>,
}

impl CandleFeed {
    pub fn new(timeframe: Timeframe, window: usize) -> Self {
        Self {
            timeframe,
            window,
            candles: Vec::with_capacity(window + 8),
        }
    }

    /// Свеча с ts не строго после курсора отклоняется, не переупорядочивается.
    pub fn push(&mut self, c: Candle) -> Result<(), SignalError> {
        self.check_order(c.ts)?;
        self.candles.push(c);

        // держим последний window
        if self.candles.len() > self.window {
            let excess = self.candles.len() - self.window;
            self.candles.drain(0..excess);
        }

        Ok(())
    }

    pub fn check_order(&self, ts: TimestampMs) -> Result<(), SignalError> {
        match self.cursor() {
            Some(cursor) if ts <= cursor => Err(SignalError::OutOfSequence {
                timeframe: self.timeframe,
                ts,
                cursor,
            }),
            _ => Ok(()),
        }
    }

    pub fn cursor(&self) -> Option<TimestampMs> {
        self.candles.last().map(|c| c.ts)
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Свечи строго после `ts`, по порядку
    pub fn after(&self, ts: TimestampMs) -> impl Iterator<Item = &Candle> {
        self.candles.iter().filter(move |c| c.ts > ts)
    }

    pub fn atr(&self, period: usize, increment: Price) -> Option<Increments> {
        atr_in_increments(&self.candles, period, increment)
    }
}

//! Прогон исторических свечей через машину: CSV -> общий таймлайн -> tick.

use std::io::Read;
use std::path::Path;

use core_types::{Increments, Money, Price, Qty, TimestampMs};
use serde::{Deserialize, Serialize};
use state_machine::Phase;
use structure::candle::Candle;

use crate::error::{ReplayError, SignalError};
use crate::event::EngineEvent;
use crate::machine::{SignalStateMachine, TickInput};
use crate::sink::{self, SignalSink};

/// Строка CSV: ts,open,high,low,close,volume
#[derive(Debug, Serialize, Deserialize)]
pub struct CandleRow {
    pub ts: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<CandleRow> for Candle {
    fn from(row: CandleRow) -> Self {
        Candle {
            ts: TimestampMs(row.ts),
            open: Price(row.open),
            high: Price(row.high),
            low: Price(row.low),
            close: Price(row.close),
            volume: Qty(row.volume),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Source {
    Coarse,
    Fine,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySummary {
    pub candles: usize,
    pub signals: usize,
    pub rejections: usize,
    pub first_ts: Option<TimestampMs>,
    pub last_ts: Option<TimestampMs>,
    pub final_phase: Phase,
}

pub fn read_candles<R: Read>(reader: R) -> Result<Vec<Candle>, ReplayError> {
    rows(csv::Reader::from_reader(reader))
}

pub fn read_candles_file(path: impl AsRef<Path>) -> Result<Vec<Candle>, ReplayError> {
    rows(csv::Reader::from_path(path)?)
}

fn rows<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<Candle>, ReplayError> {
    let mut out = Vec::new();
    for r in rdr.deserialize::<CandleRow>() {
        out.push(r?.into());
    }
    Ok(out)
}

/// Общий таймлайн по ts. При равных ts старший ТФ раньше, порядок
/// внутри ленты сохраняется (сортировка стабильная).
pub fn merge_timeline(coarse: Vec<Candle>, fine: Vec<Candle>) -> Vec<(Source, Candle)> {
    let mut timeline: Vec<(Source, Candle)> = coarse
        .into_iter()
        .map(|c| (Source::Coarse, c))
        .chain(fine.into_iter().map(|c| (Source::Fine, c)))
        .collect();
    timeline.sort_by_key(|(src, c)| (c.ts, *src == Source::Fine));
    timeline
}

/// По одной свече на тик, `now = candle.ts`.
pub fn replay<S: SignalSink>(
    machine: &mut SignalStateMachine,
    timeline: Vec<(Source, Candle)>,
    balance: Money,
    atr: Option<Increments>,
    sink: &mut S,
) -> Result<ReplaySummary, ReplayError> {
    let mut summary = ReplaySummary {
        candles: timeline.len(),
        signals: 0,
        rejections: 0,
        first_ts: timeline.first().map(|(_, c)| c.ts),
        last_ts: timeline.last().map(|(_, c)| c.ts),
        final_phase: machine.phase(),
    };

    for (src, c) in timeline {
        let mut input = TickInput::new(balance);
        input.risk.atr = atr;
        match src {
            Source::Coarse => input.coarse.push(c),
            Source::Fine => input.fine.push(c),
        }

        if let Some(signal) = machine.tick(c.ts, input) {
            sink.submit(&signal)?;
            summary.signals += 1;
        }

        let events = machine.take_events();
        summary.rejections += events
            .iter()
            .filter(|e| {
                matches!(e, EngineEvent::Rejected(err) if !matches!(err, SignalError::InsufficientData { .. }))
            })
            .count();
        sink::consume(machine.symbol(), events);
    }

    summary.final_phase = machine.phase();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "ts,open,high,low,close,volume\n\
                       1000,1.0,1.2,0.9,1.1,10\n\
                       2000,1.1,1.3,1.0,1.2,12\n";

    #[test]
    fn reads_header_csv_into_candles() {
        let candles = read_candles(CSV.as_bytes()).unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].ts, TimestampMs(2000));
        assert_eq!(candles[1].high, Price(1.3));
        assert_eq!(candles[0].volume, Qty(10.0));
    }

    #[test]
    fn malformed_row_is_an_error() {
        let bad = "ts,open,high,low,close,volume\n1000,1.0,oops,0.9,1.1,10\n";
        assert!(matches!(read_candles(bad.as_bytes()), Err(ReplayError::Csv(_))));
    }

    #[test]
    fn reads_candles_from_a_file() {
        let path = std::env::temp_dir().join(format!("replay-{}.csv", std::process::id()));
        std::fs::write(&path, CSV).unwrap();

        let candles = read_candles_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(candles.len(), 2);
    }

    #[test]
    fn equal_timestamps_put_coarse_first() {
        let coarse = read_candles(CSV.as_bytes()).unwrap();
        let fine = read_candles("ts,open,high,low,close,volume\n500,1,1,1,1,1\n1000,1,1,1,1,1\n1500,1,1,1,1,1\n".as_bytes())
            .unwrap();

        let order: Vec<(Source, i64)> = merge_timeline(coarse, fine)
            .into_iter()
            .map(|(s, c)| (s, c.ts.0))
            .collect();

        assert_eq!(
            order,
            vec![
                (Source::Fine, 500),
                (Source::Coarse, 1000),
                (Source::Fine, 1000),
                (Source::Fine, 1500),
                (Source::Coarse, 2000),
            ]
        );
    }
}

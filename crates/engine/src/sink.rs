use std::io::Write;

use tracing::{debug, info, warn};

use crate::error::{SignalError, SinkError};
use crate::event::EngineEvent;
use crate::signal::Signal;

/// Внешний исполнитель сигналов
pub trait SignalSink {
    fn submit(&mut self, signal: &Signal) -> Result<(), SinkError>;
}

/// Одна JSON-строка на сигнал
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SignalSink for JsonLinesSink<W> {
    fn submit(&mut self, signal: &Signal) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.out, signal)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Только лог
#[derive(Debug, Default)]
pub struct LogSink;

impl SignalSink for LogSink {
    fn submit(&mut self, signal: &Signal) -> Result<(), SinkError> {
        info!(
            symbol = %signal.symbol,
            id = %signal.id,
            direction = %signal.direction,
            entry = %signal.entry.price,
            stop = %signal.stop_price,
            size = signal.position.size.0,
            "signal"
        );
        Ok(())
    }
}

/// Копит сигналы в памяти
#[derive(Debug, Default)]
pub struct MemorySink {
    pub signals: Vec<Signal>,
}

impl SignalSink for MemorySink {
    fn submit(&mut self, signal: &Signal) -> Result<(), SinkError> {
        self.signals.push(signal.clone());
        Ok(())
    }
}

pub fn consume(symbol: &str, events: Vec<EngineEvent>) {
    for e in events {
        match e {
            EngineEvent::Transition { from, cause, to } => {
                debug!(symbol, "transition: {:?} --({:?})-> {:?}", from, cause, to);
            }
            EngineEvent::BreakDetected(ev) => {
                debug!(symbol, level = %ev.level, "break detected ({})", ev.label());
            }
            EngineEvent::BreakConfirmed(ev) => {
                debug!(symbol, price = %ev.price, "break confirmed");
            }
            EngineEvent::RetestConfirmed(ev) => {
                debug!(symbol, price = %ev.price, deviation = %ev.deviation, "retest");
            }
            EngineEvent::Rejected(SignalError::InsufficientData { .. }) => {}
            EngineEvent::Rejected(err) => {
                warn!(symbol, "rejected: {}", err);
            }
            EngineEvent::SignalEmitted { id } => {
                debug!(symbol, %id, "signal emitted");
            }
            EngineEvent::Log(msg) => {
                debug!(symbol, "{}", msg);
            }
        }
    }
}

use core_types::{Increments, Money, TimestampMs};
use structure::candle::Candle;
use tokio::sync::mpsc::Receiver;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::FeedError;
use crate::machine::{SignalStateMachine, TickInput};
use crate::sink::{self, SignalSink};

/// Сообщения от поставщика данных и исполнителя
#[derive(Debug, Clone)]
pub enum FeedMessage {
    Coarse(Candle),
    Fine(Candle),
    Balance(Money),
    Atr(Increments),
    Ack(Uuid),
    Abort,
    Disconnected,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: usize,
    pub signals: usize,
}

/// Крутит одну машину на своей задаче.
///
/// Закрытый канал = штатная остановка. `Disconnected` после последнего
/// тика уходит наверх ошибкой: без данных ядро работать не может.
pub async fn run_symbol<S, C>(
    mut machine: SignalStateMachine,
    mut rx: Receiver<FeedMessage>,
    sink: &mut S,
    clock: C,
    balance: Money,
) -> Result<RunSummary, FeedError>
where
    S: SignalSink,
    C: Fn() -> TimestampMs,
{
    let mut summary = RunSummary::default();
    let mut pending = TickInput::new(balance);

    let mut period = machine.poll_interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(symbol = machine.symbol(), "runner started");

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(FeedMessage::Coarse(c)) => pending.coarse.push(c),
                Some(FeedMessage::Fine(c)) => pending.fine.push(c),
                Some(FeedMessage::Balance(b)) => pending.risk.account_balance = b,
                Some(FeedMessage::Atr(a)) => pending.risk.atr = Some(a),
                Some(FeedMessage::Ack(id)) => {
                    machine.acknowledge(id);
                }
                Some(FeedMessage::Abort) => machine.abort(),
                Some(FeedMessage::Disconnected) => {
                    run_tick(&mut machine, &mut pending, sink, &clock, &mut summary);
                    warn!(symbol = machine.symbol(), "feed disconnected");
                    return Err(FeedError::Disconnected);
                }
                None => {
                    run_tick(&mut machine, &mut pending, sink, &clock, &mut summary);
                    info!(symbol = machine.symbol(), ticks = summary.ticks, signals = summary.signals, "runner stopped");
                    return Ok(summary);
                }
            },
            _ = ticker.tick() => {
                run_tick(&mut machine, &mut pending, sink, &clock, &mut summary);

                // после Phase 1 опрашиваем чаще
                let next = machine.poll_interval();
                if next != period {
                    period = next;
                    ticker = interval_at(Instant::now() + period, period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                }
            }
        }
    }
}

fn run_tick<S, C>(
    machine: &mut SignalStateMachine,
    pending: &mut TickInput,
    sink: &mut S,
    clock: &C,
    summary: &mut RunSummary,
) where
    S: SignalSink,
    C: Fn() -> TimestampMs,
{
    let input = TickInput {
        coarse: std::mem::take(&mut pending.coarse),
        fine: std::mem::take(&mut pending.fine),
        risk: pending.risk,
    };

    summary.ticks += 1;
    if let Some(signal) = machine.tick(clock(), input) {
        summary.signals += 1;
        if let Err(e) = sink.submit(&signal) {
            error!(symbol = machine.symbol(), id = %signal.id, "sink failed: {}", e);
        }
    }

    let events = machine.take_events();
    sink::consume(machine.symbol(), events);
}

//! Машина сигнала одного символа.
//!
//! Всё состояние цикла живёт здесь и принадлежит одному экземпляру:
//! несколько символов можно гонять параллельно без синхронизации.
//! Время и свечи приходят аргументами `tick`, планирование остаётся
//! вызывающей стороне.

use std::time::Duration;

use core_types::{Direction, Increments, Money, TimestampMs};
use policy::entry::{entry_trigger, stop_price};
use policy::instrument::Instrument;
use policy::sizing::{RiskParameters, size_position, stop_distance_from_atr};
use state_machine::{Phase, TransitionCause, transition};
use structure::bos::{BosParams, BosTracker, BreakOfStructureEvent};
use structure::candle::Candle;
use structure::confirm::{BreakConfirmationEvent, confirm_break};
use structure::retest::{RetestEvent, RetestParams, validate_retest};
use structure::structure::detect_structure;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{AckMode, EngineConfig, EntryBase};
use crate::error::{ConfigError, SignalError};
use crate::event::EngineEvent;
use crate::feed::CandleFeed;
use crate::signal::Signal;

/// Риск-контекст на одну оценку
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RiskContext {
    pub account_balance: Money,
    /// ATR от внешнего источника. None -> считаем по старшему ТФ.
    pub atr: Option<Increments>,
}

/// Новые данные за тик
#[derive(Debug, Clone, PartialEq)]
pub struct TickInput {
    pub coarse: Vec<Candle>,
    pub fine: Vec<Candle>,
    pub risk: RiskContext,
}

impl TickInput {
    pub fn new(account_balance: Money) -> Self {
        Self {
            coarse: Vec::new(),
            fine: Vec::new(),
            risk: RiskContext {
                account_balance,
                atr: None,
            },
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct PendingAck {
    id: Uuid,
    deadline: TimestampMs,
}

/// Данные незавершённого сигнала. Очищаются целиком при сбросе.
#[derive(Debug, Default, Clone)]
struct InFlight {
    structure_break: Option<BreakOfStructureEvent>,
    confirmation: Option<BreakConfirmationEvent>,
    retest: Option<RetestEvent>,
    /// Вход в фазу по часам вызывающего (`now`)
    phase_started_at: Option<TimestampMs>,
    /// Вход в фазу по времени свечей: ts события, открывшего фазу
    phase_anchor: Option<TimestampMs>,
    /// Последняя свеча младшего ТФ, уже просмотренная фазами
    fine_cursor: Option<TimestampMs>,
    pending_ack: Option<PendingAck>,
}

#[derive(Debug, Copy, Clone)]
enum Tf {
    Coarse,
    Fine,
}

pub struct SignalStateMachine {
    symbol: String,
    config: EngineConfig,
    instrument: Instrument,
    phase: Phase,
    coarse: CandleFeed,
    fine: CandleFeed,
    bos: BosTracker,
    flight: InFlight,
    events: Vec<EngineEvent>,
}

impl SignalStateMachine {
    pub fn new(
        symbol: impl Into<String>,
        config: EngineConfig,
        instrument: Instrument,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if !instrument.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "instrument {} has no usable increment or size bounds",
                instrument.symbol
            )));
        }

        Ok(Self {
            symbol: symbol.into(),
            coarse: CandleFeed::new(config.coarse_timeframe, config.coarse_window()),
            fine: CandleFeed::new(config.fine_timeframe, config.fine_window),
            config,
            instrument,
            phase: Phase::Idle,
            bos: BosTracker::new(),
            flight: InFlight::default(),
            events: Vec::new(),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn structure_break(&self) -> Option<&BreakOfStructureEvent> {
        self.flight.structure_break.as_ref()
    }

    pub fn confirmation(&self) -> Option<&BreakConfirmationEvent> {
        self.flight.confirmation.as_ref()
    }

    pub fn retest(&self) -> Option<&RetestEvent> {
        self.flight.retest.as_ref()
    }

    pub fn awaiting_ack(&self) -> Option<Uuid> {
        self.flight.pending_ack.map(|p| p.id)
    }

    /// Период опроса: короче, пока цикл в работе
    pub fn poll_interval(&self) -> Duration {
        self.config.poll_interval(self.phase != Phase::Idle)
    }

    /// Забрать накопленные события (для логов / sink)
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Внешняя отмена: безопасна в любой фазе
    pub fn abort(&mut self) {
        self.apply(TransitionCause::Abort);
    }

    /// Подтверждение исполнителя. true, если id совпал с ожидаемым.
    pub fn acknowledge(&mut self, id: Uuid) -> bool {
        let pending = self.flight.pending_ack;
        match pending {
            Some(p) if p.id == id && self.phase == Phase::ReadyForEntry => {
                self.apply(TransitionCause::Acknowledged)
            }
            _ => {
                debug!(symbol = %self.symbol, %id, "ack ignored");
                false
            }
        }
    }

    /// Один тик: принять новые свечи, продвинуть фазы, проверить таймауты.
    ///
    /// Возвращает сигнал ровно один раз, при входе в ReadyForEntry.
    pub fn tick(&mut self, now: TimestampMs, input: TickInput) -> Option<Signal> {
        let coarse = self.accept_in_order(Tf::Coarse, &input.coarse);
        let fine = self.accept_in_order(Tf::Fine, &input.fine);

        // общий таймлайн; при равных ts старший ТФ раньше
        let mut timeline: Vec<(Tf, Candle)> = coarse
            .into_iter()
            .map(|c| (Tf::Coarse, c))
            .chain(fine.into_iter().map(|c| (Tf::Fine, c)))
            .collect();
        timeline.sort_by_key(|(tf, c)| (c.ts, matches!(tf, Tf::Fine)));

        for (tf, candle) in timeline {
            match tf {
                Tf::Coarse => {
                    if self.push_candle(Tf::Coarse, candle) {
                        self.on_coarse_close(now, &candle);
                    }
                }
                Tf::Fine => {
                    if self.push_candle(Tf::Fine, candle) {
                        self.advance_fine(now);
                    }
                }
            }
        }

        self.check_deadlines(now);

        if self.phase == Phase::RetestConfirmed {
            return self.finalize(now, input.risk);
        }

        None
    }

    //
    // --- ingest ------------------------------------------------------------
    //

    /// Проверка порядка внутри пачки относительно курсора ленты.
    /// Нарушители отбрасываются здесь, до сортировки таймлайна.
    fn accept_in_order(&mut self, tf: Tf, batch: &[Candle]) -> Vec<Candle> {
        let feed = match tf {
            Tf::Coarse => &self.coarse,
            Tf::Fine => &self.fine,
        };

        let mut cursor = feed.cursor();
        let mut accepted = Vec::with_capacity(batch.len());
        let mut rejected = Vec::new();

        for c in batch {
            match cursor {
                Some(cur) if c.ts <= cur => rejected.push(SignalError::OutOfSequence {
                    timeframe: feed.timeframe,
                    ts: c.ts,
                    cursor: cur,
                }),
                _ => {
                    cursor = Some(c.ts);
                    accepted.push(*c);
                }
            }
        }

        for e in rejected {
            self.reject(e);
        }

        accepted
    }

    fn push_candle(&mut self, tf: Tf, candle: Candle) -> bool {
        let res = match tf {
            Tf::Coarse => self.coarse.push(candle),
            Tf::Fine => self.fine.push(candle),
        };

        match res {
            Ok(()) => true,
            Err(e) => {
                self.reject(e);
                false
            }
        }
    }

    //
    // --- coarse timeframe ---------------------------------------------------
    //

    fn on_coarse_close(&mut self, now: TimestampMs, candle: &Candle) {
        let params = self.config.structure_params();
        let need = params.min_candles();
        if self.coarse.len() < need {
            let have = self.coarse.len();
            self.reject(SignalError::InsufficientData { have, need });
            return;
        }

        match self.phase {
            Phase::Idle => {
                let snapshot = detect_structure(self.coarse.candles(), params);
                debug!(
                    symbol = %self.symbol,
                    ts = candle.ts.0,
                    structure = ?snapshot.structure,
                    "coarse close"
                );

                let bos_params = BosParams {
                    buffer: self.config.break_buffer(self.instrument.increment),
                };
                if let Some(ev) = self.bos.on_candle_close(candle, &snapshot, bos_params) {
                    info!(
                        symbol = %self.symbol,
                        direction = %ev.direction,
                        level = %ev.level,
                        "{}",
                        ev.label()
                    );
                    if self.apply(TransitionCause::StructureBroken) {
                        self.flight.structure_break = Some(ev);
                        self.flight.phase_started_at = Some(now);
                        self.flight.phase_anchor = Some(ev.ts);
                        self.flight.fine_cursor = Some(ev.ts);
                        self.events.push(EngineEvent::BreakDetected(ev));
                        // свечи младшего ТФ после BOS могли прийти раньше
                        self.advance_fine(now);
                    }
                }
            }
            p if p.is_in_flight() => self.check_contradiction(candle),
            _ => {}
        }
    }

    /// Закрытие старшего ТФ обратно за уровень пробоя отменяет сигнал
    fn check_contradiction(&mut self, candle: &Candle) {
        let Some(bos) = self.flight.structure_break else {
            return;
        };
        if candle.ts <= bos.ts {
            return;
        }

        let back_through = match bos.direction {
            Direction::Bull => candle.close.0 < bos.level.0,
            Direction::Bear => candle.close.0 > bos.level.0,
        };

        if back_through {
            self.fail(
                TransitionCause::ContradictingStructure,
                SignalError::ContradictingStructure {
                    level: bos.level,
                    close: candle.close,
                },
            );
        }
    }

    //
    // --- fine timeframe -----------------------------------------------------
    //

    /// Прогнать по фазам все свечи младшего ТФ после курсора
    fn advance_fine(&mut self, now: TimestampMs) {
        let Some(cursor) = self.flight.fine_cursor else {
            return;
        };

        let pending: Vec<Candle> = self.fine.after(cursor).copied().collect();
        for candle in pending {
            if !matches!(
                self.phase,
                Phase::StructureBreakDetected | Phase::BreakConfirmed
            ) {
                break;
            }
            self.flight.fine_cursor = Some(candle.ts);
            self.on_fine_close(now, &candle);
        }
    }

    fn on_fine_close(&mut self, now: TimestampMs, candle: &Candle) {
        // свечи сравниваем только со временем свечей: часы ленты и
        // вызывающего могут не совпадать
        if let Some(anchor) = self.flight.phase_anchor {
            let elapsed = candle.ts.millis_since(anchor);
            if elapsed > self.config.phase_timeout_ms() {
                let phase = self.phase;
                self.fail(
                    TransitionCause::PhaseTimedOut,
                    SignalError::PhaseTimeout {
                        phase,
                        elapsed_ms: elapsed,
                    },
                );
                return;
            }
        }

        let Some(bos) = self.flight.structure_break else {
            return;
        };

        match self.phase {
            Phase::StructureBreakDetected => {
                if let Some(conf) = confirm_break(&bos, candle) {
                    info!(symbol = %self.symbol, price = %conf.price, "break confirmed");
                    if self.apply(TransitionCause::BreakConfirmed) {
                        self.flight.confirmation = Some(conf);
                        self.flight.phase_started_at = Some(now);
                        self.flight.phase_anchor = Some(conf.ts);
                        self.events.push(EngineEvent::BreakConfirmed(conf));
                    }
                }
            }
            Phase::BreakConfirmed => {
                let Some(conf) = self.flight.confirmation else {
                    return;
                };
                let params = RetestParams {
                    tolerance: Increments(self.config.retest_tolerance_increments),
                    increment: self.instrument.increment,
                };
                if let Some(rt) = validate_retest(bos.direction, &conf, candle, params) {
                    info!(
                        symbol = %self.symbol,
                        price = %rt.price,
                        deviation = %rt.deviation,
                        "retest confirmed"
                    );
                    if self.apply(TransitionCause::RetestConfirmed) {
                        self.flight.retest = Some(rt);
                        self.flight.phase_started_at = Some(now);
                        self.flight.phase_anchor = Some(rt.ts);
                        self.events.push(EngineEvent::RetestConfirmed(rt));
                    }
                }
            }
            _ => {}
        }
    }

    //
    // --- deadlines ----------------------------------------------------------
    //

    fn check_deadlines(&mut self, now: TimestampMs) {
        if self.phase.is_in_flight() {
            if let Some(started) = self.flight.phase_started_at {
                let elapsed = now.millis_since(started);
                if elapsed > self.config.phase_timeout_ms() {
                    let phase = self.phase;
                    self.fail(
                        TransitionCause::PhaseTimedOut,
                        SignalError::PhaseTimeout {
                            phase,
                            elapsed_ms: elapsed,
                        },
                    );
                }
            }
            return;
        }

        if self.phase == Phase::ReadyForEntry {
            if let Some(p) = self.flight.pending_ack {
                if now > p.deadline {
                    warn!(symbol = %self.symbol, id = %p.id, "no ack within timeout, treating as not acted upon");
                    self.apply(TransitionCause::AckTimedOut);
                }
            }
        }
    }

    //
    // --- entry + risk -------------------------------------------------------
    //

    fn finalize(&mut self, now: TimestampMs, risk: RiskContext) -> Option<Signal> {
        let (Some(bos), Some(conf), Some(rt)) = (
            self.flight.structure_break,
            self.flight.confirmation,
            self.flight.retest,
        ) else {
            return None;
        };

        let atr = risk.atr.or_else(|| {
            self.coarse
                .atr(self.config.atr_period, self.instrument.increment)
        });
        let Some(atr) = atr else {
            // ждём ATR до таймаута фазы
            self.events
                .push(EngineEvent::Log("ATR unavailable, entry deferred".into()));
            return None;
        };

        let params = RiskParameters {
            account_balance: risk.account_balance,
            risk_percent_of_balance: self.config.risk_percent(),
            atr,
            atr_min: Increments(self.config.atr_min_increments),
            atr_max: Increments(self.config.atr_max_increments),
        };
        let stop_distance = stop_distance_from_atr(atr, self.config.stop_atr_multiple);

        let position = match size_position(&params, stop_distance, &self.instrument) {
            Ok(p) => p,
            Err(e) => {
                self.fail(TransitionCause::RiskRejected, e.into());
                return None;
            }
        };

        let base = match self.config.entry_base {
            EntryBase::Confirmation => conf.price,
            EntryBase::Retest => rt.price,
        };
        let entry = entry_trigger(
            bos.direction,
            base,
            Increments(self.config.entry_offset_increments),
            &self.instrument,
        );
        let stop = stop_price(&entry, stop_distance, &self.instrument);

        if !self.apply(TransitionCause::EntryComputed) {
            return None;
        }

        let signal = Signal {
            id: Uuid::new_v4(),
            symbol: self.symbol.clone(),
            direction: bos.direction,
            phase: self.phase,
            structure_break: bos,
            confirmation: conf,
            retest: rt,
            entry,
            stop_price: stop,
            atr,
            position,
            emitted_at: now,
        };

        info!(
            symbol = %self.symbol,
            id = %signal.id,
            direction = %signal.direction,
            entry = %entry.price,
            size = signal.position.size.0,
            "signal ready for entry"
        );
        self.events.push(EngineEvent::SignalEmitted { id: signal.id });

        match self.config.ack_mode {
            AckMode::Immediate => {
                self.apply(TransitionCause::SignalEmitted);
            }
            AckMode::AwaitAck => {
                self.flight.pending_ack = Some(PendingAck {
                    id: signal.id,
                    deadline: now.plus_millis(self.config.ack_timeout_ms()),
                });
            }
        }

        Some(signal)
    }

    //
    // --- transitions --------------------------------------------------------
    //

    fn apply(&mut self, cause: TransitionCause) -> bool {
        let from = self.phase;
        match transition(from, cause) {
            Ok(to) => {
                info!(symbol = %self.symbol, ?from, ?cause, ?to, "phase transition");
                self.events.push(EngineEvent::Transition { from, cause, to });
                self.phase = to;
                if to == Phase::Idle {
                    self.reset();
                }
                true
            }
            Err(e) => {
                debug!(symbol = %self.symbol, ?e, "transition refused");
                false
            }
        }
    }

    /// Ошибки рендерит `sink::consume`, здесь только debug
    fn fail(&mut self, cause: TransitionCause, err: SignalError) {
        debug!(symbol = %self.symbol, phase = ?self.phase, "{err}");
        self.events.push(EngineEvent::Rejected(err));
        self.apply(cause);
    }

    fn reject(&mut self, err: SignalError) {
        debug!(symbol = %self.symbol, "{err}");
        self.events.push(EngineEvent::Rejected(err));
    }

    /// Полный сброс данных цикла. Ленты свечей не трогаем.
    fn reset(&mut self) {
        self.flight = InFlight::default();
        self.bos.reset();
    }
}

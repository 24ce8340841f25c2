//! Live decision session.
//!
//! A session owns its settings, a rolling price buffer, and the
//! persisted ledger, and drives two interval loops: a strategy tick
//! that re-evaluates signals over the buffer, and a faster guard tick
//! that re-checks only the protective stop-loss/take-profit triggers
//! so they are not starved by the strategy cadence.
//!
//! Both loops use skip-on-overlap timers: a tick still running when
//! the next is due is skipped, never queued, so a trade can never be
//! executed twice for the same occasion. Every tick body runs under
//! one state lock, which also serializes the two loops against each
//! other. A feed failure makes the whole tick a no-op; the session
//! retries on the next interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::bar::PriceBar;
use crate::domain::error::TradewindError;
use crate::domain::ledger::{Ledger, Trade, TradeReason};
use crate::domain::settings::LiveSettings;
use crate::domain::signal::Direction;
use crate::domain::strategy::generate_signals;
use crate::ports::market_port::MarketDataPort;
use crate::ports::report_port::ReportPort;
use crate::ports::store_port::StorePort;

/// Bars retained in the rolling evaluation buffer. Far above any
/// strategy lookback; keeps per-tick recomputation bounded.
const BUFFER_CAPACITY: usize = 500;
/// Bars requested from the feed when seeding the buffer.
const HISTORY_SEED: usize = 100;

struct SessionState {
    settings: LiveSettings,
    buffer: Vec<PriceBar>,
    ledger: Ledger,
}

struct Shared {
    running: AtomicBool,
    state: Mutex<Option<SessionState>>,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, Option<SessionState>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct LiveSession {
    market: Arc<dyn MarketDataPort>,
    store: Arc<dyn StorePort>,
    report: Arc<dyn ReportPort>,
    shared: Arc<Shared>,
    tasks: Vec<JoinHandle<()>>,
}

impl LiveSession {
    pub fn new(
        market: Arc<dyn MarketDataPort>,
        store: Arc<dyn StorePort>,
        report: Arc<dyn ReportPort>,
    ) -> Self {
        LiveSession {
            market,
            store,
            report,
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                state: Mutex::new(None),
            }),
            tasks: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Start the session from stored settings. Starting without saved
    /// settings fails fast; starting a running session is a no-op.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<(), TradewindError> {
        if self.is_running() {
            debug!("start called on a running session, ignoring");
            return Ok(());
        }

        let settings = self
            .store
            .load_settings()?
            .ok_or(TradewindError::MissingConfiguration)?;
        settings.validate()?;

        let ledger = match self.store.load_ledger()? {
            Some(ledger) => ledger,
            None => {
                let ledger = Ledger::new(settings.initial_balance);
                self.store.save_ledger(&ledger)?;
                ledger
            }
        };

        let buffer = match self.market.historical_bars(&settings.instrument, HISTORY_SEED) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(error = %e, "history seed unavailable, starting with an empty buffer");
                Vec::new()
            }
        };

        info!(
            instrument = %settings.instrument,
            strategy = %settings.strategy,
            bars = buffer.len(),
            "live session starting"
        );

        let eval_every = Duration::from_millis(settings.eval_interval_ms);
        let guard_every = Duration::from_millis(settings.guard_interval_ms);

        *self.shared.lock_state() = Some(SessionState {
            settings,
            buffer,
            ledger,
        });
        self.shared.running.store(true, Ordering::Release);

        self.tasks = vec![
            tokio::spawn(run_loop(
                eval_every,
                TickKind::Strategy,
                self.shared.clone(),
                self.market.clone(),
                self.store.clone(),
                self.report.clone(),
            )),
            tokio::spawn(run_loop(
                guard_every,
                TickKind::Guard,
                self.shared.clone(),
                self.market.clone(),
                self.store.clone(),
                self.report.clone(),
            )),
        ];
        Ok(())
    }

    /// Cancel both timers. Safe to call at any time, including before
    /// `start` and repeatedly. Once `stop` returns, no further tick
    /// mutates the ledger: ticks run entirely under the state lock and
    /// re-check the running flag while holding it, so taking the lock
    /// here fences out any tick already in flight.
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        for task in self.tasks.drain(..) {
            task.abort();
        }
        drop(self.shared.lock_state());
        info!("live session stopped");
    }

    /// Snapshot of the session ledger, if the session has started.
    pub fn ledger_snapshot(&self) -> Option<Ledger> {
        self.shared
            .lock_state()
            .as_ref()
            .map(|state| state.ledger.clone())
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Clone, Copy)]
enum TickKind {
    Strategy,
    Guard,
}

async fn run_loop(
    period: Duration,
    kind: TickKind,
    shared: Arc<Shared>,
    market: Arc<dyn MarketDataPort>,
    store: Arc<dyn StorePort>,
    report: Arc<dyn ReportPort>,
) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        if !shared.running.load(Ordering::Acquire) {
            break;
        }
        match kind {
            TickKind::Strategy => strategy_tick(&shared, &*market, &*store, &*report),
            TickKind::Guard => guard_tick(&shared, &*market, &*store, &*report),
        }
    }
}

enum Fetch {
    Appended(PriceBar),
    Stale,
    Unavailable,
}

/// Pull the latest bar and append it to the buffer if it is newer than
/// what we already hold.
fn fetch_latest(market: &dyn MarketDataPort, state: &mut SessionState) -> Fetch {
    match market.latest_bar(&state.settings.instrument) {
        Ok(bar) => {
            let newer = state
                .buffer
                .last()
                .is_none_or(|last| bar.timestamp > last.timestamp);
            if !newer {
                return Fetch::Stale;
            }
            state.buffer.push(bar.clone());
            if state.buffer.len() > BUFFER_CAPACITY {
                let excess = state.buffer.len() - BUFFER_CAPACITY;
                state.buffer.drain(..excess);
            }
            Fetch::Appended(bar)
        }
        Err(e) => {
            warn!(error = %e, "feed unavailable, tick skipped");
            Fetch::Unavailable
        }
    }
}

/// Full evaluation: refresh the buffer, recompute signals, then apply
/// exits before entries (stop-loss, take-profit, then sell signal).
fn strategy_tick(
    shared: &Shared,
    market: &dyn MarketDataPort,
    store: &dyn StorePort,
    report: &dyn ReportPort,
) {
    let mut guard = shared.lock_state();
    let Some(state) = guard.as_mut() else {
        return;
    };
    if !shared.running.load(Ordering::Acquire) {
        return;
    }

    let bar = match fetch_latest(market, state) {
        Fetch::Appended(bar) => bar,
        Fetch::Stale => {
            debug!("no new bar, tick idle");
            return;
        }
        Fetch::Unavailable => return,
    };

    let last = state.buffer.len() - 1;
    let signals = generate_signals(
        state.settings.strategy,
        &state.buffer,
        state.settings.ensemble_threshold,
    );
    let signal_direction = signals
        .iter()
        .find(|s| s.index == last)
        .map(|s| s.direction);

    let executed = if state.ledger.has_position() {
        let reason = state
            .ledger
            .position
            .as_ref()
            .and_then(|p| {
                p.exit_trigger(
                    bar.close,
                    state.settings.stop_loss_pct,
                    state.settings.take_profit_pct,
                )
            })
            .or_else(|| {
                (signal_direction == Some(Direction::Sell)).then_some(TradeReason::Signal)
            })
            .or_else(|| {
                let hit = state.settings.sell_price.is_some_and(|limit| bar.close >= limit);
                hit.then_some(TradeReason::Signal)
            });
        reason.and_then(|r| state.ledger.close_position(last, bar.timestamp, bar.close, r))
    } else {
        let wants_entry = signal_direction == Some(Direction::Buy)
            || state.settings.buy_price.is_some_and(|limit| bar.close <= limit);
        if wants_entry {
            let invest = state.ledger.cash * state.settings.risk_per_trade_pct / 100.0;
            state.ledger.open_position(last, bar.timestamp, bar.close, invest)
        } else {
            None
        }
    };

    if let Some(trade) = executed {
        persist_execution(state, &trade, store, report);
    }
}

/// Protective re-check between strategy evaluations: only the
/// stop-loss/take-profit triggers, against the latest price.
fn guard_tick(
    shared: &Shared,
    market: &dyn MarketDataPort,
    store: &dyn StorePort,
    report: &dyn ReportPort,
) {
    let mut guard = shared.lock_state();
    let Some(state) = guard.as_mut() else {
        return;
    };
    if !shared.running.load(Ordering::Acquire) {
        return;
    }
    if !state.ledger.has_position() {
        return;
    }

    let bar = match fetch_latest(market, state) {
        Fetch::Appended(bar) => bar,
        Fetch::Stale => match state.buffer.last() {
            Some(last) => last.clone(),
            None => return,
        },
        Fetch::Unavailable => return,
    };

    let reason = state.ledger.position.as_ref().and_then(|p| {
        p.exit_trigger(
            bar.close,
            state.settings.stop_loss_pct,
            state.settings.take_profit_pct,
        )
    });
    if let Some(reason) = reason {
        let last = state.buffer.len().saturating_sub(1);
        if let Some(trade) = state.ledger.close_position(last, bar.timestamp, bar.close, reason) {
            persist_execution(state, &trade, store, report);
        }
    }
}

fn persist_execution(
    state: &SessionState,
    trade: &Trade,
    store: &dyn StorePort,
    report: &dyn ReportPort,
) {
    info!(
        side = %trade.side,
        price = trade.price,
        quantity = trade.quantity,
        reason = %trade.reason,
        cash = state.ledger.cash,
        "trade executed"
    );
    if let Err(e) = store.save_ledger(&state.ledger) {
        warn!(error = %e, "failed to persist ledger");
    }
    if let Err(e) = store.append_trade(trade) {
        warn!(error = %e, "failed to append trade history");
    }
    if let Err(e) = report.on_trade(trade) {
        warn!(error = %e, "report sink rejected trade");
    }
}

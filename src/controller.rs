//! # controller
//!
//! the cycle loop. everything else feeds it or is driven by it:
//!
//! ```text
//!  timer ---Tick--.
//!                  >-- queue --> controller --> CycleState (under lock)
//!  input ---Key---'                  |    \
//!                                    |     `--> emulator (re)start
//!                                    `--> redraw request --> render worker
//! ```
//!
//! the controller is the only thing that takes events off the queue and the
//! only thing that writes the state. a Key of any sort ends the cycle; it is
//! only noticed between events, never half way through a transition. losing
//! the input listener ends it too, since no key could ever arrive after that.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::catalog::Catalog;
use crate::config::{Config, RearmPolicy};
use crate::display::{Display, RedrawHandle, RenderStats, RenderWorker};
use crate::emulator::{Emulator, TagKind};
use crate::error::Result;
use crate::event::{self, Event};
use crate::input::{InputListener, KeySource};
use crate::state::{SharedState, Step};
use crate::timer::PeriodicTimer;

/// the one encoding we ever ask the emulator for
const TAG_KIND: TagKind = TagKind::Em4100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Running,
    Stopped,
}

/// what the loop itself got through
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    /// how many times we moved on to a new identifier
    pub advances: u64,
}

/// everything worth knowing once the cycle has stopped
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub advances: u64,
    pub ticks_dropped: u64,
    pub frames_drawn: u64,
    pub frames_skipped: u64,
}

pub struct CycleController<'a> {
    catalog: Catalog,
    state: SharedState,
    emulator: &'a mut dyn Emulator,
    redraw: RedrawHandle,
    poll_timeout: Duration,
    rearm: RearmPolicy,
    stats: LoopStats,
}

impl<'a> CycleController<'a> {
    pub fn new(
        config: &Config,
        catalog: Catalog,
        state: SharedState,
        emulator: &'a mut dyn Emulator,
        redraw: RedrawHandle,
    ) -> CycleController<'a> {
        CycleController {
            catalog,
            state,
            emulator,
            redraw,
            poll_timeout: config.poll_timeout,
            rearm: config.rearm,
            stats: LoopStats::default(),
        }
    }

    /// run until a key is pressed, input is lost, or every producer has gone
    /// away. the emulator is stopped on the way out, whether or not the loop
    /// failed
    pub fn run(&mut self, events: &Receiver<Event>) -> Result<LoopStats> {
        let outcome = self.event_loop(events);
        let stopped = self.emulator.stop();
        outcome?;
        stopped?;
        Ok(self.stats)
    }

    fn event_loop(&mut self, events: &Receiver<Event>) -> Result<()> {
        self.arm()?;
        self.redraw.request();
        loop {
            match events.recv_timeout(self.poll_timeout) {
                Ok(event) => {
                    if self.handle(event)? == Flow::Stopped {
                        return Ok(());
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::warn!("event queue closed, stopping");
                    return Ok(());
                }
            }
        }
    }

    fn handle(&mut self, event: Event) -> Result<Flow> {
        match event {
            Event::Tick => {
                let step = self.state.lock().tick(&self.catalog);
                self.stats.ticks += 1;
                if step == Step::Advance {
                    self.stats.advances += 1;
                }
                tracing::trace!(?step, "tick");
                if self.rearm == RearmPolicy::EveryTick || step == Step::Advance {
                    self.arm()?;
                }
                self.redraw.request();
                Ok(Flow::Running)
            }
            Event::Key(key) => {
                // NB. which key doesn't matter; any press ends the cycle
                tracing::debug!(?key, "key received, stopping");
                Ok(Flow::Stopped)
            }
            Event::InputClosed => {
                tracing::warn!("input source gone, stopping");
                Ok(Flow::Stopped)
            }
        }
    }

    /// point the emulator at whatever identifier is current
    fn arm(&mut self) -> Result<()> {
        let index = self.state.lock().current_index();
        let record = self.catalog.get(index);
        tracing::debug!(index, identifier = %record, "emitting");
        self.emulator.start(TAG_KIND, record.as_bytes())
    }
}

/// set everything up, cycle until a key is pressed, then tear it all down
/// again. if any piece fails to start, the pieces already started are
/// stopped before the error comes back and the loop never runs
pub fn run<D, K>(
    config: &Config,
    catalog: Catalog,
    display: D,
    keys: K,
    emulator: &mut dyn Emulator,
) -> Result<RunSummary>
where
    D: Display + Send + 'static,
    K: KeySource + Send + 'static,
{
    let state = SharedState::new();
    let (ticks, key_tx, events) = event::queue(config.queue_depth);

    let renderer = RenderWorker::start(display, state.reader(), catalog, config)?;
    let tick_tx = ticks.clone();
    let mut timer = PeriodicTimer::start(config.tick_period, move || {
        tick_tx.offer();
    })?;
    let mut input = InputListener::start(keys, key_tx)?;
    tracing::info!(period = ?timer.period(), identifiers = catalog.len(), "cycle started");

    let outcome =
        CycleController::new(config, catalog, state, emulator, renderer.handle()).run(&events);

    // NB. receiver goes first so neither producer can block on a full queue
    drop(events);
    timer.stop();
    input.stop();
    let RenderStats {
        frames_drawn,
        frames_skipped,
    } = renderer.shutdown();

    let LoopStats { ticks: handled, advances } = outcome?;
    let summary = RunSummary {
        ticks: handled,
        advances,
        ticks_dropped: ticks.dropped(),
        frames_drawn,
        frames_skipped,
    };
    tracing::info!(?summary, "cycle stopped");
    Ok(summary)
}

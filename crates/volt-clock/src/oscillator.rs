// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Real-time scheduler for clocks and waveform recorders.
//!
//! The host calls [`Oscillator::tick`] from its periodic timer with a
//! wall-clock timestamp. The oscillator converts the wall time elapsed since
//! the previous tick into whole `refresh_rate_ms` steps of simulated time and
//! updates every registered pulse once per step. A host that stalled for
//! longer than `max_idle_ms` is resynchronised instead of replaying the
//! backlog.

use std::collections::BTreeMap;

use tracing::info;

use crate::clock::{ClockEdge, ClockError, ClockSource};
use crate::waveform::WaveformHandle;

/// Default simulated step per tick iteration.
pub const DEFAULT_REFRESH_RATE_MS: u64 = 10;
/// Default stall threshold beyond which the oscillator resynchronises.
pub const DEFAULT_MAX_IDLE_MS: u64 = 1000;

/// Oscillator tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OscillatorConfig {
    /// Granularity of simulated time.
    pub refresh_rate_ms: u64,
    /// Largest wall-clock gap that is caught up step by step.
    pub max_idle_ms: u64,
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: DEFAULT_REFRESH_RATE_MS,
            max_idle_ms: DEFAULT_MAX_IDLE_MS,
        }
    }
}

/// Handle to a registered pulse.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PulseId(u32);

impl PulseId {
    /// Raw handle value.
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Anything the oscillator advances.
#[derive(Debug)]
pub enum Pulse {
    /// A clock source; its toggles are reported to the tick callback.
    Clock(ClockSource),
    /// A waveform recorder; only its time base moves.
    Recorder(WaveformHandle),
}

impl Pulse {
    fn reset(&mut self, elapsed_ms: u64) {
        match self {
            Self::Clock(clock) => clock.reset(elapsed_ms),
            Self::Recorder(handle) => handle.reset(elapsed_ms),
        }
    }
}

/// What one [`Oscillator::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Refresh steps simulated.
    pub steps: u64,
    /// Clock toggles delivered to the callback.
    pub edges: usize,
    /// `true` if the tick resynchronised after an over-long stall.
    pub resynced: bool,
}

/// Pulse registry plus simulated-time bookkeeping.
#[derive(Debug)]
pub struct Oscillator {
    config: OscillatorConfig,
    pulses: BTreeMap<PulseId, Pulse>,
    next_pulse: u32,
    running: bool,
    last_update_time: u64,
    time_ms_elapsed: u64,
}

impl Oscillator {
    /// Stopped oscillator at simulated time zero.
    ///
    /// # Errors
    /// Returns [`ClockError::ZeroRefreshRate`] if `refresh_rate_ms` is zero.
    pub fn new(config: OscillatorConfig) -> Result<Self, ClockError> {
        if config.refresh_rate_ms == 0 {
            return Err(ClockError::ZeroRefreshRate);
        }
        Ok(Self {
            config,
            pulses: BTreeMap::new(),
            next_pulse: 0,
            running: false,
            last_update_time: 0,
            time_ms_elapsed: 0,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> OscillatorConfig {
        self.config
    }

    /// `true` between `start` and `stop`.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Simulated milliseconds elapsed since the last [`Oscillator::reset`].
    pub fn time_ms_elapsed(&self) -> u64 {
        self.time_ms_elapsed
    }

    /// Registers a clock, rebased to the current simulated time so it does
    /// not replay toggles from before it existed.
    pub fn add_clock(&mut self, mut clock: ClockSource) -> PulseId {
        clock.reset(self.time_ms_elapsed);
        self.insert(Pulse::Clock(clock))
    }

    /// Registers a waveform recorder.
    pub fn add_recorder(&mut self, handle: WaveformHandle) -> PulseId {
        handle.update(self.time_ms_elapsed);
        self.insert(Pulse::Recorder(handle))
    }

    /// Unregisters a pulse.
    pub fn remove_pulse(&mut self, id: PulseId) -> Option<Pulse> {
        self.pulses.remove(&id)
    }

    /// Registered pulses in registration order.
    pub fn pulses(&self) -> impl Iterator<Item = (PulseId, &Pulse)> {
        self.pulses.iter().map(|(id, pulse)| (*id, pulse))
    }

    /// Clock registered under `id`.
    pub fn clock(&self, id: PulseId) -> Option<&ClockSource> {
        match self.pulses.get(&id) {
            Some(Pulse::Clock(clock)) => Some(clock),
            _ => None,
        }
    }

    /// Mutable clock registered under `id`.
    pub fn clock_mut(&mut self, id: PulseId) -> Option<&mut ClockSource> {
        match self.pulses.get_mut(&id) {
            Some(Pulse::Clock(clock)) => Some(clock),
            _ => None,
        }
    }

    /// Begins measuring wall time from `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        self.running = true;
        self.last_update_time = now_ms;
        info!(now_ms, elapsed_ms = self.time_ms_elapsed, "oscillator started");
    }

    /// Halts future ticks. Simulated time is kept.
    pub fn stop(&mut self) {
        if self.running {
            info!(elapsed_ms = self.time_ms_elapsed, "oscillator stopped");
        }
        self.running = false;
    }

    /// Returns simulated time to zero, rebasing every pulse so clock phase
    /// carries over.
    pub fn reset(&mut self) {
        self.time_ms_elapsed = 0;
        for pulse in self.pulses.values_mut() {
            pulse.reset(0);
        }
    }

    /// Advances simulated time by the whole refresh steps that fit into the
    /// wall time since the last tick. Each clock toggle is handed to
    /// `on_edge` the moment it happens.
    ///
    /// Within a step, recorders move first so levels recorded by `on_edge`
    /// land at the step's timestamp.
    pub fn tick<F>(&mut self, now_ms: u64, mut on_edge: F) -> TickReport
    where
        F: FnMut(PulseId, ClockEdge),
    {
        if !self.running {
            return TickReport::default();
        }
        let idle = now_ms.saturating_sub(self.last_update_time);
        if idle > self.config.max_idle_ms {
            info!(idle_ms = idle, "oscillator stalled; resynchronising");
            self.stop();
            self.start(now_ms);
            return TickReport {
                resynced: true,
                ..TickReport::default()
            };
        }

        let refresh = self.config.refresh_rate_ms;
        let steps = idle / refresh;
        let mut edges = 0;
        for _ in 0..steps {
            self.time_ms_elapsed += refresh;
            let elapsed = self.time_ms_elapsed;
            for pulse in self.pulses.values() {
                if let Pulse::Recorder(handle) = pulse {
                    handle.update(elapsed);
                }
            }
            for (id, pulse) in &mut self.pulses {
                if let Pulse::Clock(clock) = pulse {
                    for edge in clock.update(elapsed) {
                        edges += 1;
                        on_edge(*id, edge);
                    }
                }
            }
        }
        self.last_update_time += steps * refresh;
        TickReport {
            steps,
            edges,
            resynced: false,
        }
    }

    fn insert(&mut self, pulse: Pulse) -> PulseId {
        let id = PulseId(self.next_pulse);
        self.next_pulse += 1;
        self.pulses.insert(id, pulse);
        id
    }
}

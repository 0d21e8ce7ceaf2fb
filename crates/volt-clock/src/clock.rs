// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Periodic square-wave sources.

use core::fmt;

use thiserror::Error;
use tracing::trace;
use volt_core::LogicValue;

/// Errors raised while building clocks or an oscillator.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// A clock needs a strictly positive half-period.
    #[error("clock interval must be greater than zero")]
    ZeroInterval,
    /// The oscillator cannot step time by zero milliseconds.
    #[error("oscillator refresh rate must be greater than zero")]
    ZeroRefreshRate,
}

/// Level of a clock output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Signal {
    /// Output high.
    High,
    /// Output low.
    #[default]
    Low,
}

impl Signal {
    /// The opposite level.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::High => Self::Low,
            Self::Low => Self::High,
        }
    }

    /// `+1` for high, `-1` for low.
    pub const fn phase(self) -> i8 {
        match self {
            Self::High => 1,
            Self::Low => -1,
        }
    }

    /// The logic level this signal drives.
    pub const fn value(self) -> LogicValue {
        match self {
            Self::High => LogicValue::True,
            Self::Low => LogicValue::False,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "high",
            Self::Low => "low",
        })
    }
}

/// One toggle produced by [`ClockSource::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockEdge {
    /// Level after the toggle.
    pub signal: Signal,
    /// Simulated time at which the toggle was scheduled, in milliseconds.
    pub at_ms: u64,
}

type ChangeCallback = Box<dyn FnMut(Signal)>;

/// A square-wave generator that toggles every `interval_ms` of simulated time.
///
/// Toggle times lie on a fixed grid anchored at the last reset, so the phase
/// survives `stop`/`start` and [`ClockSource::reset`].
pub struct ClockSource {
    name: String,
    interval_ms: u64,
    signal: Signal,
    last_update: i64,
    last_seen: i64,
    stopped: bool,
    on_change: Vec<ChangeCallback>,
}

impl ClockSource {
    /// Builds a running clock that starts low at elapsed time zero.
    ///
    /// # Errors
    /// Returns [`ClockError::ZeroInterval`] for a zero interval.
    pub fn new(name: impl Into<String>, interval_ms: u64) -> Result<Self, ClockError> {
        if interval_ms == 0 {
            return Err(ClockError::ZeroInterval);
        }
        Ok(Self {
            name: name.into(),
            interval_ms,
            signal: Signal::Low,
            last_update: 0,
            last_seen: 0,
            stopped: false,
            on_change: Vec::new(),
        })
    }

    /// Overrides the starting level.
    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = signal;
        self
    }

    /// Clock name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Half-period in milliseconds.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Current level.
    pub fn signal(&self) -> Signal {
        self.signal
    }

    /// Current level as a logic value.
    pub fn value(&self) -> LogicValue {
        self.signal.value()
    }

    /// `false` while stopped.
    pub fn is_running(&self) -> bool {
        !self.stopped
    }

    /// Grid point of the most recent (possibly suppressed) toggle. Negative
    /// right after a reset that carried a partial period over.
    pub fn last_update(&self) -> i64 {
        self.last_update
    }

    /// Subscribes to toggles. Callbacks run in registration order.
    pub fn on_change<F>(&mut self, callback: F)
    where
        F: FnMut(Signal) + 'static,
    {
        self.on_change.push(Box::new(callback));
    }

    /// Resumes toggling on the existing grid.
    pub fn start(&mut self) {
        self.stopped = false;
    }

    /// Suppresses toggles; the grid keeps advancing underneath.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Catches the clock up to `elapsed_ms`, toggling once per whole interval
    /// crossed and returning the toggles in order.
    pub fn update(&mut self, elapsed_ms: u64) -> Vec<ClockEdge> {
        let now = signed(elapsed_ms);
        let interval = signed(self.interval_ms);
        self.last_seen = now;
        let mut edges = Vec::new();
        if self.stopped {
            let periods = (now - self.last_update).div_euclid(interval);
            if periods > 0 {
                self.last_update += periods * interval;
            }
            return edges;
        }
        while now >= self.last_update + interval {
            self.last_update += interval;
            self.signal = self.signal.toggled();
            let at_ms = u64::try_from(self.last_update).unwrap_or(0);
            trace!(clock = %self.name, signal = %self.signal, at_ms, "clock toggle");
            for callback in &mut self.on_change {
                callback(self.signal);
            }
            edges.push(ClockEdge {
                signal: self.signal,
                at_ms,
            });
        }
        edges
    }

    /// Re-anchors the grid at `elapsed_ms`, keeping the progress already made
    /// through the current period. The level is left unchanged.
    pub fn reset(&mut self, elapsed_ms: u64) {
        let now = signed(elapsed_ms);
        let progress = (self.last_seen - self.last_update).rem_euclid(signed(self.interval_ms));
        self.last_update = now - progress;
        self.last_seen = now;
    }
}

impl fmt::Debug for ClockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockSource")
            .field("name", &self.name)
            .field("interval_ms", &self.interval_ms)
            .field("signal", &self.signal)
            .field("last_update", &self.last_update)
            .field("stopped", &self.stopped)
            .field("listeners", &self.on_change.len())
            .finish()
    }
}

fn signed(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn clock(interval: u64) -> ClockSource {
        ClockSource::new("clk", interval).expect("non-zero interval")
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert_eq!(ClockSource::new("clk", 0).err(), Some(ClockError::ZeroInterval));
    }

    #[test]
    fn toggles_once_per_whole_interval() {
        let mut clk = clock(1000);
        let edges = clk.update(2500);
        assert_eq!(
            edges,
            [
                ClockEdge { signal: Signal::High, at_ms: 1000 },
                ClockEdge { signal: Signal::Low, at_ms: 2000 },
            ]
        );
        assert_eq!(clk.signal(), Signal::Low);
        assert_eq!(clk.last_update(), 2000);
        assert!(clk.update(2999).is_empty());
        assert_eq!(clk.update(3000).len(), 1);
    }

    #[test]
    fn listeners_see_each_toggle() {
        let mut clk = clock(10);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        clk.on_change(move |s| sink.borrow_mut().push(s.phase()));
        let _ = clk.update(35);
        assert_eq!(*seen.borrow(), [1, -1, 1]);
    }

    #[test]
    fn stopped_clock_keeps_its_grid() {
        let mut clk = clock(100);
        let _ = clk.update(150);
        assert_eq!(clk.signal(), Signal::High);

        clk.stop();
        assert!(clk.update(420).is_empty());
        assert_eq!(clk.signal(), Signal::High);
        assert_eq!(clk.last_update(), 400);

        clk.start();
        let edges = clk.update(510);
        assert_eq!(edges, [ClockEdge { signal: Signal::Low, at_ms: 500 }]);
    }

    #[test]
    fn reset_preserves_partial_period() {
        let mut clk = clock(100);
        let _ = clk.update(1030);
        let level = clk.signal();

        // 30ms into the current period; re-anchoring at 0 keeps that offset.
        clk.reset(0);
        assert_eq!(clk.last_update(), -30);
        assert_eq!(clk.signal(), level);
        assert!(clk.update(69).is_empty());
        assert_eq!(clk.update(70).len(), 1);
    }
}

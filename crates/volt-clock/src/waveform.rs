// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rolling waveform capture for monitored nodes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use volt_core::LogicValue;

/// A level change observed at `at_ms`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Simulated time of the change.
    pub at_ms: u64,
    /// Level from `at_ms` on.
    pub value: LogicValue,
}

/// A constant-level stretch `[start_ms, end_ms)` ready for drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Inclusive start.
    pub start_ms: u64,
    /// Exclusive end.
    pub end_ms: u64,
    /// Level held across the segment.
    pub value: LogicValue,
}

/// Level history of one signal over the trailing `window_ms`.
///
/// Only changes are stored. The oldest retained sample may predate the window
/// start; it supplies the level at the left edge.
#[derive(Clone, Debug)]
pub struct WaveformRecorder {
    name: String,
    window_ms: u64,
    now_ms: u64,
    samples: VecDeque<Sample>,
}

impl WaveformRecorder {
    /// Empty recorder positioned at `now_ms`.
    pub fn new(name: impl Into<String>, window_ms: u64, now_ms: u64) -> Self {
        Self {
            name: name.into(),
            window_ms,
            now_ms,
            samples: VecDeque::new(),
        }
    }

    /// Name of the monitored signal.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Width of the retained window.
    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Simulated time the recorder was last advanced to.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Level most recently recorded, if any.
    pub fn current(&self) -> Option<LogicValue> {
        self.samples.back().map(|s| s.value)
    }

    /// Stored changes, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Notes `value` at the current time. Repeats of the current level are
    /// dropped; a second change at the same instant replaces the first.
    pub fn record(&mut self, value: LogicValue) {
        match self.samples.back_mut() {
            Some(last) if last.value == value => return,
            Some(last) if last.at_ms == self.now_ms => {
                last.value = value;
                self.coalesce_tail();
                return;
            }
            _ => {}
        }
        self.samples.push_back(Sample {
            at_ms: self.now_ms,
            value,
        });
    }

    /// Moves the recorder's clock forward and drops history that fell out of
    /// the window.
    pub fn update(&mut self, elapsed_ms: u64) {
        self.now_ms = self.now_ms.max(elapsed_ms);
        self.trim();
    }

    /// Restarts history at `elapsed_ms`, seeded with the current level.
    pub fn reset(&mut self, elapsed_ms: u64) {
        let current = self.current();
        self.samples.clear();
        self.now_ms = elapsed_ms;
        if let Some(value) = current {
            self.samples.push_back(Sample {
                at_ms: elapsed_ms,
                value,
            });
        }
    }

    /// Constant-level segments covering the visible window, oldest first.
    pub fn segments(&self) -> Vec<Segment> {
        let window_start = self.window_start();
        let mut out = Vec::with_capacity(self.samples.len());
        let mut iter = self.samples.iter().peekable();
        while let Some(sample) = iter.next() {
            let end_ms = iter.peek().map_or(self.now_ms, |next| next.at_ms);
            let start_ms = sample.at_ms.max(window_start);
            if end_ms > start_ms {
                out.push(Segment {
                    start_ms,
                    end_ms,
                    value: sample.value,
                });
            }
        }
        out
    }

    fn window_start(&self) -> u64 {
        self.now_ms.saturating_sub(self.window_ms)
    }

    fn trim(&mut self) {
        let window_start = self.window_start();
        while self.samples.len() >= 2 && self.samples[1].at_ms <= window_start {
            self.samples.pop_front();
        }
    }

    fn coalesce_tail(&mut self) {
        let len = self.samples.len();
        if len >= 2 && self.samples[len - 2].value == self.samples[len - 1].value {
            self.samples.pop_back();
        }
    }
}

/// Shared handle to a [`WaveformRecorder`].
///
/// One clone lives in the oscillator (which advances time), another in the
/// node listener (which records levels), and the caller keeps a third to read
/// the result.
#[derive(Clone, Debug)]
pub struct WaveformHandle(Rc<RefCell<WaveformRecorder>>);

impl WaveformHandle {
    /// Wraps a fresh recorder.
    pub fn new(name: impl Into<String>, window_ms: u64, now_ms: u64) -> Self {
        Self(Rc::new(RefCell::new(WaveformRecorder::new(
            name, window_ms, now_ms,
        ))))
    }

    /// See [`WaveformRecorder::record`].
    pub fn record(&self, value: LogicValue) {
        self.0.borrow_mut().record(value);
    }

    /// See [`WaveformRecorder::update`].
    pub fn update(&self, elapsed_ms: u64) {
        self.0.borrow_mut().update(elapsed_ms);
    }

    /// See [`WaveformRecorder::reset`].
    pub fn reset(&self, elapsed_ms: u64) {
        self.0.borrow_mut().reset(elapsed_ms);
    }

    /// See [`WaveformRecorder::segments`].
    pub fn segments(&self) -> Vec<Segment> {
        self.0.borrow().segments()
    }

    /// Copy of the stored changes.
    pub fn samples(&self) -> Vec<Sample> {
        self.0.borrow().samples().copied().collect()
    }

    /// Name of the monitored signal.
    pub fn name(&self) -> String {
        self.0.borrow().name().to_owned()
    }

    /// Level most recently recorded.
    pub fn current(&self) -> Option<LogicValue> {
        self.0.borrow().current()
    }
}

//! Event model - edge-detected boolean conditions.

use std::cell::Cell;
use std::rc::Rc;

/// A boolean condition sampled once per cycle.
///
/// Events are cheap to clone; clones share the same condition. Combined
/// events always sample both operands so that one-shot sources are
/// consumed consistently.
#[derive(Clone)]
pub struct Event {
    condition: Rc<dyn Fn() -> bool>,
}

impl Event {
    /// Create an event from a predicate.
    pub fn new(condition: impl Fn() -> bool + 'static) -> Self {
        Self {
            condition: Rc::new(condition),
        }
    }

    /// Event that is always true.
    pub fn always() -> Self {
        Self::new(|| true)
    }

    /// Event that is never true.
    pub fn never() -> Self {
        Self::new(|| false)
    }

    /// Evaluate the condition now.
    pub fn sample(&self) -> bool {
        (self.condition)()
    }

    /// True when both events are true.
    pub fn and(&self, other: &Event) -> Event {
        let (a, b) = (self.clone(), other.clone());
        Event::new(move || {
            let left = a.sample();
            let right = b.sample();
            left && right
        })
    }

    /// True when either event is true.
    pub fn or(&self, other: &Event) -> Event {
        let (a, b) = (self.clone(), other.clone());
        Event::new(move || {
            let left = a.sample();
            let right = b.sample();
            left || right
        })
    }

    /// True when this event is false.
    pub fn negate(&self) -> Event {
        let a = self.clone();
        Event::new(move || !a.sample())
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event").finish_non_exhaustive()
    }
}

/// Transition observed between two consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// No change
    Steady,
    /// false → true
    Rising,
    /// true → false
    Falling,
}

/// Tracks the previous sample of a condition.
///
/// The first previous sample is `false`, so a condition that starts true
/// reports a rising edge on its first update.
#[derive(Debug, Clone, Default)]
pub struct EdgeDetector {
    previous: bool,
}

impl EdgeDetector {
    /// Create a detector whose previous sample is `false`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new sample and report the transition.
    pub fn update(&mut self, value: bool) -> Edge {
        let edge = match (self.previous, value) {
            (false, true) => Edge::Rising,
            (true, false) => Edge::Falling,
            _ => Edge::Steady,
        };
        self.previous = value;
        edge
    }

    /// Last recorded sample.
    pub fn previous(&self) -> bool {
        self.previous
    }
}

/// A one-shot pulse source owned by client code.
///
/// After [`Signal::pulse`], the signal's event reads `true` for exactly one
/// sample and then returns to `false`. A pulse is consumed by whichever
/// sampler reads it first.
#[derive(Debug, Clone, Default)]
pub struct Signal {
    pending: Rc<Cell<bool>>,
}

impl Signal {
    /// Create an idle signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal for the next sample.
    pub fn pulse(&self) {
        self.pending.set(true);
    }

    /// Whether a pulse is waiting to be sampled.
    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    /// Event view of this signal.
    pub fn event(&self) -> Event {
        let pending = self.pending.clone();
        Event::new(move || pending.replace(false))
    }
}

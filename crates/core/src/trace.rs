//! Diagnostic trace protocol.
//!
//! Each traced resource writes at most one symbol per cycle: its letter
//! followed by `d` when its default task ran, or by a test number when a
//! test task ran. A test symbol overrides a default symbol in the same
//! cycle and the last test symbol written wins. At the end of the cycle
//! the symbols are joined, in channel registration order, into a frame
//! such as `A1BdCd`.

use crate::functional::{run, run_once, FunctionalTask};
use crate::id::ResourceId;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Longest run of identical frames collapsed into one compressed line.
pub const REPEATED_FRAME_LIMIT: usize = 250;

/// What ran on a resource during one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symbol {
    /// The resource's default task ran
    Default,
    /// Test task N ran
    Test(u8),
}

impl Symbol {
    fn render(self, letter: char, out: &mut String) {
        out.push(letter);
        match self {
            Symbol::Default => out.push('d'),
            Symbol::Test(n) => out.push_str(&n.to_string()),
        }
    }
}

/// One line of a recorded trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceLine {
    /// Symbols written during one cycle
    Frame(String),
    /// Free-form marker such as `START testSequence`
    Note(String),
}

#[derive(Default)]
struct TraceState {
    letters: Vec<char>,
    current: Vec<Option<Symbol>>,
    lines: Vec<TraceLine>,
}

/// Shared trace recorder.
///
/// Clones write into the same recording. The driver calls
/// [`Trace::end_cycle`] after each scheduler cycle.
#[derive(Clone, Default)]
pub struct Trace(Rc<RefCell<TraceState>>);

impl Trace {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a traced resource under `letter`.
    pub fn channel(&self, letter: char, resource: ResourceId) -> TraceChannel {
        let mut state = self.0.borrow_mut();
        if !state.letters.contains(&letter) {
            state.letters.push(letter);
            state.current.push(None);
        }
        TraceChannel {
            trace: self.clone(),
            letter,
            resource,
        }
    }

    /// Write a symbol for `letter` in the current cycle.
    pub fn emit(&self, letter: char, symbol: Symbol) {
        let mut state = self.0.borrow_mut();
        let Some(slot) = state.letters.iter().position(|&l| l == letter) else {
            tracing::warn!("Trace symbol for unregistered channel '{}'", letter);
            return;
        };
        let current = &mut state.current[slot];
        match symbol {
            Symbol::Test(_) => *current = Some(symbol),
            Symbol::Default => {
                if current.is_none() {
                    *current = Some(symbol);
                }
            }
        }
    }

    /// Insert a marker line.
    pub fn note(&self, text: impl Into<String>) {
        self.0.borrow_mut().lines.push(TraceLine::Note(text.into()));
    }

    /// Close the current cycle. Returns the frame if anything was written.
    pub fn end_cycle(&self) -> Option<String> {
        let mut state = self.0.borrow_mut();
        let TraceState {
            letters,
            current,
            lines,
        } = &mut *state;

        let mut frame = String::new();
        for (letter, slot) in letters.iter().zip(current.iter_mut()) {
            if let Some(symbol) = slot.take() {
                symbol.render(*letter, &mut frame);
            }
        }

        if frame.is_empty() {
            return None;
        }
        lines.push(TraceLine::Frame(frame.clone()));
        Some(frame)
    }

    /// All recorded lines.
    pub fn lines(&self) -> Vec<TraceLine> {
        self.0.borrow().lines.clone()
    }

    /// Recorded frames, without notes.
    pub fn frames(&self) -> Vec<String> {
        self.0
            .borrow()
            .lines
            .iter()
            .filter_map(|line| match line {
                TraceLine::Frame(f) => Some(f.clone()),
                TraceLine::Note(_) => None,
            })
            .collect()
    }

    /// Drop everything recorded so far. Channels stay registered.
    pub fn clear(&self) {
        let mut state = self.0.borrow_mut();
        state.lines.clear();
        state.current.iter_mut().for_each(|slot| *slot = None);
    }

    /// Frames concatenated, with notes on their own lines.
    pub fn render(&self) -> String {
        let state = self.0.borrow();
        let mut out = String::new();
        for line in &state.lines {
            match line {
                TraceLine::Frame(frame) => out.push_str(frame),
                TraceLine::Note(note) => push_note(&mut out, note),
            }
        }
        out
    }

    /// One line per run of identical frames: `<frame> --- <n> times`.
    ///
    /// Runs are split every [`REPEATED_FRAME_LIMIT`] frames.
    pub fn render_compressed(&self) -> String {
        self.render_compressed_with_limit(REPEATED_FRAME_LIMIT)
    }

    /// Like [`Trace::render_compressed`], splitting runs every `limit` frames.
    pub fn render_compressed_with_limit(&self, limit: usize) -> String {
        let limit = limit.max(1);
        let state = self.0.borrow();
        let mut out = String::new();
        let mut run: Option<(&str, usize)> = None;

        for line in &state.lines {
            match line {
                TraceLine::Frame(frame) => match run {
                    Some((current, count)) if current == frame.as_str() && count < limit => {
                        run = Some((current, count + 1))
                    }
                    _ => {
                        flush_run(&mut out, run.take());
                        run = Some((frame.as_str(), 1));
                    }
                },
                TraceLine::Note(note) => {
                    flush_run(&mut out, run.take());
                    push_note(&mut out, note);
                }
            }
        }
        flush_run(&mut out, run);
        out
    }
}

fn push_note(out: &mut String, note: &str) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(note);
    out.push('\n');
}

fn flush_run(out: &mut String, run: Option<(&str, usize)>) {
    match run {
        Some((frame, 1)) => {
            out.push_str(frame);
            out.push('\n');
        }
        Some((frame, count)) => {
            out.push_str(&format!("{} --- {} times\n", frame, count));
        }
        None => {}
    }
}

/// A traced resource that hands out tasks writing to the trace.
#[derive(Clone)]
pub struct TraceChannel {
    trace: Trace,
    letter: char,
    resource: ResourceId,
}

impl TraceChannel {
    /// Resource this channel traces.
    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    /// Letter identifying the resource in frames.
    pub fn letter(&self) -> char {
        self.letter
    }

    /// Task suitable as the resource's default: writes `<letter>d` every cycle.
    pub fn default_task(&self) -> FunctionalTask {
        let (trace, letter) = (self.trace.clone(), self.letter);
        run(format!("{}Default", letter), self.resource, move || {
            trace.emit(letter, Symbol::Default)
        })
    }

    /// Writes `<letter><n>` once and finishes.
    pub fn set_test(&self, n: u8) -> FunctionalTask {
        let (trace, letter) = (self.trace.clone(), self.letter);
        run_once(format!("{}SetTest{}", letter, n), self.resource, move || {
            trace.emit(letter, Symbol::Test(n))
        })
    }

    /// Writes `<letter><n>` every cycle until `duration` has elapsed.
    ///
    /// A zero duration writes exactly once.
    pub fn test_duration(&self, n: u8, duration: Duration) -> FunctionalTask {
        let (trace, letter) = (self.trace.clone(), self.letter);
        let started = Rc::new(Cell::new(Duration::ZERO));
        let start = started.clone();

        FunctionalTask::new(format!("{}Test{}", letter, n))
            .requires(self.resource)
            .on_initialize(move |ctx| start.set(ctx.now()))
            .on_execute(move |_| trace.emit(letter, Symbol::Test(n)))
            .finished_when(move |ctx| ctx.now().saturating_sub(started.get()) >= duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Task, TaskContext};

    fn recorder() -> (Trace, TraceChannel, TraceChannel) {
        let trace = Trace::new();
        let a = trace.channel('A', ResourceId::from_index(0));
        let b = trace.channel('B', ResourceId::from_index(1));
        (trace, a, b)
    }

    #[test]
    fn test_frame_order_follows_registration() {
        let (trace, _, _) = recorder();

        trace.emit('B', Symbol::Default);
        trace.emit('A', Symbol::Test(1));
        assert_eq!(trace.end_cycle().as_deref(), Some("A1Bd"));
        assert_eq!(trace.end_cycle(), None);
    }

    #[test]
    fn test_test_symbol_overrides_default() {
        let (trace, _, _) = recorder();

        trace.emit('A', Symbol::Test(1));
        trace.emit('A', Symbol::Default);
        trace.emit('B', Symbol::Default);
        trace.emit('B', Symbol::Test(2));
        trace.emit('B', Symbol::Test(3));
        assert_eq!(trace.end_cycle().as_deref(), Some("A1B3"));
    }

    #[test]
    fn test_render_with_notes() {
        let (trace, _, _) = recorder();

        trace.note("START test");
        trace.emit('A', Symbol::Default);
        trace.end_cycle();
        trace.emit('A', Symbol::Test(1));
        trace.end_cycle();
        trace.note("END test");

        assert_eq!(trace.render(), "START test\nAdA1\nEND test\n");
        assert_eq!(trace.frames(), vec!["Ad".to_string(), "A1".to_string()]);
    }

    #[test]
    fn test_render_compressed() {
        let (trace, _, _) = recorder();

        for _ in 0..3 {
            trace.emit('A', Symbol::Default);
            trace.end_cycle();
        }
        trace.emit('A', Symbol::Test(2));
        trace.end_cycle();

        assert_eq!(trace.render_compressed(), "Ad --- 3 times\nA2\n");
    }

    #[test]
    fn test_render_compressed_splits_long_runs() {
        let (trace, _, _) = recorder();

        for _ in 0..7 {
            trace.emit('A', Symbol::Default);
            trace.end_cycle();
        }

        assert_eq!(
            trace.render_compressed_with_limit(3),
            "Ad --- 3 times\nAd --- 3 times\nAd\n"
        );
        assert_eq!(trace.render_compressed(), "Ad --- 7 times\n");
    }

    #[test]
    fn test_channel_tasks_write_symbols() {
        let (trace, a, _) = recorder();
        let mut requests = Vec::new();
        let mut ctx = TaskContext::new(Duration::ZERO, 0, &[], &mut requests);

        let mut set = a.set_test(4);
        set.initialize(&mut ctx);
        assert!(set.is_finished(&ctx));
        assert_eq!(trace.end_cycle().as_deref(), Some("A4"));

        let mut timed = a.test_duration(1, Duration::ZERO);
        timed.initialize(&mut ctx);
        timed.execute(&mut ctx);
        assert!(timed.is_finished(&ctx));
        assert!(timed.requirements().contains(a.resource()));
        assert_eq!(trace.end_cycle().as_deref(), Some("A1"));
    }
}

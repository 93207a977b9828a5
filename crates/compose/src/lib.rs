//! Interlock task composition.
//!
//! Composites are ordinary tasks that drive their children through the
//! same lifecycle contract the scheduler uses. Only the outermost task is
//! known to the scheduler; children never claim resources on their own
//! unless they are wrapped in a [`Proxy`].

#![warn(missing_docs)]

mod deadline;
mod ext;
mod parallel;
mod proxy;
mod race;
mod repeat;
mod sequence;
mod timeout;

#[cfg(test)]
mod testing;

pub use deadline::Deadline;
pub use ext::{Named, TaskExt};
pub use parallel::{ensure_disjoint, ParallelAll};
pub use proxy::Proxy;
pub use race::RaceAny;
pub use repeat::Repeat;
pub use sequence::Sequence;
pub use timeout::Timeout;

//! Recorded walks through a graph.
//!
//! A [`Transition`] is one step (the arc taken and the node it lands on); a
//! [`Path`] is a stack of them, grown while descending and popped while
//! backtracking.

pub mod stack;
pub mod transition;

pub use stack::Path;
pub use transition::Transition;

//! `Path`: a stack of transitions recording a walk from some start node.

use core::fmt;
use serde::{Deserialize, Serialize};

use super::Transition;

/// A stack-like sequence of [`Transition`]s.
///
/// The first element is usually the synthetic root transition (root arc, root
/// node); each descent pushes one more step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path<A, N> {
    steps: Vec<Transition<A, N>>,
}

impl<A: Copy, N: Copy> Path<A, N> {
    /// Creates an empty path.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Creates a path holding a single transition.
    pub fn from_transition(step: Transition<A, N>) -> Self {
        Self { steps: vec![step] }
    }

    /// Creates a path starting with `arc -> target`.
    pub fn starting_at(arc: A, target: N) -> Self {
        Self::from_transition(Transition::new(arc, target))
    }

    /// Shrinks the path to a single first step `arc -> target`.
    pub fn reset(&mut self, arc: A, target: N) {
        self.steps.clear();
        self.steps.push(Transition::new(arc, target));
    }

    /// Appends a step.
    #[inline]
    pub fn push(&mut self, step: Transition<A, N>) {
        self.steps.push(step);
    }

    /// Appends `arc -> target`.
    #[inline]
    pub fn push_parts(&mut self, arc: A, target: N) {
        self.steps.push(Transition::new(arc, target));
    }

    /// Removes and returns the last step.
    #[inline]
    pub fn pop(&mut self) -> Option<Transition<A, N>> {
        self.steps.pop()
    }

    /// The last step.
    #[inline]
    pub fn last(&self) -> Option<&Transition<A, N>> {
        self.steps.last()
    }

    /// The last step, mutably.
    #[inline]
    pub fn last_mut(&mut self) -> Option<&mut Transition<A, N>> {
        self.steps.last_mut()
    }

    /// Number of steps.
    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the path holds no steps.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Removes every step.
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Keeps the first `len` steps.
    pub fn truncate(&mut self, len: usize) {
        self.steps.truncate(len);
    }

    /// Reserves room for `additional` more steps.
    pub fn reserve(&mut self, additional: usize) {
        self.steps.reserve(additional);
    }

    /// Iterates over the steps, first to last.
    pub fn iter(&self) -> core::slice::Iter<'_, Transition<A, N>> {
        self.steps.iter()
    }

    /// Iterates over the visited nodes, first to last.
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = N> + '_ {
        self.steps.iter().map(|t| t.target)
    }

    /// The steps as a slice.
    pub fn as_slice(&self) -> &[Transition<A, N>] {
        &self.steps
    }
}

impl<A: Copy, N: Copy> Default for Path<A, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, A, N> IntoIterator for &'a Path<A, N> {
    type Item = &'a Transition<A, N>;
    type IntoIter = core::slice::Iter<'a, Transition<A, N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl<A: fmt::Display, N: fmt::Display> fmt::Display for Path<A, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

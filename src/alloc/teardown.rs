//! Live-slot enumeration for arena teardown.
//!
//! A slab hands slots out in address order inside each block and threads freed
//! slots onto an intrusive list. At teardown the live set is "every handed-out
//! slot not on the free list". This module computes that set from plain
//! addresses so it can be tested without touching real memory.

/// A contiguous run of slots that have been handed out at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotSpan {
    /// Address of the first slot.
    pub(crate) first: usize,
    /// Number of slots handed out from this span.
    pub(crate) count: usize,
}

/// Iterator over the addresses of live slots.
///
/// `freed` must be sorted ascending; membership is tested by binary search.
pub(crate) struct LiveSlots<'a> {
    spans: core::slice::Iter<'a, SlotSpan>,
    stride: usize,
    freed: &'a [usize],
    next: usize,
    remaining: usize,
}

impl<'a> LiveSlots<'a> {
    pub(crate) fn new(spans: &'a [SlotSpan], stride: usize, freed: &'a [usize]) -> Self {
        debug_assert!(stride > 0, "slot stride must be non-zero");
        debug_assert!(freed.windows(2).all(|w| w[0] < w[1]), "freed set must be sorted and unique");
        Self {
            spans: spans.iter(),
            stride,
            freed,
            next: 0,
            remaining: 0,
        }
    }
}

impl Iterator for LiveSlots<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            while self.remaining == 0 {
                let span = self.spans.next()?;
                self.next = span.first;
                self.remaining = span.count;
            }
            let addr = self.next;
            self.next += self.stride;
            self.remaining -= 1;
            if self.freed.binary_search(&addr).is_err() {
                return Some(addr);
            }
        }
    }
}

/// Sorts a collected free list into the lookup form `LiveSlots` expects.
pub(crate) fn sorted_free_set(mut freed: Vec<usize>) -> Vec<usize> {
    freed.sort_unstable();
    debug_assert!(freed.windows(2).all(|w| w[0] != w[1]), "slot freed twice");
    freed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_frees_yields_every_slot() {
        let spans = [SlotSpan { first: 1000, count: 3 }, SlotSpan { first: 4000, count: 2 }];
        let live: Vec<_> = LiveSlots::new(&spans, 16, &[]).collect();
        assert_eq!(live, vec![1000, 1016, 1032, 4000, 4016]);
    }

    #[test]
    fn freed_addresses_are_skipped_across_blocks() {
        let spans = [SlotSpan { first: 4000, count: 4 }, SlotSpan { first: 1000, count: 4 }];
        let freed = sorted_free_set(vec![4008, 1000, 1024]);
        let live: Vec<_> = LiveSlots::new(&spans, 8, &freed).collect();
        assert_eq!(live, vec![4000, 4016, 4024, 1008, 1016]);
    }

    #[test]
    fn everything_freed_yields_nothing() {
        let spans = [SlotSpan { first: 64, count: 2 }];
        let freed = sorted_free_set(vec![72, 64]);
        assert_eq!(LiveSlots::new(&spans, 8, &freed).count(), 0);
    }

    #[test]
    fn empty_spans_are_skipped() {
        let spans = [
            SlotSpan { first: 64, count: 0 },
            SlotSpan { first: 128, count: 1 },
            SlotSpan { first: 256, count: 0 },
        ];
        let live: Vec<_> = LiveSlots::new(&spans, 8, &[]).collect();
        assert_eq!(live, vec![128]);
    }
}

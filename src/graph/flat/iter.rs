//! Chain-walking iterators for [`FlatTree`](super::FlatTree).

use core::iter::FusedIterator;

use super::ArcRecord;
use crate::graph::handle::ArcId;

macro_rules! chain_iter {
    ($(#[$meta:meta])* $name:ident, $link:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name<'a, A> {
            arcs: &'a [ArcRecord<A>],
            next: ArcId,
            remaining: usize,
        }

        impl<'a, A> $name<'a, A> {
            pub(super) fn new(arcs: &'a [ArcRecord<A>], head: ArcId, len: u32) -> Self {
                Self {
                    arcs,
                    next: head,
                    remaining: len as usize,
                }
            }
        }

        impl<A> Iterator for $name<'_, A> {
            type Item = ArcId;

            fn next(&mut self) -> Option<ArcId> {
                if self.remaining == 0 {
                    return None;
                }
                let id = self.next;
                let record = self.arcs.get(id.slot()?)?;
                self.next = record.$link;
                self.remaining -= 1;
                Some(id)
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                (0, Some(self.remaining))
            }
        }

        impl<A> FusedIterator for $name<'_, A> {}
    };
}

chain_iter!(
    /// Arcs leaving a node, oldest first, following `next_out`.
    OutArcs,
    next_out
);

chain_iter!(
    /// Arcs entering a node, oldest first, following `next_in`.
    InArcs,
    next_in
);

//! `SlabArena`: a typed slab allocator with stable addresses.
//!
//! Memory is requested from the OS in page-multiple blocks and carved into
//! fixed-size slots for exactly one payload type. Freed slots are threaded onto
//! an intrusive free list and reused LIFO.
//!
//! Two layers are exposed:
//! - a raw layer (`allocate` / `deallocate`) handing out uninitialised slots;
//! - a keyed layer (`insert` / `get` / `remove`) handing out [`SlabKey`]s that
//!   carry a generation, so a key to a freed (or reused) slot is detected.
//!
//! # Performance
//! - `allocate` / `insert`: O(1) (one OS call per block)
//! - `deallocate` / `remove`: O(1)
//! - `get`: O(log blocks) membership check plus a generation compare
//! - `drop`: O(slots + free log free) when `T` needs dropping, else O(blocks)

use core::alloc::Layout;
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop};
use core::ptr::{self, NonNull};
use std::alloc::handle_alloc_error;
use std::fmt;

use tracing::debug;

use crate::alloc::teardown::{sorted_free_set, LiveSlots, SlotSpan};
use crate::allocator::constants::PAGE_SIZE;
use crate::allocator::syscall;
use crate::config::SlabConfig;

/// A generation-tagged reference to a slot of some [`SlabArena`].
///
/// Keys are plain values: they do not borrow the arena and stay `Copy`.
/// Equality is by address and generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlabKey {
    addr: usize,
    generation: u32,
}

impl SlabKey {
    /// The key that never resolves.
    pub const INVALID: Self = Self { addr: 0, generation: 0 };

    /// Slot address this key points at.
    #[inline]
    pub fn addr(self) -> usize {
        self.addr
    }

    /// Generation the slot had when the key was issued.
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Returns `true` for [`SlabKey::INVALID`].
    #[inline]
    pub fn is_invalid(self) -> bool {
        self.addr == 0
    }
}

impl fmt::Debug for SlabKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invalid() {
            f.write_str("SlabKey(*)")
        } else {
            write!(f, "SlabKey({:#x}@{})", self.addr, self.generation)
        }
    }
}

/// The payload shares storage with the free-list link.
#[repr(C)]
union SlotBody<T> {
    value: ManuallyDrop<T>,
    next: *mut Slot<T>,
}

/// `body` sits at offset 0, so a slot pointer is also a payload pointer.
#[repr(C)]
struct Slot<T> {
    body: SlotBody<T>,
    generation: u32,
    occupied: bool,
}

struct Block {
    base: NonNull<u8>,
    ordinal_base: usize,
}

/// A typed slab allocator for `T`.
pub struct SlabArena<T> {
    blocks: Vec<Block>,
    /// `(base address, block index)` sorted by address.
    by_address: Vec<(usize, usize)>,
    cursor: *mut Slot<T>,
    end: *mut Slot<T>,
    free: *mut Slot<T>,
    len: usize,
    block_layout: Layout,
    slots_per_block: usize,
    _marker: PhantomData<T>,
}

// SAFETY: the arena exclusively owns every slot; moving it moves ownership of
// the `T`s it holds.
unsafe impl<T: Send> Send for SlabArena<T> {}
// SAFETY: `&SlabArena` only hands out `&T`.
unsafe impl<T: Sync> Sync for SlabArena<T> {}

impl<T> SlabArena<T> {
    const STRIDE: usize = mem::size_of::<Slot<T>>();

    /// Creates an empty arena with the default [`SlabConfig`]. No memory is
    /// mapped until the first allocation.
    pub fn new() -> Self {
        Self::with_config(SlabConfig::default())
    }

    /// Creates an empty arena.
    ///
    /// # Panics
    /// Panics if `T` requires an alignment larger than a page.
    pub fn with_config(config: SlabConfig) -> Self {
        let os_page = syscall::page_size().max(PAGE_SIZE);
        let page = if os_page.is_power_of_two() { os_page } else { PAGE_SIZE };
        assert!(
            mem::align_of::<Slot<T>>() <= page,
            "slab payload alignment {} exceeds the page size",
            mem::align_of::<T>()
        );

        let needed = Self::STRIDE.saturating_mul(config.min_slots_per_block.max(1));
        let block_size = needed.div_ceil(page).max(1).saturating_mul(page);
        let block_layout = match Layout::from_size_align(block_size, page) {
            Ok(layout) => layout,
            Err(_) => panic!("slab block of {block_size} bytes exceeds the address space"),
        };

        Self {
            blocks: Vec::new(),
            by_address: Vec::new(),
            cursor: ptr::null_mut(),
            end: ptr::null_mut(),
            free: ptr::null_mut(),
            len: 0,
            block_layout,
            slots_per_block: block_size / Self::STRIDE,
            _marker: PhantomData,
        }
    }

    /// Number of live slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no slot is live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of blocks mapped so far.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Slots carved out of every block.
    #[inline]
    pub fn slots_per_block(&self) -> usize {
        self.slots_per_block
    }

    /// Size in bytes of every block.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_layout.size()
    }

    /// Total bytes mapped from the OS.
    #[inline]
    pub fn memory_size(&self) -> usize {
        self.blocks.len() * self.block_layout.size()
    }

    /// Returns an uninitialised slot.
    ///
    /// # Safety
    /// The caller must write a valid `T` into the slot before the arena is
    /// dropped, or give it back with [`deallocate`](Self::deallocate). The
    /// arena drops every slot that is not on its free list at teardown.
    pub unsafe fn allocate(&mut self) -> NonNull<T> {
        let slot = self.allocate_slot();
        // SAFETY: `allocate_slot` never returns null.
        unsafe { NonNull::new_unchecked(slot.cast::<T>()) }
    }

    /// Pushes a slot onto the free list. The payload is NOT dropped.
    ///
    /// # Safety
    /// `ptr` must come from [`allocate`](Self::allocate) on this arena and must
    /// not have been deallocated since. Any payload it holds is leaked unless
    /// the caller dropped it first.
    pub unsafe fn deallocate(&mut self, ptr: NonNull<T>) {
        debug_assert!(self.locate(ptr.as_ptr() as usize).is_some(), "foreign slab pointer");
        // SAFETY: caller guarantees `ptr` is a live slot of this arena.
        unsafe { self.release(ptr.as_ptr().cast::<Slot<T>>()) }
    }

    /// Moves `value` into a fresh slot.
    pub fn insert(&mut self, value: T) -> SlabKey {
        let slot = self.allocate_slot();
        // SAFETY: `slot` is a handed-out slot we own; the value field sits at offset 0.
        unsafe {
            slot.cast::<T>().write(value);
            SlabKey {
                addr: slot as usize,
                generation: (*slot).generation,
            }
        }
    }

    /// Returns `true` if `key` resolves to a live slot of this arena.
    #[inline]
    pub fn contains(&self, key: SlabKey) -> bool {
        self.resolve(key).is_some()
    }

    /// Shared access to the payload behind `key`.
    pub fn get(&self, key: SlabKey) -> Option<&T> {
        // SAFETY: `resolve` only returns occupied slots of this arena.
        self.resolve(key).map(|slot| unsafe { &*slot.cast::<T>() })
    }

    /// Exclusive access to the payload behind `key`.
    pub fn get_mut(&mut self, key: SlabKey) -> Option<&mut T> {
        // SAFETY: as in `get`, and `&mut self` guarantees uniqueness.
        self.resolve(key).map(|slot| unsafe { &mut *slot.cast::<T>() })
    }

    /// Moves the payload out and frees the slot. Later lookups with `key` fail.
    pub fn remove(&mut self, key: SlabKey) -> Option<T> {
        let slot = self.resolve(key)?;
        // SAFETY: the slot is occupied; after the read it is released without
        // dropping, so the value is moved exactly once.
        unsafe {
            let value = ptr::read(slot.cast::<T>());
            self.release(slot);
            Some(value)
        }
    }

    /// Dense number of the slot behind `key`, in `0..ordinal_bound()`.
    pub fn ordinal(&self, key: SlabKey) -> Option<usize> {
        self.resolve(key)?;
        let (block, index) = self.locate(key.addr)?;
        Some(self.blocks[block].ordinal_base + index)
    }

    /// One past the largest ordinal handed out so far.
    pub fn ordinal_bound(&self) -> usize {
        match self.blocks.len() {
            0 => 0,
            n => (n - 1) * self.slots_per_block + self.used_in(n - 1),
        }
    }

    /// Iterates over every live `(key, payload)` pair in block order.
    pub fn iter(&self) -> impl Iterator<Item = (SlabKey, &T)> + '_ {
        (0..self.blocks.len()).flat_map(move |block| {
            let first = self.blocks[block].base.as_ptr().cast::<Slot<T>>();
            (0..self.used_in(block)).filter_map(move |i| {
                // SAFETY: `i < used_in(block)`, so the slot header is initialised.
                unsafe {
                    let slot = first.add(i);
                    (*slot).occupied.then(|| {
                        (
                            SlabKey {
                                addr: slot as usize,
                                generation: (*slot).generation,
                            },
                            &*slot.cast::<T>(),
                        )
                    })
                }
            })
        })
    }

    fn allocate_slot(&mut self) -> *mut Slot<T> {
        let slot = if self.free.is_null() {
            if self.cursor == self.end {
                self.map_block();
            }
            let slot = self.cursor;
            // SAFETY: `cursor < end` after `map_block`; fresh slots start at generation 0.
            unsafe {
                self.cursor = self.cursor.add(1);
                ptr::addr_of_mut!((*slot).generation).write(0);
            }
            slot
        } else {
            let slot = self.free;
            // SAFETY: free-list slots store the next link in `body.next`.
            self.free = unsafe { (*slot).body.next };
            slot
        };
        // SAFETY: `slot` is inside a mapped block.
        unsafe { ptr::addr_of_mut!((*slot).occupied).write(true) };
        self.len += 1;
        slot
    }

    /// # Safety
    /// `slot` must be a handed-out slot of this arena that is not on the free list.
    unsafe fn release(&mut self, slot: *mut Slot<T>) {
        unsafe {
            (*slot).occupied = false;
            (*slot).generation = (*slot).generation.wrapping_add(1);
            ptr::addr_of_mut!((*slot).body.next).write(self.free);
        }
        self.free = slot;
        self.len -= 1;
    }

    fn map_block(&mut self) {
        // SAFETY: the block size is a non-zero page multiple.
        let base = unsafe { syscall::allocate_region(self.block_layout.size()) };
        let Some(base) = base.and_then(NonNull::new) else {
            handle_alloc_error(self.block_layout);
        };

        let index = self.blocks.len();
        self.blocks.push(Block {
            base,
            ordinal_base: index * self.slots_per_block,
        });
        let addr = base.as_ptr() as usize;
        let at = self.by_address.partition_point(|&(a, _)| a < addr);
        self.by_address.insert(at, (addr, index));

        self.cursor = base.as_ptr().cast::<Slot<T>>();
        // SAFETY: the block holds `slots_per_block` slots.
        self.end = unsafe { self.cursor.add(self.slots_per_block) };

        debug!(
            block_size = self.block_layout.size(),
            slots = self.slots_per_block,
            blocks = self.blocks.len(),
            "mapped slab block"
        );
    }

    /// Slots of `block` that have been handed out at least once.
    fn used_in(&self, block: usize) -> usize {
        if block + 1 == self.blocks.len() {
            (self.cursor as usize - self.blocks[block].base.as_ptr() as usize) / Self::STRIDE
        } else {
            self.slots_per_block
        }
    }

    /// Maps an address to `(block, slot index)` if it is a handed-out slot boundary.
    fn locate(&self, addr: usize) -> Option<(usize, usize)> {
        let at = self.by_address.partition_point(|&(a, _)| a <= addr);
        let (base, block) = *self.by_address.get(at.checked_sub(1)?)?;
        let offset = addr - base;
        if offset % Self::STRIDE != 0 {
            return None;
        }
        let index = offset / Self::STRIDE;
        (index < self.used_in(block)).then_some((block, index))
    }

    fn resolve(&self, key: SlabKey) -> Option<*mut Slot<T>> {
        if key.is_invalid() {
            return None;
        }
        self.locate(key.addr)?;
        let slot = key.addr as *mut Slot<T>;
        // SAFETY: `locate` proved the header was initialised when the slot was handed out.
        let live = unsafe { (*slot).occupied && (*slot).generation == key.generation };
        live.then_some(slot)
    }

    fn free_addresses(&self) -> Vec<usize> {
        let mut freed = Vec::new();
        let mut cur = self.free;
        while !cur.is_null() {
            freed.push(cur as usize);
            // SAFETY: free-list slots store the next link in `body.next`.
            cur = unsafe { (*cur).body.next };
        }
        freed
    }

    fn drop_live_slots(&mut self) {
        let freed = sorted_free_set(self.free_addresses());
        let spans: Vec<SlotSpan> = (0..self.blocks.len())
            .map(|block| SlotSpan {
                first: self.blocks[block].base.as_ptr() as usize,
                count: self.used_in(block),
            })
            .collect();
        for addr in LiveSlots::new(&spans, Self::STRIDE, &freed) {
            // SAFETY: handed out and not freed, so the slot holds an initialised `T`.
            unsafe { ptr::drop_in_place(addr as *mut T) };
        }
    }
}

impl<T> Default for SlabArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for SlabArena<T> {
    fn drop(&mut self) {
        if mem::needs_drop::<T>() && self.len > 0 {
            self.drop_live_slots();
        }
        for block in &self.blocks {
            // SAFETY: every block was mapped with exactly this size.
            unsafe { syscall::free_region(block.base.as_ptr(), self.block_layout.size()) };
        }
        if !self.blocks.is_empty() {
            debug!(blocks = self.blocks.len(), live = self.len, "released slab arena");
        }
    }
}

impl<T> fmt::Debug for SlabArena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlabArena")
            .field("len", &self.len)
            .field("blocks", &self.blocks.len())
            .field("slots_per_block", &self.slots_per_block)
            .finish()
    }
}

//! `Moves`: a fixed-capacity pool of untried moves.
//!
//! Stores up to `CAP` small `Copy` values inline, with no heap allocation.
//! Order is not meaningful: removal swaps the last element into the hole.
//!
//! The serialized form is `(count, bytes)`, where `bytes` is the raw byte
//! image of the first `count` elements. Unused capacity is never written.

use core::fmt;
use core::marker::PhantomData;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zerocopy::{AsBytes, FromBytes};

/// A fixed-capacity, unordered pool of moves.
#[derive(Clone, Copy)]
pub struct Moves<T, const CAP: usize> {
    items: [T; CAP],
    len: usize,
}

impl<T: Copy + Default, const CAP: usize> Moves<T, CAP> {
    /// An empty pool.
    pub fn new() -> Self {
        Self {
            items: [T::default(); CAP],
            len: 0,
        }
    }

    /// A full pool where slot `i` holds `generate(i)`.
    pub fn full(generate: impl FnMut(usize) -> T) -> Self {
        Self {
            items: core::array::from_fn(generate),
            len: CAP,
        }
    }

    /// A full pool from `generate`, shuffled with `rng`.
    pub fn shuffled<R: Rng + ?Sized>(generate: impl FnMut(usize) -> T, rng: &mut R) -> Self {
        let mut moves = Self::full(generate);
        moves.shuffle(rng);
        moves
    }

    /// Adds `value`.
    ///
    /// # Panics
    /// Panics if the pool is full.
    pub fn push(&mut self, value: T) {
        assert!(self.len < CAP, "moves pool is full (capacity {CAP})");
        self.items[self.len] = value;
        self.len += 1;
    }

    /// Number of moves held.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// The fixed capacity `CAP`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        CAP
    }

    /// `true` if no moves are left.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `true` if `len() == capacity()`.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == CAP
    }

    /// Removes every move.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// The move at position `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.as_slice().get(index).copied()
    }

    /// The move at position `0`.
    pub fn first(&self) -> Option<T> {
        self.get(0)
    }

    /// A uniformly random move, left in the pool.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<T> {
        self.as_slice().choose(rng).copied()
    }

    /// Removes and returns a uniformly random move.
    pub fn take_one<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let at = rng.gen_range(0..self.len);
        Some(self.swap_remove(at))
    }

    fn swap_remove(&mut self, at: usize) -> T {
        let value = self.items[at];
        self.len -= 1;
        self.items[at] = self.items[self.len];
        value
    }

    /// Shuffles the held moves in place.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.items[..self.len].shuffle(rng);
    }

    /// Iterates over the held moves.
    pub fn iter(&self) -> core::iter::Copied<core::slice::Iter<'_, T>> {
        self.as_slice().iter().copied()
    }

    /// The held moves as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.len]
    }
}

impl<T: Copy + Default + PartialEq, const CAP: usize> Moves<T, CAP> {
    /// `true` if `value` is held.
    pub fn contains(&self, value: T) -> bool {
        self.as_slice().contains(&value)
    }

    /// Removes one occurrence of `value`; returns whether it was present.
    pub fn remove(&mut self, value: T) -> bool {
        match self.as_slice().iter().position(|&m| m == value) {
            Some(at) => {
                self.swap_remove(at);
                true
            }
            None => false,
        }
    }
}

impl<T: Copy + Default, const CAP: usize> Default for Moves<T, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default + PartialEq, const CAP: usize> PartialEq for Moves<T, CAP> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Copy + Default + Eq, const CAP: usize> Eq for Moves<T, CAP> {}

impl<T: Copy + Default + fmt::Debug, const CAP: usize> fmt::Debug for Moves<T, CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<'a, T: Copy + Default, const CAP: usize> IntoIterator for &'a Moves<T, CAP> {
    type Item = T;
    type IntoIter = core::iter::Copied<core::slice::Iter<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

struct RawBytes<'a>(&'a [u8]);

impl Serialize for RawBytes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

struct OwnedBytes(Vec<u8>);

impl<'de> Deserialize<'de> for OwnedBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BytesVisitor;

        impl<'de> Visitor<'de> for BytesVisitor {
            type Value = OwnedBytes;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a byte buffer")
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<OwnedBytes, E> {
                Ok(OwnedBytes(v.to_vec()))
            }

            fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<OwnedBytes, E> {
                Ok(OwnedBytes(v))
            }

            fn visit_seq<S: SeqAccess<'de>>(self, mut seq: S) -> Result<OwnedBytes, S::Error> {
                let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(b) = seq.next_element::<u8>()? {
                    bytes.push(b);
                }
                Ok(OwnedBytes(bytes))
            }
        }

        deserializer.deserialize_byte_buf(BytesVisitor)
    }
}

impl<T, const CAP: usize> Serialize for Moves<T, CAP>
where
    T: Copy + Default + AsBytes,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let count = u32::try_from(self.len).map_err(serde::ser::Error::custom)?;
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&count)?;
        tuple.serialize_element(&RawBytes(self.as_slice().as_bytes()))?;
        tuple.end()
    }
}

impl<'de, T, const CAP: usize> Deserialize<'de> for Moves<T, CAP>
where
    T: Copy + Default + FromBytes,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MovesVisitor<T, const CAP: usize>(PhantomData<T>);

        impl<'de, T, const CAP: usize> Visitor<'de> for MovesVisitor<T, CAP>
        where
            T: Copy + Default + FromBytes,
        {
            type Value = Moves<T, CAP>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a (count, bytes) pair holding at most {CAP} moves")
            }

            fn visit_seq<S: SeqAccess<'de>>(self, mut seq: S) -> Result<Self::Value, S::Error> {
                let count: u32 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let OwnedBytes(bytes) = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;

                let count = count as usize;
                if count > CAP {
                    return Err(de::Error::invalid_value(
                        de::Unexpected::Unsigned(count as u64),
                        &self,
                    ));
                }
                let width = core::mem::size_of::<T>();
                if bytes.len() != count * width {
                    return Err(de::Error::invalid_length(bytes.len(), &self));
                }

                let mut moves = Moves::new();
                if width == 0 {
                    moves.len = count;
                    return Ok(moves);
                }
                for chunk in bytes.chunks_exact(width) {
                    let value = T::read_from(chunk)
                        .ok_or_else(|| de::Error::custom("misaligned move bytes"))?;
                    moves.push(value);
                }
                Ok(moves)
            }
        }

        deserializer.deserialize_tuple(2, MovesVisitor::<T, CAP>(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_take_one_drains_every_move_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut moves: Moves<u8, 16> = Moves::full(|i| i as u8);
        let mut seen = Vec::new();
        while let Some(m) = moves.take_one(&mut rng) {
            seen.push(m);
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..16).collect::<Vec<u8>>());
        assert!(moves.is_empty());
        assert_eq!(moves.take_one(&mut rng), None);
    }

    #[test]
    fn test_remove_swaps_last_into_hole() {
        let mut moves: Moves<u16, 4> = Moves::new();
        for m in [10, 20, 30] {
            moves.push(m);
        }
        assert!(moves.remove(10));
        assert_eq!(moves.as_slice(), &[30, 20]);
        assert!(!moves.remove(99));
        assert!(moves.contains(20));
        assert_eq!(moves.first(), Some(30));
    }

    #[test]
    #[should_panic(expected = "moves pool is full")]
    fn test_push_past_capacity_panics() {
        let mut moves: Moves<u8, 1> = Moves::new();
        moves.push(1);
        moves.push(2);
    }

    #[test]
    fn test_serialization_writes_only_held_moves() {
        let mut moves: Moves<u16, 64> = Moves::new();
        moves.push(0x0102);
        moves.push(0x0304);
        let bytes = bincode::serialize(&moves).unwrap();
        // u32 count + u64 byte length + 2 * 2 payload bytes
        assert_eq!(bytes.len(), 4 + 8 + 4);

        let back: Moves<u16, 64> = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, moves);
        assert_eq!(back.capacity(), 64);
    }

    #[test]
    fn test_deserialization_rejects_overfull_pool() {
        let mut moves: Moves<u8, 8> = Moves::new();
        for m in 0..8 {
            moves.push(m);
        }
        let bytes = bincode::serialize(&moves).unwrap();
        assert!(bincode::deserialize::<Moves<u8, 4>>(&bytes).is_err());
    }
}

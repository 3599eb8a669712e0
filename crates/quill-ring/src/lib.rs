//! # quill-ring
//!
//! Lock-free single-producer single-consumer ring buffer.
//!
//! The market-data thread publishes ticks to the strategy thread through
//! this ring; heartbeat and order-result events reach the router the same
//! way. The design contract:
//!
//! - capacity `N` is a power of two; one slot stays reserved, so the ring
//!   holds at most `N - 1` items
//! - the producer publishes `tail` with a release store after writing the
//!   slot; the consumer reads `tail` with an acquire load before reading
//!   the slot (symmetrically for `head`)
//! - `head` and `tail` live on separate cache lines from each other and
//!   from the slot storage, so the two sides never false-share
//! - element types are restricted to `T: Copy`, keeping slot reads and
//!   writes trivially destructible
//!
//! The producer and consumer sides are separate owned handles, so
//! exclusive access per side is an ownership fact rather than a comment:
//!
//! ```rust
//! let (mut tx, mut rx) = quill_ring::ring::<u64, 8>();
//!
//! assert!(tx.push(1).is_ok());
//! assert!(tx.push(2).is_ok());
//! assert_eq!(rx.pop(), Some(1));
//! assert_eq!(rx.pop(), Some(2));
//! assert_eq!(rx.pop(), None);
//! ```

#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Pads and aligns a value to a 64-byte cache line.
#[repr(align(64))]
struct CacheAligned<T>(T);

struct Shared<T, const N: usize> {
    /// Consumer index; advanced only by the consumer
    head: CacheAligned<AtomicUsize>,
    /// Producer index; advanced only by the producer
    tail: CacheAligned<AtomicUsize>,
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// SAFETY: the index protocol guarantees that a slot is accessed by exactly
// one side at a time: the producer writes slot `tail` strictly before the
// release store that hands it to the consumer, and the consumer reads slot
// `head` strictly before the release store that returns it to the producer.
unsafe impl<T: Copy + Send, const N: usize> Send for Shared<T, N> {}
unsafe impl<T: Copy + Send, const N: usize> Sync for Shared<T, N> {}

impl<T: Copy + Send, const N: usize> Shared<T, N> {
    fn len(&self) -> usize {
        let head = self.head.0.load(Ordering::Acquire);
        let tail = self.tail.0.load(Ordering::Acquire);
        tail.wrapping_sub(head) & (N - 1)
    }
}

/// Producer half of an SPSC ring. Not clonable; exactly one exists.
pub struct Producer<T, const N: usize> {
    shared: Arc<Shared<T, N>>,
}

/// Consumer half of an SPSC ring. Not clonable; exactly one exists.
pub struct Consumer<T, const N: usize> {
    shared: Arc<Shared<T, N>>,
}

/// Create a new SPSC ring with `N` slots (`N` a power of two, >= 2).
///
/// Usable capacity is `N - 1`: one slot stays reserved to disambiguate
/// full from empty.
///
/// # Panics
/// Panics if `N` is not a power of two or is smaller than 2.
#[must_use]
pub fn ring<T: Copy + Send, const N: usize>() -> (Producer<T, N>, Consumer<T, N>) {
    assert!(N.is_power_of_two() && N >= 2, "ring size must be a power of two >= 2");

    let slots = (0..N)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect::<Vec<_>>()
        .into_boxed_slice();

    let shared = Arc::new(Shared::<T, N> {
        head: CacheAligned(AtomicUsize::new(0)),
        tail: CacheAligned(AtomicUsize::new(0)),
        slots,
    });

    (
        Producer {
            shared: Arc::clone(&shared),
        },
        Consumer { shared },
    )
}

impl<T: Copy + Send, const N: usize> Producer<T, N> {
    /// Push an item, returning it back if the ring is full.
    ///
    /// # Errors
    /// `Err(item)` when `(tail + 1) mod N == head`, i.e. the ring is full.
    #[inline]
    pub fn push(&mut self, item: T) -> Result<(), T> {
        let tail = self.shared.tail.0.load(Ordering::Relaxed);
        let next = (tail + 1) & (N - 1);

        if next == self.shared.head.0.load(Ordering::Acquire) {
            return Err(item);
        }

        // SAFETY: `tail` is owned by this (unique) producer and the
        // full-check above proves the consumer is not reading this slot.
        unsafe {
            (*self.shared.slots[tail].get()).write(item);
        }
        self.shared.tail.0.store(next, Ordering::Release);
        Ok(())
    }

    /// Number of items currently queued
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Whether the ring is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the next push would fail
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() == N - 1
    }

    /// Usable capacity (`N - 1`; one slot reserved)
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        N - 1
    }
}

impl<T: Copy + Send, const N: usize> Consumer<T, N> {
    /// Pop the oldest item, or `None` if the ring is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        let head = self.shared.head.0.load(Ordering::Relaxed);

        if head == self.shared.tail.0.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: `head != tail` with the acquire load above proves the
        // producer finished writing this slot; `head` is owned by this
        // (unique) consumer.
        let item = unsafe { (*self.shared.slots[head].get()).assume_init_read() };
        self.shared.head.0.store((head + 1) & (N - 1), Ordering::Release);
        Some(item)
    }

    /// Number of items currently queued
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Whether the ring is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Usable capacity (`N - 1`; one slot reserved)
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        N - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::types::{MarketTick, Timestamp};

    #[test]
    fn test_push_pop_order() {
        let (mut tx, mut rx) = ring::<u32, 8>();

        for i in 0..5 {
            assert!(tx.push(i).is_ok());
        }
        assert_eq!(tx.len(), 5);

        for i in 0..5 {
            assert_eq!(rx.pop(), Some(i));
        }
        assert_eq!(rx.pop(), None);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_capacity_is_one_less_than_size() {
        let (mut tx, mut rx) = ring::<u64, 8>();
        assert_eq!(tx.capacity(), 7);

        for i in 0..7 {
            assert!(tx.push(i).is_ok());
        }
        assert!(tx.is_full());
        assert_eq!(tx.push(99), Err(99));

        assert_eq!(rx.pop(), Some(0));
        assert!(tx.push(99).is_ok());
    }

    #[test]
    fn test_wraparound() {
        let (mut tx, mut rx) = ring::<u64, 4>();

        // Cycle through the ring several times its size.
        for i in 0..100u64 {
            assert!(tx.push(i).is_ok());
            assert_eq!(rx.pop(), Some(i));
        }
        assert!(rx.is_empty());
    }

    #[test]
    fn test_tick_transport() {
        let (mut tx, mut rx) = ring::<MarketTick, 16>();

        let tick = MarketTick {
            mid_price: 100.5,
            bid_price: 100.45,
            ask_price: 100.55,
            bid_size: 50,
            ask_size: 40,
            depth_levels: 5,
            timestamp: Timestamp::from_nanos(42),
            ..MarketTick::default()
        };

        assert!(tx.push(tick).is_ok());
        let got = rx.pop().expect("tick should round-trip");
        assert_eq!(got, tick);
    }

    #[test]
    fn test_threaded_fifo_no_loss_no_duplication() {
        const COUNT: u64 = 100_000;
        let (mut tx, mut rx) = ring::<u64, 1024>();

        let producer = std::thread::spawn(move || {
            for i in 0..COUNT {
                let mut item = i;
                loop {
                    match tx.push(item) {
                        Ok(()) => break,
                        Err(back) => {
                            item = back;
                            std::hint::spin_loop();
                        }
                    }
                }
            }
        });

        let consumer = std::thread::spawn(move || {
            let mut expected = 0u64;
            while expected < COUNT {
                match rx.pop() {
                    Some(item) => {
                        assert_eq!(item, expected, "items must arrive in submission order");
                        expected += 1;
                    }
                    None => std::hint::spin_loop(),
                }
            }
            assert_eq!(rx.pop(), None);
        });

        producer.join().unwrap();
        consumer.join().unwrap();
    }
}

//! Pending bitmask to delivery queue pipeline.
//!
//! The handler only ever sets bits in `pending`. Ordinary context moves
//! them, lowest number first, into a bounded queue that tasks receive from.
//! A bit is cleared only after its number is in the queue, so a full queue
//! delays a signal but never drops it.

use super::set::{AtomicSignalSet, SignalSet};
use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use crossbeam_queue::ArrayQueue;
use futures_util::{stream::Stream, task::AtomicWaker};

pub struct Delivery {
    pending: AtomicSignalSet,
    queue: ArrayQueue<u32>,
    waker: AtomicWaker,
}

impl Delivery {
    /// `capacity` is clamped to at least one slot.
    pub fn new(capacity: usize) -> Self {
        Delivery {
            pending: AtomicSignalSet::new(),
            queue: ArrayQueue::new(capacity.max(1)),
            waker: AtomicWaker::new(),
        }
    }

    /// Record an occurrence of `sig`.
    ///
    /// Called from the signal handler. Must not block or allocate: this is
    /// a single CAS loop. Repeated occurrences before the next drain
    /// coalesce into one.
    #[inline]
    pub fn notify(&self, sig: u32) {
        self.pending.insert(sig);
    }

    /// Move pending signals into the queue until it is full or nothing is
    /// pending. Returns `true` if at least one signal was queued by this call.
    pub fn drain(&self) -> bool {
        let mut delivered = false;
        loop {
            let snapshot = self.pending.load();
            let sig = match snapshot.lowest() {
                Some(sig) => sig,
                // Common case: nothing arrived
                None => return delivered,
            };

            if self.queue.push(sig).is_err() {
                // Leave the bit set; the receiver drains again after it pops
                return delivered;
            }
            delivered = true;
            // Clearing only this bit: the handler may have set others since
            // the snapshot, and they must survive.
            self.pending.remove(sig);
            self.waker.wake();
        }
    }

    /// Pop the next delivered signal without waiting.
    pub fn try_recv(&self) -> Option<u32> {
        let sig = self.queue.pop()?;
        // A slot just opened up
        self.drain();
        Some(sig)
    }

    /// Wait for the next signal. Only one task may wait at a time.
    pub fn recv(&self) -> Recv<'_> {
        Recv { delivery: self }
    }

    pub fn poll_recv(&self, cx: &mut Context<'_>) -> Poll<u32> {
        // fast path
        if let Some(sig) = self.try_recv() {
            return Poll::Ready(sig);
        }

        self.waker.register(cx.waker());
        self.drain();
        match self.try_recv() {
            Some(sig) => {
                self.waker.take();
                Poll::Ready(sig)
            }
            None => Poll::Pending,
        }
    }

    /// Signals seen by the handler but not yet queued.
    pub fn pending(&self) -> SignalSet {
        self.pending.load()
    }

    /// Signals queued but not yet received.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Nothing pending and nothing queued.
    pub fn is_idle(&self) -> bool {
        self.pending.load().is_empty() && self.queue.is_empty()
    }
}

/// Future returned by [`Delivery::recv`].
pub struct Recv<'a> {
    delivery: &'a Delivery,
}

impl Future for Recv<'_> {
    type Output = u32;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<u32> {
        self.delivery.poll_recv(cx)
    }
}

/// Endless stream of delivered signal numbers.
pub struct SignalStream<'a> {
    delivery: &'a Delivery,
}

impl<'a> SignalStream<'a> {
    pub fn new(delivery: &'a Delivery) -> Self {
        SignalStream { delivery }
    }
}

impl Stream for SignalStream<'_> {
    type Item = u32;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<u32>> {
        self.delivery.poll_recv(cx).map(Some)
    }
}

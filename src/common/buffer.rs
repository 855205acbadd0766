// Copyright (c) 2021 Fabian Schuiki

//! A bounded blocking buffer connecting two pipeline stages.
//!
//! This is a classic monitor-style bounded buffer: [`Sender::send`] blocks
//! while the buffer is full, [`Receiver::recv`] blocks while it is empty, and
//! both sides wake each other through condition variables rather than polling.
//! With a single producer and a single consumer per buffer this gives strict
//! FIFO ordering and end-to-end backpressure.
//!
//! In addition to any in-band end-of-input sentinel the stages may use, both
//! halves support explicit close semantics: a dropped or closed sender makes
//! `recv` drain the queue and then return `None`, and a dropped or closed
//! receiver makes `send` fail. A stage that dies therefore unblocks its
//! neighbors instead of leaving them waiting on a sentinel that never comes.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex};

/// Create a bounded buffer with the given capacity, returning the producer
/// and consumer halves.
pub fn bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    assert!(capacity > 0, "buffer capacity must be at least 1");
    let chan = Arc::new(Chan {
        state: Mutex::new(State {
            queue: VecDeque::with_capacity(capacity),
            capacity,
            send_closed: false,
            recv_closed: false,
        }),
        not_full: Condvar::new(),
        not_empty: Condvar::new(),
    });
    (Sender { chan: chan.clone() }, Receiver { chan })
}

struct State<T> {
    queue: VecDeque<T>,
    capacity: usize,
    send_closed: bool,
    recv_closed: bool,
}

struct Chan<T> {
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

/// The producer half of a bounded buffer.
pub struct Sender<T> {
    chan: Arc<Chan<T>>,
}

/// The consumer half of a bounded buffer.
pub struct Receiver<T> {
    chan: Arc<Chan<T>>,
}

/// The error returned when sending into a buffer whose receiver is gone. The
/// unsent value is handed back.
pub struct SendError<T>(pub T);

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SendError(..)")
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "sending into a buffer whose receiver is gone")
    }
}

impl<T> Sender<T> {
    /// Push a value into the buffer, blocking while it is full.
    ///
    /// Returns the value as an error if the receiver has been dropped or
    /// closed, since the value can then never be observed.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        let mut state = self.chan.state.lock().unwrap();
        while state.queue.len() == state.capacity && !state.recv_closed {
            state = self.chan.not_full.wait(state).unwrap();
        }
        if state.recv_closed {
            return Err(SendError(value));
        }
        state.queue.push_back(value);
        self.chan.not_empty.notify_one();
        Ok(())
    }

    /// Close the sending half. Equivalent to dropping the sender.
    pub fn close(&self) {
        let mut state = self.chan.state.lock().unwrap();
        state.send_closed = true;
        self.chan.not_empty.notify_all();
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> Receiver<T> {
    /// Pull the next value out of the buffer, blocking while it is empty.
    ///
    /// Returns `None` once the sender is closed and the buffer has been
    /// drained.
    pub fn recv(&self) -> Option<T> {
        let mut state = self.chan.state.lock().unwrap();
        while state.queue.is_empty() && !state.send_closed {
            state = self.chan.not_empty.wait(state).unwrap();
        }
        match state.queue.pop_front() {
            Some(value) => {
                self.chan.not_full.notify_one();
                Some(value)
            }
            None => None,
        }
    }

    /// Close the receiving half. Equivalent to dropping the receiver.
    pub fn close(&self) {
        let mut state = self.chan.state.lock().unwrap();
        state.recv_closed = true;
        state.queue.clear();
        self.chan.not_full.notify_all();
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        self.close();
    }
}

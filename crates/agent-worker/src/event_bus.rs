// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress event bus: one producer (the executor), at most one consumer
//! (the currently attached `Execute` stream) at a time.
//!
//! [`EventBus`] is the buffered variant described in the component design: a
//! coordinator task owns an in-memory FIFO queue and tolerates the consumer
//! vanishing and later reattaching — it never blocks the producer. A
//! simpler [`DirectBus`] variant exists for contexts where the consumer is
//! known to be present for the whole operation; it relays events
//! synchronously and blocks the producer when the consumer is slow.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};

use agent_core::ProgressEvent;

/// Producer handle: cheap to clone, non-blocking in the steady state.
#[derive(Clone)]
pub struct EventBus {
    inbound: mpsc::UnboundedSender<ProgressEvent>,
    close: Arc<Notify>,
}

/// Consumer handle. Exactly one `EventReader` exists per bus; the server
/// reattaches it to a new `Execute` stream by locking its own handle to the
/// reader rather than constructing a new one.
pub struct EventReader {
    outbound: mpsc::Receiver<ProgressEvent>,
}

impl EventBus {
    /// Spawn the coordinator task and return the producer/consumer halves.
    pub fn new() -> (Self, EventReader) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<ProgressEvent>();
        let (outbound_tx, outbound_rx) = mpsc::channel::<ProgressEvent>(1);
        let close = Arc::new(Notify::new());

        tokio::spawn(coordinate(inbound_rx, outbound_tx, close.clone()));

        (Self { inbound: inbound_tx, close }, EventReader { outbound: outbound_rx })
    }

    /// Enqueue `event`. Non-blocking; a no-op once the bus is closed.
    pub fn send(&self, event: ProgressEvent) {
        let _ = self.inbound.send(event);
    }

    /// Unblock all waiters. Idempotent; after this, `send` is a no-op and
    /// the reader's `next` yields `None` once the backlog drains.
    pub fn close(&self) {
        self.close.notify_one();
    }
}

impl EventReader {
    /// Next event in FIFO order. `None` means the bus closed and the
    /// best-effort drain finished.
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        self.outbound.recv().await
    }
}

/// The coordinator: a single task holding the queue, selecting over
/// {inbound, outbound, close}. The outbound slot is only offered while the
/// queue is non-empty, so a missing consumer leaves events queued instead
/// of spuriously "delivering" into the void.
async fn coordinate(
    mut inbound: mpsc::UnboundedReceiver<ProgressEvent>,
    outbound: mpsc::Sender<ProgressEvent>,
    close: Arc<Notify>,
) {
    let mut queue: VecDeque<ProgressEvent> = VecDeque::new();

    loop {
        match queue.front().cloned() {
            Some(head) => {
                tokio::select! {
                    biased;
                    _ = close.notified() => break,
                    incoming = inbound.recv() => match incoming {
                        Some(event) => queue.push_back(event),
                        None => break,
                    },
                    result = outbound.send(head) => {
                        if result.is_ok() {
                            queue.pop_front();
                        }
                    }
                }
            }
            None => {
                tokio::select! {
                    biased;
                    _ = close.notified() => break,
                    incoming = inbound.recv() => match incoming {
                        Some(event) => queue.push_back(event),
                        None => break,
                    },
                }
            }
        }
    }

    // A notified `close` is checked with priority over `inbound`, so events
    // already sitting in the channel when close fired haven't been folded
    // into `queue` yet — drain them before giving up on delivery.
    while let Ok(event) = inbound.try_recv() {
        queue.push_back(event);
    }

    // Best-effort drain: hand off whatever's left without blocking.
    for event in queue {
        if outbound.try_send(event).is_err() {
            break;
        }
    }
}

/// A simpler bus for contexts where the consumer is present for the whole
/// operation: events relay synchronously and a slow consumer blocks the
/// producer. Exposes the same `send`/`close` surface as [`EventBus`].
#[derive(Clone)]
pub struct DirectBus {
    tx: mpsc::Sender<ProgressEvent>,
}

pub struct DirectReader {
    rx: mpsc::Receiver<ProgressEvent>,
}

impl DirectBus {
    pub fn new(capacity: usize) -> (Self, DirectReader) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, DirectReader { rx })
    }

    /// Blocks the producer if the consumer hasn't drained the channel.
    pub async fn send(&self, event: ProgressEvent) {
        let _ = self.tx.send(event).await;
    }
}

impl DirectReader {
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;

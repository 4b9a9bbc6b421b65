//! Per-session FIFO turn queue.
//!
//! Messages on one session must be answered in the order they were accepted,
//! even when callers fire several sends at once. Each accepted message takes
//! a [`Ticket`]; [`Ticket::wait`] resolves to a [`Turn`] once every earlier
//! ticket has finished or been abandoned. Dropping a `Turn` hands the session
//! to the next ticket.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct TurnState {
    next_ticket: u64,
    serving: u64,
    /// Tickets dropped before their turn came up.
    abandoned: BTreeSet<u64>,
}

impl TurnState {
    fn advance_past(&mut self, number: u64) {
        self.serving = number + 1;
        while self.abandoned.remove(&self.serving) {
            self.serving += 1;
        }
    }
}

#[derive(Debug, Default)]
pub struct TurnQueue {
    state: Mutex<TurnState>,
    notify: Notify,
}

impl TurnQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Take the next place in line.
    pub fn issue(self: &Arc<Self>) -> Ticket {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let number = state.next_ticket;
        state.next_ticket += 1;
        Ticket {
            queue: Arc::clone(self),
            number,
            redeemed: false,
        }
    }

    /// Tickets issued but not yet finished.
    pub fn pending(&self) -> u64 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.next_ticket - state.serving - state.abandoned.len() as u64
    }

    fn serving(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .serving
    }

    fn finish(&self, number: u64) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.advance_past(number);
        }
        self.notify.notify_waiters();
    }

    fn abandon(&self, number: u64) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.serving == number {
                state.advance_past(number);
            } else {
                state.abandoned.insert(number);
            }
        }
        self.notify.notify_waiters();
    }
}

/// A place in line. Dropping it unredeemed gives up the place.
#[derive(Debug)]
pub struct Ticket {
    queue: Arc<TurnQueue>,
    number: u64,
    redeemed: bool,
}

impl Ticket {
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Wait until every earlier ticket is done.
    pub async fn wait(mut self) -> Turn {
        loop {
            let notified = self.queue.notify.notified();
            tokio::pin!(notified);
            // register before checking so a finish in between is not missed
            notified.as_mut().enable();
            if self.queue.serving() == self.number {
                break;
            }
            notified.await;
        }
        self.redeemed = true;
        Turn {
            queue: Arc::clone(&self.queue),
            number: self.number,
        }
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if !self.redeemed {
            self.queue.abandon(self.number);
        }
    }
}

/// Exclusive right to process the next message of a session.
#[derive(Debug)]
pub struct Turn {
    queue: Arc<TurnQueue>,
    number: u64,
}

impl Drop for Turn {
    fn drop(&mut self) {
        self.queue.finish(self.number);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn first_ticket_is_served_immediately() {
        let queue = TurnQueue::new();
        let ticket = queue.issue();
        assert_eq!(ticket.number(), 0);
        let _turn = ticket.wait().await;
        assert_eq!(queue.pending(), 1);
    }

    #[tokio::test]
    async fn turns_are_granted_in_issue_order() {
        let queue = TurnQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let tickets: Vec<Ticket> = (0..4).map(|_| queue.issue()).collect();

        let mut handles = Vec::new();
        // spawn in reverse so scheduling order cannot explain the result
        for ticket in tickets.into_iter().rev() {
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                let number = ticket.number();
                let _turn = ticket.wait().await;
                tokio::task::yield_now().await;
                order.lock().unwrap().push(number);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn abandoned_ticket_is_skipped() {
        let queue = TurnQueue::new();
        let first = queue.issue();
        let second = queue.issue();
        let third = queue.issue();

        let turn = first.wait().await;
        drop(second);
        drop(turn);

        let waited = tokio::time::timeout(Duration::from_secs(1), third.wait()).await;
        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn cancelled_wait_releases_the_place() {
        let queue = TurnQueue::new();
        let first = queue.issue();
        let second = queue.issue();
        let third = queue.issue();

        let turn = first.wait().await;
        // second gives up while still waiting
        let gave_up = tokio::time::timeout(Duration::from_millis(10), second.wait()).await;
        assert!(gave_up.is_err());
        drop(turn);

        let waited = tokio::time::timeout(Duration::from_secs(1), third.wait()).await;
        assert!(waited.is_ok());
        assert_eq!(queue.pending(), 1);
    }

    #[tokio::test]
    async fn dropping_current_ticket_unblocks_next() {
        let queue = TurnQueue::new();
        let first = queue.issue();
        let second = queue.issue();
        drop(first);
        let waited = tokio::time::timeout(Duration::from_secs(1), second.wait()).await;
        assert!(waited.is_ok());
    }
}

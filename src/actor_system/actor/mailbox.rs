//! Actor mailbox - ordered message queue plus scheduling status.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::StopPolicy;

/// Scheduling status of an actor.
///
/// `Idle -> Scheduled -> Running -> Idle` while the actor lives. A stop
/// request moves it to `Stopping` until its queue is empty, then `Stopped`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorStatus {
    Idle,
    Scheduled,
    Running,
    Stopping,
    Stopped,
}

/// What the dispatcher should do with an actor after one drain step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Next {
    Reschedule,
    Idle,
    Stop,
}

struct MailboxState<M> {
    queue: VecDeque<M>,
    status: ActorStatus,
    stopping: bool,
}

/// Unbounded FIFO queue feeding one actor.
pub(crate) struct Mailbox<M> {
    state: Mutex<MailboxState<M>>,
}

impl<M> Mailbox<M> {
    pub fn new() -> Self {
        Mailbox {
            state: Mutex::new(MailboxState {
                queue: VecDeque::new(),
                status: ActorStatus::Idle,
                stopping: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MailboxState<M>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a message. Returns `Ok(true)` when the actor just became
    /// schedulable and must be handed to the dispatcher, and gives the message
    /// back when the actor no longer accepts messages.
    pub fn enqueue(&self, msg: M) -> Result<bool, M> {
        let mut state = self.lock();
        if state.stopping || state.status == ActorStatus::Stopped {
            return Err(msg);
        }
        state.queue.push_back(msg);
        if state.status == ActorStatus::Idle {
            state.status = ActorStatus::Scheduled;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Pops the head message for a drain step.
    pub fn begin(&self) -> Option<M> {
        let mut state = self.lock();
        let msg = state.queue.pop_front();
        if msg.is_some() {
            state.status = ActorStatus::Running;
        }
        msg
    }

    /// Ends a drain step and decides the next transition.
    pub fn finish(&self) -> Next {
        let mut state = self.lock();
        if state.status == ActorStatus::Stopped {
            Next::Idle
        } else if !state.queue.is_empty() {
            state.status = ActorStatus::Scheduled;
            Next::Reschedule
        } else if state.stopping {
            state.status = ActorStatus::Stopped;
            Next::Stop
        } else {
            state.status = ActorStatus::Idle;
            Next::Idle
        }
    }

    /// Closes the mailbox to new messages.
    ///
    /// Returns the messages discarded by the policy and whether the actor can
    /// be finalized right away, which is only the case when no worker holds it.
    pub fn request_stop(&self, policy: StopPolicy) -> (Vec<M>, bool) {
        let mut state = self.lock();
        if state.stopping || state.status == ActorStatus::Stopped {
            return (Vec::new(), false);
        }
        state.stopping = true;
        let discarded = match policy {
            StopPolicy::Drain => Vec::new(),
            StopPolicy::Discard => state.queue.drain(..).collect(),
        };
        let finalize = state.status == ActorStatus::Idle;
        if finalize {
            state.status = ActorStatus::Stopped;
        }
        (discarded, finalize)
    }

    pub fn is_accepting(&self) -> bool {
        let state = self.lock();
        !state.stopping && state.status != ActorStatus::Stopped
    }

    /// Status as seen from outside. The scheduling status of an actor that is
    /// still draining after a stop request is reported as `Stopping`.
    pub fn status(&self) -> ActorStatus {
        let state = self.lock();
        if state.stopping && state.status != ActorStatus::Stopped {
            ActorStatus::Stopping
        } else {
            state.status
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_message_schedules() {
        let mailbox = Mailbox::new();
        assert_eq!(mailbox.enqueue(1), Ok(true));
        assert_eq!(mailbox.enqueue(2), Ok(false));
        assert_eq!(mailbox.status(), ActorStatus::Scheduled);
        assert_eq!(mailbox.len(), 2);
    }

    #[test]
    fn test_drain_cycle() {
        let mailbox = Mailbox::new();
        mailbox.enqueue("a").unwrap();
        mailbox.enqueue("b").unwrap();

        assert_eq!(mailbox.begin(), Some("a"));
        assert_eq!(mailbox.status(), ActorStatus::Running);
        // Messages arriving mid-step do not schedule the actor twice.
        assert_eq!(mailbox.enqueue("c"), Ok(false));
        assert_eq!(mailbox.finish(), Next::Reschedule);

        assert_eq!(mailbox.begin(), Some("b"));
        assert_eq!(mailbox.finish(), Next::Reschedule);
        assert_eq!(mailbox.begin(), Some("c"));
        assert_eq!(mailbox.finish(), Next::Idle);
        assert_eq!(mailbox.status(), ActorStatus::Idle);
        assert_eq!(mailbox.enqueue("d"), Ok(true));
    }

    #[test]
    fn test_stop_idle_finalizes_immediately() {
        let mailbox: Mailbox<u8> = Mailbox::new();
        let (discarded, finalize) = mailbox.request_stop(StopPolicy::Drain);
        assert!(discarded.is_empty());
        assert!(finalize);
        assert_eq!(mailbox.status(), ActorStatus::Stopped);
        assert_eq!(mailbox.enqueue(7), Err(7));

        let (_, again) = mailbox.request_stop(StopPolicy::Drain);
        assert!(!again);
    }

    #[test]
    fn test_stop_drains_pending() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(1).unwrap();
        mailbox.enqueue(2).unwrap();

        let (discarded, finalize) = mailbox.request_stop(StopPolicy::Drain);
        assert!(discarded.is_empty());
        assert!(!finalize);
        assert!(!mailbox.is_accepting());
        assert_eq!(mailbox.status(), ActorStatus::Stopping);
        assert_eq!(mailbox.enqueue(3), Err(3));

        assert_eq!(mailbox.begin(), Some(1));
        assert_eq!(mailbox.status(), ActorStatus::Stopping);
        assert_eq!(mailbox.finish(), Next::Reschedule);
        assert_eq!(mailbox.begin(), Some(2));
        assert_eq!(mailbox.finish(), Next::Stop);
        assert_eq!(mailbox.status(), ActorStatus::Stopped);
    }

    #[test]
    fn test_stop_discards_pending() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(1).unwrap();
        mailbox.enqueue(2).unwrap();

        let (discarded, finalize) = mailbox.request_stop(StopPolicy::Discard);
        assert_eq!(discarded, vec![1, 2]);
        assert!(!finalize);

        assert_eq!(mailbox.begin(), None);
        assert_eq!(mailbox.finish(), Next::Stop);
    }
}

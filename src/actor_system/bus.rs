//! System event bus and dead letters.

use std::any::Any;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::actor_system::actor::{ActorId, Message};

/// Lifecycle events published by an actor system.
#[derive(Clone, Debug)]
pub enum SystemEvent {
    ActorStarted(ActorId),
    ActorStopped(ActorId),
    DeadLetter(DeadLetter),
    ReducerFailed { id: ActorId, reason: String },
}

/// A message that could not be delivered because its target is absent or stopped.
#[derive(Clone)]
pub struct DeadLetter {
    recipient: ActorId,
    message: Arc<dyn Any + Send + Sync>,
    description: String,
}

impl DeadLetter {
    pub(crate) fn new<M: Message>(recipient: ActorId, message: M) -> Self {
        let description = format!("{message:?}");
        DeadLetter {
            recipient,
            message: Arc::new(message),
            description,
        }
    }

    pub fn recipient(&self) -> &ActorId {
        &self.recipient
    }

    /// The undelivered message, if it is of type `M`.
    pub fn downcast_ref<M: Message>(&self) -> Option<&M> {
        self.message.downcast_ref::<M>()
    }

    /// Debug rendering of the undelivered message.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl std::fmt::Debug for DeadLetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeadLetter({} <- {})", self.recipient, self.description)
    }
}

/// Broadcast bus for events of type `E`.
#[derive(Clone, Debug)]
pub struct EventBus<E> {
    sender: broadcast::Sender<E>,
}

impl<E: Clone + Send + 'static> EventBus<E> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        EventBus { sender }
    }

    /// Publishes an event. Having no subscribers is not an error.
    pub fn send(&self, event: E) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}

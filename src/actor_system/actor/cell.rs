//! Actor cell - the runtime's record of one actor: its mailbox, state, reducer and children.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::FutureExt;

use crate::actor_system::system::ActorSystem;
use crate::config::StopPolicy;

use super::{
    ActorContext, ActorId, ActorRef, ActorStatus, Reducer,
    mailbox::{Mailbox, Next},
};

/// Type-erased view of an actor cell, as stored in the registry and the ready queue.
#[async_trait]
pub(crate) trait Cell: Send + Sync + 'static {
    fn id(&self) -> &ActorId;

    fn parent(&self) -> Option<&ActorId>;

    /// The `Mailbox<M>` of this actor, for typed lookups.
    fn mailbox(&self) -> &(dyn Any + Send + Sync);

    fn status(&self) -> ActorStatus;

    fn is_accepting(&self) -> bool;

    /// Registers a child. Fails once the actor has started finalizing.
    fn add_child(&self, child: ActorId) -> bool;

    fn remove_child(&self, child: &ActorId);

    fn children(&self) -> Vec<ActorId>;

    /// Takes the children and refuses new ones.
    fn close_children(&self) -> Vec<ActorId>;

    /// Records a stop request. Returns true if the caller must finalize the actor now.
    fn request_stop(&self, policy: StopPolicy, system: &ActorSystem) -> bool;

    /// Reduces at most one message.
    async fn drain_step(&self, system: &ActorSystem) -> Next;
}

pub(crate) struct ActorCell<R: Reducer> {
    id: ActorId,
    parent: Option<ActorId>,
    mailbox: Mailbox<R::Message>,
    // Only the worker running a drain step touches the state, so the lock is
    // never contended.
    state: tokio::sync::Mutex<R::State>,
    reducer: R,
    children: Mutex<Option<Vec<ActorId>>>,
}

impl<R: Reducer> ActorCell<R> {
    pub fn new(id: ActorId, parent: Option<ActorId>, initial_state: R::State, reducer: R) -> Self {
        ActorCell {
            id,
            parent,
            mailbox: Mailbox::new(),
            state: tokio::sync::Mutex::new(initial_state),
            reducer,
            children: Mutex::new(Some(Vec::new())),
        }
    }

    fn children_lock(&self) -> MutexGuard<'_, Option<Vec<ActorId>>> {
        self.children.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<R: Reducer> Cell for ActorCell<R> {
    fn id(&self) -> &ActorId {
        &self.id
    }

    fn parent(&self) -> Option<&ActorId> {
        self.parent.as_ref()
    }

    fn mailbox(&self) -> &(dyn Any + Send + Sync) {
        &self.mailbox
    }

    fn status(&self) -> ActorStatus {
        self.mailbox.status()
    }

    fn is_accepting(&self) -> bool {
        self.mailbox.is_accepting()
    }

    fn add_child(&self, child: ActorId) -> bool {
        match self.children_lock().as_mut() {
            Some(children) => {
                children.push(child);
                true
            }
            None => false,
        }
    }

    fn remove_child(&self, child: &ActorId) {
        if let Some(children) = self.children_lock().as_mut() {
            children.retain(|c| c != child);
        }
    }

    fn children(&self) -> Vec<ActorId> {
        self.children_lock().clone().unwrap_or_default()
    }

    fn close_children(&self) -> Vec<ActorId> {
        self.children_lock().take().unwrap_or_default()
    }

    fn request_stop(&self, policy: StopPolicy, system: &ActorSystem) -> bool {
        let (discarded, finalize) = self.mailbox.request_stop(policy);
        if !discarded.is_empty() {
            log::debug!(
                "Actor '{}' discards {} queued messages on stop",
                &self.id,
                discarded.len()
            );
        }
        for msg in discarded {
            system.dead_letter(&self.id, msg);
        }
        finalize
    }

    async fn drain_step(&self, system: &ActorSystem) -> Next {
        if let Some(msg) = self.mailbox.begin() {
            let ctx = ActorContext::new(
                ActorRef::new(self.id.clone(), system.downgrade()),
                self.parent.clone(),
                system.clone(),
            );

            let mut state = self.state.lock().await;
            let outcome = AssertUnwindSafe(self.reducer.reduce(&state, msg, &ctx))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(next)) => *state = next,
                Ok(Err(error)) => system.report_failure(&self.id, error),
                Err(panic) => {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic payload".to_string());
                    system.report_failure(&self.id, anyhow::anyhow!("reducer panicked: {reason}"));
                }
            }
        }

        self.mailbox.finish()
    }
}

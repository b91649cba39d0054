//! Actor module - core actor types and traits.

pub(crate) mod cell;
pub(crate) mod mailbox;

use std::marker::PhantomData;
use std::sync::Weak;

use async_trait::async_trait;
use thiserror::Error;

use tokio::sync::oneshot;
use tokio::time::Duration;

mod path;
pub use mailbox::ActorStatus;
pub use path::{ActorId, ActorPath};

use crate::actor_system::system::{ActorSystem, SystemInner};

/// The actor context gives a running reducer access to itself, its parent and the system.
#[derive(Debug)]
pub struct ActorContext<M: Message> {
    myself: ActorRef<M>,
    parent: Option<ActorId>,
    system: ActorSystem,
}

impl<M: Message> ActorContext<M> {
    pub(crate) fn new(myself: ActorRef<M>, parent: Option<ActorId>, system: ActorSystem) -> Self {
        ActorContext {
            myself,
            parent,
            system,
        }
    }

    /// Reference to the actor being run.
    pub fn myself(&self) -> &ActorRef<M> {
        &self.myself
    }

    pub fn parent(&self) -> Option<&ActorId> {
        self.parent.as_ref()
    }

    pub fn system(&self) -> &ActorSystem {
        &self.system
    }

    /// Stops this actor once the current message has been reduced.
    pub fn stop(&self) -> Result<(), ActorError> {
        self.system.stop(self.myself.id())
    }

    /// Create a child actor under this actor.
    pub fn spawn_child<R: Reducer>(
        &self,
        name: &str,
        initial_state: R::State,
        reducer: R,
    ) -> Result<ActorRef<R::Message>, ActorError> {
        self.system
            .spawn(Some(self.myself.id()), name, initial_state, reducer)
    }

    /// Create a child actor driven by a plain closure.
    pub fn spawn_child_fn<S, C, F>(
        &self,
        name: &str,
        initial_state: S,
        reducer: F,
    ) -> Result<ActorRef<C>, ActorError>
    where
        S: Send + Sync + 'static,
        C: Message,
        F: Fn(&S, C, &ActorContext<C>) -> anyhow::Result<S> + Send + Sync + 'static,
    {
        self.spawn_child(name, initial_state, reducer_fn(reducer))
    }

    /// Stops the child actor with the given name, if it is running.
    pub fn stop_child(&self, name: &str) -> Result<(), ActorError> {
        let path = self.myself.path().clone() / name;
        match self.system.id_of(&path) {
            Some(child) => self.system.stop(&child),
            None => Ok(()),
        }
    }
}

/// Anything that can travel through a mailbox.
///
/// An actor's messages are usually a closed enum that its reducer matches
/// exhaustively.
pub trait Message: std::fmt::Debug + Send + Sync + 'static {}

impl<T: std::fmt::Debug + Send + Sync + 'static> Message for T {}

/// Defines what an actor does with a message.
///
/// The reducer receives the current state and returns the next one. If it
/// fails, the state stays at its value before the message.
#[async_trait]
pub trait Reducer: Send + Sync + 'static {
    type State: Send + Sync + 'static;
    type Message: Message;

    async fn reduce(
        &self,
        state: &Self::State,
        msg: Self::Message,
        ctx: &ActorContext<Self::Message>,
    ) -> anyhow::Result<Self::State>;
}

/// Reducer backed by a synchronous closure.
pub struct FnReducer<S, M, F> {
    f: F,
    _phantom: PhantomData<fn(&S, M)>,
}

/// Wraps a closure `(state, message, context) -> new state` into a [`Reducer`].
pub fn reducer_fn<S, M, F>(f: F) -> FnReducer<S, M, F>
where
    S: Send + Sync + 'static,
    M: Message,
    F: Fn(&S, M, &ActorContext<M>) -> anyhow::Result<S> + Send + Sync + 'static,
{
    FnReducer {
        f,
        _phantom: PhantomData,
    }
}

#[async_trait]
impl<S, M, F> Reducer for FnReducer<S, M, F>
where
    S: Send + Sync + 'static,
    M: Message,
    F: Fn(&S, M, &ActorContext<M>) -> anyhow::Result<S> + Send + Sync + 'static,
{
    type State = S;
    type Message = M;

    async fn reduce(&self, state: &S, msg: M, ctx: &ActorContext<M>) -> anyhow::Result<S> {
        (self.f)(state, msg, ctx)
    }
}

/// Reducer for actors without state.
pub struct StatelessFn<M, F> {
    f: F,
    _phantom: PhantomData<fn(M)>,
}

pub fn stateless_fn<M, F>(f: F) -> StatelessFn<M, F>
where
    M: Message,
    F: Fn(M, &ActorContext<M>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    StatelessFn {
        f,
        _phantom: PhantomData,
    }
}

#[async_trait]
impl<M, F> Reducer for StatelessFn<M, F>
where
    M: Message,
    F: Fn(M, &ActorContext<M>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    type State = ();
    type Message = M;

    async fn reduce(&self, _state: &(), msg: M, ctx: &ActorContext<M>) -> anyhow::Result<()> {
        (self.f)(msg, ctx)
    }
}

/// Reply channel carried inside a message sent with [`ActorRef::query`].
pub struct ReplyTo<T>(oneshot::Sender<T>);

impl<T> ReplyTo<T> {
    /// Sends the reply. Returns false when the asking side gave up.
    pub fn send(self, value: T) -> bool {
        self.0.send(value).is_ok()
    }
}

impl<T> std::fmt::Debug for ReplyTo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReplyTo")
    }
}

/// A clonable, non-owning actor reference.
pub struct ActorRef<M: Message> {
    id: ActorId,
    system: Weak<SystemInner>,
    _phantom: PhantomData<fn(M)>,
}

impl<M: Message> Clone for ActorRef<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            system: self.system.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<M: Message> PartialEq for ActorRef<M> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<M: Message> Eq for ActorRef<M> {}

impl<M: Message> ActorRef<M> {
    pub(crate) fn new(id: ActorId, system: Weak<SystemInner>) -> Self {
        ActorRef {
            id,
            system,
            _phantom: PhantomData,
        }
    }

    pub fn id(&self) -> &ActorId {
        &self.id
    }

    /// Get the path of this actor.
    pub fn path(&self) -> &ActorPath {
        self.id.path()
    }

    fn system(&self) -> Result<ActorSystem, ActorError> {
        self.system
            .upgrade()
            .map(ActorSystem::from_inner)
            .ok_or(ActorError::SystemNotRunning)
    }

    /// Fire and forget sending of messages to this actor.
    pub fn tell(&self, msg: M) -> Result<(), ActorError> {
        self.system()?.dispatch(self, msg)
    }

    /// Requests this actor to stop.
    pub fn stop(&self) -> Result<(), ActorError> {
        self.system()?.stop(&self.id)
    }

    /// Sends a message built around a reply channel and waits for the answer.
    pub async fn query<T, F>(&self, make_msg: F, timeout: Duration) -> Result<T, ActorError>
    where
        T: Send + 'static,
        F: FnOnce(ReplyTo<T>) -> M,
    {
        let (response_sender, response_receiver) = oneshot::channel();
        self.tell(make_msg(ReplyTo(response_sender)))?;
        match tokio::time::timeout(timeout, response_receiver).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(ActorError::QueryDropped),
            Err(_) => Err(ActorError::Timeout(timeout)),
        }
    }
}

impl<M: Message> std::fmt::Debug for ActorRef<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id.path())
    }
}

#[derive(Error, Debug)]
pub enum ActorError {
    #[error("Actor exists: {0}")]
    DuplicateName(ActorPath),

    #[error("Invalid actor name '{0}'")]
    InvalidName(String),

    #[error("Parent actor {0} is not running")]
    ParentNotFound(ActorId),

    #[error("Actor system is not running")]
    SystemNotRunning,

    #[error("Invalid actor system configuration: {0}")]
    InvalidConfig(String),

    #[error("No tokio runtime to run the actor system on: {0}")]
    NoRuntime(String),

    #[error("No reply within {0:?}")]
    Timeout(Duration),

    #[error("Reply dropped without an answer")]
    QueryDropped,
}

//! Tiny reducer actor runtime.
//!
//! Actors own private state and a mailbox. A fixed pool of workers takes ready
//! actors in turn and feeds one message at a time to each actor's reducer,
//! which returns the actor's next state. Actors reach each other only through
//! [`ActorRef`] handles resolved by the [`ActorSystem`] registry.

mod actor;
mod bus;
mod dispatcher;
mod system;

pub use actor::{
    ActorContext, ActorError, ActorId, ActorPath, ActorRef, ActorStatus, FnReducer, Message,
    Reducer, ReplyTo, StatelessFn, reducer_fn, stateless_fn,
};

pub use bus::{DeadLetter, EventBus, SystemEvent};
pub use system::ActorSystem;

pub use async_trait::async_trait;

//! A small reducer-style actor runtime on top of tokio.
//!
//! Actors are spawned into an [`ActorSystem`] with an initial state and a
//! reducer `(state, message, context) -> new state`. Messages are dispatched
//! through [`ActorRef`] handles without blocking, queued per actor in FIFO order
//! and reduced one at a time by a fixed pool of workers.
//!
//! ```ignore
//! let system = ActorSystem::start(SystemConfig::default())?;
//! let counter = system.spawn_fn(None, "counter", 0u64, |count, add: u64, _ctx| Ok(count + add))?;
//! counter.tell(2)?;
//! system.stop_all().await?;
//! ```

pub mod actor_system;
pub mod config;
pub mod pie_shop;

pub use actor_system::{
    ActorContext, ActorError, ActorId, ActorPath, ActorRef, ActorSystem, DeadLetter, Message,
    Reducer, SystemEvent,
};
pub use config::{StopPolicy, SystemConfig};

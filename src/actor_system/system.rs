//! Actor system - registry of running actors and owner of the dispatcher.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{Notify, broadcast};

use crate::actor_system::actor::{
    ActorContext, ActorError, ActorId, ActorPath, ActorRef, ActorStatus, Message, Reducer,
    cell::{ActorCell, Cell},
    mailbox::{Mailbox, Next},
    reducer_fn, stateless_fn,
};
use crate::actor_system::bus::{DeadLetter, EventBus, SystemEvent};
use crate::actor_system::dispatcher::Dispatcher;
use crate::config::SystemConfig;

type DeadLetterSink = Arc<dyn Fn(&DeadLetter) + Send + Sync>;

pub(crate) struct SystemInner {
    config: SystemConfig,
    registry: DashMap<ActorPath, Arc<dyn Cell>>,
    dispatcher: Dispatcher,
    bus: EventBus<SystemEvent>,
    dead_letter_sinks: RwLock<Vec<DeadLetterSink>>,
    running: AtomicBool,
    removed: Notify,
}

/// Handle to a running actor system. Cloning is cheap; all clones share one registry.
#[derive(Clone)]
pub struct ActorSystem {
    inner: Arc<SystemInner>,
}

impl ActorSystem {
    /// Creates the registry and starts the dispatcher workers on the current tokio runtime.
    pub fn start(config: SystemConfig) -> Result<Self, ActorError> {
        config.validate().map_err(ActorError::InvalidConfig)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|error| ActorError::NoRuntime(error.to_string()))?;

        let worker_count = config.worker_count;
        let inner = Arc::new(SystemInner {
            bus: EventBus::new(config.event_capacity),
            config,
            registry: DashMap::new(),
            dispatcher: Dispatcher::new(),
            dead_letter_sinks: RwLock::new(Vec::new()),
            running: AtomicBool::new(true),
            removed: Notify::new(),
        });
        inner
            .dispatcher
            .start(&runtime, worker_count, Arc::downgrade(&inner));

        log::debug!("Actor system started with {} workers.", worker_count);
        Ok(ActorSystem { inner })
    }

    pub(crate) fn from_inner(inner: Arc<SystemInner>) -> Self {
        ActorSystem { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<SystemInner> {
        Arc::downgrade(&self.inner)
    }

    pub fn config(&self) -> &SystemConfig {
        &self.inner.config
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    fn ensure_running(&self) -> Result<(), ActorError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(ActorError::SystemNotRunning)
        }
    }

    /// Subscribe to lifecycle events of this system.
    pub fn events(&self) -> broadcast::Receiver<SystemEvent> {
        self.inner.bus.subscribe()
    }

    /// Registers a callback invoked once for every dead letter.
    pub fn on_dead_letter<F>(&self, sink: F)
    where
        F: Fn(&DeadLetter) + Send + Sync + 'static,
    {
        self.inner
            .dead_letter_sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(sink));
    }

    /// Registers a new actor at `parent path / name`, or `/name` without a parent.
    pub fn spawn<R: Reducer>(
        &self,
        parent: Option<&ActorId>,
        name: &str,
        initial_state: R::State,
        reducer: R,
    ) -> Result<ActorRef<R::Message>, ActorError> {
        self.ensure_running()?;
        if name.trim().is_empty() || name.contains('/') {
            return Err(ActorError::InvalidName(name.to_string()));
        }

        let parent_cell = match parent {
            Some(parent_id) => Some(
                self.cell(parent_id)
                    .filter(|cell| cell.is_accepting())
                    .ok_or_else(|| ActorError::ParentNotFound(parent_id.clone()))?,
            ),
            None => None,
        };
        let path = match parent {
            Some(parent_id) => parent_id.path().clone() / name,
            None => ActorPath::root() / name,
        };

        let id = ActorId::new(path.clone());
        let cell: Arc<dyn Cell> = Arc::new(ActorCell::new(
            id.clone(),
            parent.cloned(),
            initial_state,
            reducer,
        ));

        match self.inner.registry.entry(path.clone()) {
            Entry::Occupied(_) => return Err(ActorError::DuplicateName(path)),
            Entry::Vacant(entry) => {
                entry.insert(cell);
            }
        }

        if let Some(parent_cell) = parent_cell {
            if !parent_cell.add_child(id.clone()) {
                self.inner.registry.remove_if(&path, |_, c| c.id() == &id);
                return Err(ActorError::ParentNotFound(parent_cell.id().clone()));
            }
        }

        log::debug!("Actor '{}' spawned.", &path);
        self.inner.bus.send(SystemEvent::ActorStarted(id.clone()));
        Ok(ActorRef::new(id, self.downgrade()))
    }

    /// Spawns an actor driven by a closure `(state, message, context) -> new state`.
    pub fn spawn_fn<S, M, F>(
        &self,
        parent: Option<&ActorId>,
        name: &str,
        initial_state: S,
        reducer: F,
    ) -> Result<ActorRef<M>, ActorError>
    where
        S: Send + Sync + 'static,
        M: Message,
        F: Fn(&S, M, &ActorContext<M>) -> anyhow::Result<S> + Send + Sync + 'static,
    {
        self.spawn(parent, name, initial_state, reducer_fn(reducer))
    }

    /// Spawns an actor without state.
    pub fn spawn_stateless<M, F>(
        &self,
        parent: Option<&ActorId>,
        name: &str,
        reducer: F,
    ) -> Result<ActorRef<M>, ActorError>
    where
        M: Message,
        F: Fn(M, &ActorContext<M>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.spawn(parent, name, (), stateless_fn(reducer))
    }

    /// Enqueues a message without blocking.
    ///
    /// A target that is unknown, stale or stopping turns the message into a
    /// dead letter; only a torn down system is reported as an error.
    pub fn dispatch<M: Message>(&self, target: &ActorRef<M>, msg: M) -> Result<(), ActorError> {
        self.ensure_running()?;

        let Some(cell) = self.cell(target.id()) else {
            self.dead_letter(target.id(), msg);
            return Ok(());
        };
        let Some(mailbox) = cell.mailbox().downcast_ref::<Mailbox<M>>() else {
            self.dead_letter(target.id(), msg);
            return Ok(());
        };

        match mailbox.enqueue(msg) {
            Ok(true) => self.inner.dispatcher.schedule(cell.clone()),
            Ok(false) => {}
            Err(msg) => self.dead_letter(target.id(), msg),
        }
        Ok(())
    }

    /// Requests an actor to stop. Returns once the request is recorded.
    pub fn stop(&self, id: &ActorId) -> Result<(), ActorError> {
        self.ensure_running()?;
        if let Some(cell) = self.cell(id) {
            self.request_stop(cell);
        }
        Ok(())
    }

    /// Resolves a live actor by its well-known path.
    pub fn lookup<M: Message>(&self, path: &ActorPath) -> Option<ActorRef<M>> {
        let cell = self.inner.registry.get(path)?.value().clone();
        if !cell.is_accepting() || cell.mailbox().downcast_ref::<Mailbox<M>>().is_none() {
            return None;
        }
        Some(ActorRef::new(cell.id().clone(), self.downgrade()))
    }

    /// Id of the actor currently registered at `path`.
    pub fn id_of(&self, path: &ActorPath) -> Option<ActorId> {
        self.inner
            .registry
            .get(path)
            .map(|entry| entry.value().id().clone())
    }

    /// Whether this incarnation is still registered.
    pub fn is_alive(&self, id: &ActorId) -> bool {
        self.cell(id).is_some()
    }

    pub fn status(&self, id: &ActorId) -> Option<ActorStatus> {
        self.cell(id).map(|cell| cell.status())
    }

    pub fn children(&self, id: &ActorId) -> Vec<ActorId> {
        self.cell(id).map(|cell| cell.children()).unwrap_or_default()
    }

    /// Number of registered actors.
    pub fn actor_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Stops every actor, waits for their mailboxes to settle and shuts the workers down.
    ///
    /// Must not be awaited from inside a reducer.
    pub async fn stop_all(&self) -> Result<(), ActorError> {
        self.ensure_running()?;

        loop {
            let removed = self.inner.removed.notified();
            // Reducers still draining may have spawned new top level actors.
            let roots: Vec<Arc<dyn Cell>> = self
                .inner
                .registry
                .iter()
                .filter(|entry| entry.value().parent().is_none() && entry.value().is_accepting())
                .map(|entry| entry.value().clone())
                .collect();
            for cell in roots {
                self.request_stop(cell);
            }

            if self.inner.registry.is_empty() {
                break;
            }
            removed.await;
        }

        self.inner.running.store(false, Ordering::Release);
        self.inner.dispatcher.shutdown().await;
        log::debug!("Actor system stopped.");
        Ok(())
    }

    fn cell(&self, id: &ActorId) -> Option<Arc<dyn Cell>> {
        let cell = self.inner.registry.get(id.path())?.value().clone();
        (cell.id() == id).then_some(cell)
    }

    fn request_stop(&self, cell: Arc<dyn Cell>) {
        log::debug!("Stopping actor '{}'...", cell.id());
        if cell.request_stop(self.inner.config.stop_policy, self) {
            self.finalize(cell);
        }
    }

    /// Stops the children, then unregisters the actor.
    fn finalize(&self, cell: Arc<dyn Cell>) {
        let id = cell.id().clone();

        for child in cell.close_children() {
            if let Some(child_cell) = self.cell(&child) {
                self.request_stop(child_cell);
            }
        }

        self.inner.registry.remove_if(id.path(), |_, c| c.id() == &id);
        if let Some(parent) = cell.parent().and_then(|parent| self.cell(parent)) {
            parent.remove_child(&id);
        }

        log::debug!("Actor '{}' stopped.", &id);
        self.inner.bus.send(SystemEvent::ActorStopped(id));
        self.inner.removed.notify_waiters();
    }

    pub(crate) async fn run_step(&self, cell: Arc<dyn Cell>) {
        match cell.drain_step(self).await {
            Next::Reschedule => self.inner.dispatcher.schedule(cell),
            Next::Idle => {}
            Next::Stop => self.finalize(cell),
        }
    }

    pub(crate) fn dead_letter<M: Message>(&self, recipient: &ActorId, msg: M) {
        let letter = DeadLetter::new(recipient.clone(), msg);
        log::warn!("Dead letter for '{}': {}", recipient, letter.description());

        let sinks: Vec<DeadLetterSink> = self
            .inner
            .dead_letter_sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for sink in sinks {
            if catch_unwind(AssertUnwindSafe(|| sink(&letter))).is_err() {
                log::error!("Dead letter sink panicked on a letter for '{}'", recipient);
            }
        }
        self.inner.bus.send(SystemEvent::DeadLetter(letter));
    }

    pub(crate) fn report_failure(&self, id: &ActorId, error: anyhow::Error) {
        let handler = &self.inner.config.on_uncaught_error;
        if catch_unwind(AssertUnwindSafe(|| handler(id, &error))).is_err() {
            log::error!("Uncaught error handler panicked for '{}': {:#}", id, error);
        }
        self.inner.bus.send(SystemEvent::ReducerFailed {
            id: id.clone(),
            reason: format!("{error:#}"),
        });
    }
}

impl std::fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorSystem")
            .field("actors", &self.inner.registry.len())
            .field("running", &self.is_running())
            .finish()
    }
}

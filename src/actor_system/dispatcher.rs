//! Dispatcher - a fixed pool of workers draining actors from a shared ready queue.
//!
//! An actor sits in the ready queue at most once. A worker pulls it, reduces a
//! single message and puts it back at the tail if more messages are waiting, so
//! busy actors take turns with everyone else in the order they became ready.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::actor_system::actor::cell::Cell;
use crate::actor_system::system::{ActorSystem, SystemInner};

type ReadyQueue = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Arc<dyn Cell>>>>;

pub(crate) struct Dispatcher {
    ready: mpsc::UnboundedSender<Arc<dyn Cell>>,
    queue: ReadyQueue,
    shutdown: watch::Sender<bool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (ready, receiver) = mpsc::unbounded_channel();
        let (shutdown, _) = watch::channel(false);
        Dispatcher {
            ready,
            queue: Arc::new(tokio::sync::Mutex::new(receiver)),
            shutdown,
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Spawns `count` workers on the given runtime.
    pub fn start(&self, runtime: &Handle, count: usize, system: Weak<SystemInner>) {
        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        for index in 0..count {
            let worker = worker_loop(
                index,
                self.queue.clone(),
                self.shutdown.subscribe(),
                system.clone(),
            );
            workers.push(runtime.spawn(worker));
        }
    }

    /// Appends a ready actor to the tail of the queue.
    pub fn schedule(&self, cell: Arc<dyn Cell>) {
        if let Err(error) = self.ready.send(cell) {
            log::error!("Failed to schedule actor '{}'!", error.0.id());
        }
    }

    /// Cancels idle workers and waits for all of them to exit.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        let workers: Vec<JoinHandle<()>> = {
            let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
            workers.drain(..).collect()
        };
        for worker in workers {
            if let Err(error) = worker.await {
                log::error!("Dispatcher worker ended abnormally: {}", error);
            }
        }
    }
}

async fn worker_loop(
    index: usize,
    queue: ReadyQueue,
    mut shutdown: watch::Receiver<bool>,
    system: Weak<SystemInner>,
) {
    log::debug!("Dispatcher worker {} started.", index);

    loop {
        let next = {
            let mut queue = queue.lock().await;
            tokio::select! {
                biased;
                _ = shutdown.wait_for(|stopped| *stopped) => None,
                cell = queue.recv() => cell,
            }
        };

        let Some(cell) = next else { break };
        let Some(inner) = system.upgrade() else { break };

        ActorSystem::from_inner(inner).run_step(cell).await;
    }

    log::debug!("Dispatcher worker {} stopped.", index);
}

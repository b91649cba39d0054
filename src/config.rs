use std::env;
use std::str::FromStr;
use std::sync::Arc;

use crate::actor_system::ActorId;

/// Callback invoked when a reducer returns an error or panics.
pub type UncaughtErrorHandler = Arc<dyn Fn(&ActorId, &anyhow::Error) + Send + Sync>;

/// What happens to messages already queued when an actor is stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StopPolicy {
    /// Reduce every queued message, then stop.
    #[default]
    Drain,
    /// Turn queued messages into dead letters and stop at the next boundary.
    Discard,
}

impl FromStr for StopPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drain" => Ok(StopPolicy::Drain),
            "discard" => Ok(StopPolicy::Discard),
            other => Err(format!("unknown stop policy '{other}'")),
        }
    }
}

#[derive(Clone)]
pub struct SystemConfig {
    pub worker_count: usize,
    pub stop_policy: StopPolicy,
    pub event_capacity: usize,
    pub on_uncaught_error: UncaughtErrorHandler,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            stop_policy: StopPolicy::Drain,
            event_capacity: 1024,
            on_uncaught_error: Arc::new(|id: &ActorId, error: &anyhow::Error| {
                log::error!("Actor '{}' failed to handle a message: {:#}", id, error);
            }),
        }
    }
}

impl std::fmt::Debug for SystemConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemConfig")
            .field("worker_count", &self.worker_count)
            .field("stop_policy", &self.stop_policy)
            .field("event_capacity", &self.event_capacity)
            .finish_non_exhaustive()
    }
}

impl SystemConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from any key lookup, keeping defaults for
    /// missing or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(workers) = lookup("ACTOR_WORKERS") {
            if let Ok(w) = workers.trim().parse::<usize>() {
                config.worker_count = w;
            }
        }

        if let Some(policy) = lookup("ACTOR_STOP_POLICY") {
            match policy.parse::<StopPolicy>() {
                Ok(p) => config.stop_policy = p,
                Err(e) => log::warn!("Ignoring ACTOR_STOP_POLICY: {}", e),
            }
        }

        if let Some(capacity) = lookup("ACTOR_EVENT_CAPACITY") {
            if let Ok(c) = capacity.trim().parse::<usize>() {
                config.event_capacity = c;
            }
        }

        config
    }

    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_stop_policy(mut self, stop_policy: StopPolicy) -> Self {
        self.stop_policy = stop_policy;
        self
    }

    pub fn with_event_capacity(mut self, event_capacity: usize) -> Self {
        self.event_capacity = event_capacity;
        self
    }

    pub fn on_uncaught_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ActorId, &anyhow::Error) + Send + Sync + 'static,
    {
        self.on_uncaught_error = Arc::new(handler);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be at least 1".to_string());
        }
        if self.event_capacity == 0 {
            return Err("event_capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

//! Reducer environment.
//!
//! The remote service is reached only through the API traits, so tests swap
//! in an in-memory backend without touching the reducers.

use std::sync::Arc;
use std::time::Duration;
use todolists_api::{AuthApi, TasksApi, TodolistsApi};

/// Default time an error notification stays visible
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_secs(6);

/// Default number of notifications kept in the queue
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 5;

/// External dependencies of the reducers
#[derive(Clone)]
pub struct AppEnvironment {
    /// Todolist endpoints
    pub todolists: Arc<dyn TodolistsApi>,
    /// Task endpoints
    pub tasks: Arc<dyn TasksApi>,
    /// Session endpoints
    pub auth: Arc<dyn AuthApi>,
    /// How long a failure notification is shown
    pub notification_duration: Duration,
    /// Maximum queued notifications; the oldest is dropped beyond it
    pub notification_capacity: usize,
}

impl AppEnvironment {
    /// Use one backend for every resource
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: TodolistsApi + TasksApi + AuthApi + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            todolists: backend.clone(),
            tasks: backend.clone(),
            auth: backend,
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }

    /// Set the notification display time
    #[must_use]
    pub const fn with_notification_duration(mut self, duration: Duration) -> Self {
        self.notification_duration = duration;
        self
    }

    /// Set the notification queue bound
    #[must_use]
    pub const fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity;
        self
    }
}

impl std::fmt::Debug for AppEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppEnvironment")
            .field("notification_duration", &self.notification_duration)
            .field("notification_capacity", &self.notification_capacity)
            .finish_non_exhaustive()
    }
}
